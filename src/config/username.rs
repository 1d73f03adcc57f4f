use serde::{Deserialize, Serialize};

/// Maps a legacy login to the username expected on the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameTransform {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub lowercase: bool,
}

impl UsernameTransform {
    #[must_use]
    pub fn apply(&self, login: &str) -> String {
        let login = if self.lowercase {
            login.to_lowercase()
        } else {
            login.to_string()
        };
        format!("{}{login}{}", self.prefix, self.suffix)
    }
}
