use serde::{Deserialize, Serialize};

use crate::types::AccessLevel;

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub name: String,
    pub password: String,
    pub skip_confirmation: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSshKey {
    pub title: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewImpersonationToken {
    pub name: String,
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewGroup {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visibility: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub wiki_enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    pub visibility: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMember {
    pub user_id: u64,
    pub access_level: AccessLevel,
}

/// Error body returned by the target API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        match self.message {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
            None => self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_string_message() {
        let body: ApiErrorBody = serde_json::from_str(r#"{"message": "404 Not found"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("404 Not found"));
    }

    #[test]
    fn test_error_body_structured_message() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"message": {"path": ["has already been taken"]}}"#).unwrap();
        assert_eq!(
            body.into_message().as_deref(),
            Some(r#"{"path":["has already been taken"]}"#)
        );
    }

    #[test]
    fn test_error_body_error_field() {
        let body: ApiErrorBody = serde_json::from_str(r#"{"error": "invalid_token"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("invalid_token"));
    }

    #[test]
    fn test_new_project_omits_empty_fields() {
        let project = NewProject {
            name: "alpha".into(),
            description: None,
            wiki_enabled: false,
            topics: Vec::new(),
            visibility: "public".into(),
            namespace_id: None,
        };
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "alpha", "wiki_enabled": false, "visibility": "public"})
        );
    }
}
