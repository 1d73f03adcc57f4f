use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("target api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("not found")]
    NotFound,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("{count} fork(s) not migrated: canonical repository is missing")]
    UnmigratedForks { count: usize },

    #[error("{count} wiki(s) not migrated: no matching repository")]
    UnmigratedWikis { count: usize },

    #[error("unknown owner type: {0}")]
    UnknownOwnerType(String),

    #[error("legacy user '{login}' has no target account")]
    UnmappedUser { login: String },

    #[error("no owner-level member found for namespace '{namespace}'")]
    NoNamespaceOwner { namespace: String },

    #[error("run is out of order: expected {expected}, found {actual}")]
    OutOfOrder {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Failure classes of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Legacy data that cannot be grouped. Scoped to one project.
    StructuralMismatch,
    /// Target API or git transport error. Scoped to one project, user or key.
    RemoteOperationFailure,
    /// Unreadable legacy store or invalid configuration. Fatal at startup.
    ConfigurationFailure,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnmigratedForks { .. }
            | Self::UnmigratedWikis { .. }
            | Self::UnknownOwnerType(_)
            | Self::UnmappedUser { .. }
            | Self::NoNamespaceOwner { .. } => ErrorKind::StructuralMismatch,
            Self::Database(_) | Self::Config(_) | Self::ConfigParse(_) | Self::OutOfOrder { .. } => {
                ErrorKind::ConfigurationFailure
            }
            Self::Http(_)
            | Self::Git(_)
            | Self::Io(_)
            | Self::Api { .. }
            | Self::NotFound => ErrorKind::RemoteOperationFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_errors_are_structural() {
        assert_eq!(
            Error::UnmigratedForks { count: 2 }.kind(),
            ErrorKind::StructuralMismatch
        );
        assert_eq!(
            Error::UnmigratedWikis { count: 1 }.kind(),
            ErrorKind::StructuralMismatch
        );
        assert_eq!(
            Error::UnknownOwnerType("Site".into()).kind(),
            ErrorKind::StructuralMismatch
        );
    }

    #[test]
    fn test_api_errors_are_remote() {
        let err = Error::Api {
            status: 409,
            message: "has already been taken".into(),
        };
        assert_eq!(err.kind(), ErrorKind::RemoteOperationFailure);
        assert_eq!(
            err.to_string(),
            "target api error (409): has already been taken"
        );
    }

    #[test]
    fn test_legacy_store_errors_are_not_remote() {
        let err = Error::Database(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), ErrorKind::ConfigurationFailure);
    }

    #[test]
    fn test_config_errors_are_fatal() {
        assert_eq!(
            Error::Config("missing url".into()).kind(),
            ErrorKind::ConfigurationFailure
        );
    }
}
