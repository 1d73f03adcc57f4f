use serde::Serialize;

use crate::error::{Error, ErrorKind};

/// One failed step inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    /// Legacy repository being migrated when the step failed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

impl FailureDetail {
    #[must_use]
    pub fn new(repository: Option<String>, error: &Error) -> Self {
        Self {
            repository,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFailure {
    pub project_id: i64,
    pub slug: String,
    pub errors: Vec<FailureDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserFailure {
    pub login: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectWarning {
    pub slug: String,
    pub message: String,
}

/// A target project whose repositories were all mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigratedProject {
    pub slug: String,
    pub target_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Legacy projects migrated without any failure.
    pub migrated: usize,
    /// Failed legacy projects in encounter order.
    pub failures: Vec<ProjectFailure>,
    pub user_failures: Vec<UserFailure>,
    pub warnings: Vec<ProjectWarning>,
    pub migrated_projects: Vec<MigratedProject>,
}

impl MigrationReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub projects_deleted: usize,
    pub groups_deleted: usize,
    pub users_deleted: usize,
}
