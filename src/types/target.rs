use serde::{Deserialize, Serialize};

use super::AccessLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetUser {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub id: u64,
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceKind {
    User,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: u64,
    pub kind: NamespaceKind,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOwner {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProject {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub namespace: Namespace,
    pub http_url_to_repo: String,
    /// Present for projects in a personal namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ProjectOwner>,
}

impl TargetProject {
    /// HTTP URL of the project's wiki repository.
    #[must_use]
    pub fn wiki_http_url(&self) -> String {
        match self.http_url_to_repo.strip_suffix(".git") {
            Some(base) => format!("{base}.wiki.git"),
            None => format!("{}.wiki.git", self.http_url_to_repo),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub username: String,
    pub access_level: AccessLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpersonationToken {
    pub id: u64,
    pub token: String,
}
