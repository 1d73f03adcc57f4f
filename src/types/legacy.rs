//! Read-only rows of the legacy hosting platform.

use serde::Serialize;

use super::CommitRights;
use crate::error::{Error, Result};

/// Suffix carried by the name and hashed path of every legacy wiki repository.
pub const WIKI_SUFFIX: &str = "-gitorious-wiki";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub fullname: Option<String>,
}

impl User {
    /// Display name for the target account, falling back to the login.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.fullname
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub admin_id: i64,
    /// Member user ids in membership order. Always contains the admin.
    pub member_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SshKey {
    pub id: i64,
    pub user_id: i64,
    pub key: String,
}

/// Reference to the owner of a project or repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerRef {
    User(i64),
    Group(i64),
}

impl OwnerRef {
    /// Resolves the legacy polymorphic `(owner_type, owner_id)` column pair.
    pub fn resolve(owner_type: &str, owner_id: i64) -> Result<Self> {
        match owner_type {
            "User" => Ok(Self::User(owner_id)),
            "Group" => Ok(Self::Group(owner_id)),
            other => Err(Error::UnknownOwnerType(other.to_string())),
        }
    }

    #[must_use]
    pub fn user_id(self) -> Option<i64> {
        match self {
            Self::User(id) => Some(id),
            Self::Group(_) => None,
        }
    }
}

/// A fully loaded owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    User(User),
    Group(Group),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub wiki_enabled: bool,
    pub owner_type: String,
    pub owner_id: i64,
    pub tags: Vec<String>,
}

impl Project {
    pub fn owner(&self) -> Result<OwnerRef> {
        OwnerRef::resolve(&self.owner_type, self.owner_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub hashed_path: String,
    pub owner: OwnerRef,
    /// Creator of the repository.
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub wiki_permissions: i64,
}

impl Repository {
    #[must_use]
    pub fn is_wiki(&self) -> bool {
        self.name.ends_with(WIKI_SUFFIX)
    }

    #[must_use]
    pub fn is_fork(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Key used to correlate a wiki with its project repository.
    #[must_use]
    pub fn wiki_key(&self) -> &str {
        self.hashed_path
            .strip_suffix(WIKI_SUFFIX)
            .unwrap_or(&self.hashed_path)
    }

    /// Project name for a wiki that has no canonical repository.
    #[must_use]
    pub fn base_name(&self) -> &str {
        self.name.strip_suffix(WIKI_SUFFIX).unwrap_or(&self.name)
    }

    /// Legacy user that receives this repository when it is migrated as a fork.
    #[must_use]
    pub fn fork_owner_id(&self) -> i64 {
        self.owner.user_id().unwrap_or(self.user_id)
    }

    /// Fills `{path}` in a clone URL template with the hashed path.
    #[must_use]
    pub fn clone_url(&self, template: &str) -> String {
        template.replace("{path}", &self.hashed_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Committership {
    pub repository_id: i64,
    pub committer: OwnerRef,
    pub rights: CommitRights,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, hashed_path: &str) -> Repository {
        Repository {
            id: 1,
            project_id: 1,
            name: name.to_string(),
            description: None,
            hashed_path: hashed_path.to_string(),
            owner: OwnerRef::Group(9),
            user_id: 4,
            parent_id: None,
            wiki_permissions: 0,
        }
    }

    #[test]
    fn test_owner_ref_resolve() {
        assert_eq!(OwnerRef::resolve("User", 3).unwrap(), OwnerRef::User(3));
        assert_eq!(OwnerRef::resolve("Group", 3).unwrap(), OwnerRef::Group(3));
        assert!(matches!(
            OwnerRef::resolve("Site", 3),
            Err(Error::UnknownOwnerType(t)) if t == "Site"
        ));
    }

    #[test]
    fn test_wiki_key_strips_suffix() {
        let wiki = repo("alpha-gitorious-wiki", "abc/def/123-gitorious-wiki");
        assert!(wiki.is_wiki());
        assert_eq!(wiki.wiki_key(), "abc/def/123");
        assert_eq!(wiki.base_name(), "alpha");
    }

    #[test]
    fn test_fork_owner_falls_back_to_creator() {
        let fork = repo("alpha-clone", "x");
        assert_eq!(fork.fork_owner_id(), 4);
    }

    #[test]
    fn test_clone_url_template() {
        let r = repo("alpha", "abc/def/123");
        assert_eq!(
            r.clone_url("git@legacy.example.com:{path}.git"),
            "git@legacy.example.com:abc/def/123.git"
        );
    }
}
