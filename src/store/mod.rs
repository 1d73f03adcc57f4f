mod schema;
mod sqlite;

pub use schema::{LEGACY_SCHEMA, REQUIRED_TABLES};
pub use sqlite::SqliteLegacyStore;

use crate::error::Result;
use crate::types::legacy::*;

/// LegacyStore is the read-only interface to the legacy platform's database.
pub trait LegacyStore {
    /// Fails with a configuration error if the store is unusable.
    fn verify_schema(&self) -> Result<()>;

    // User operations
    fn list_users(&self) -> Result<Vec<User>>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn list_ssh_keys(&self, user_id: i64) -> Result<Vec<SshKey>>;

    // Group operations
    fn get_group(&self, id: i64) -> Result<Option<Group>>;

    // Project operations
    fn list_projects(&self) -> Result<Vec<Project>>;

    // Repository operations, in discovery order
    fn list_repositories(&self, project_id: i64) -> Result<Vec<Repository>>;
    fn list_committerships(&self, repository_id: i64) -> Result<Vec<Committership>>;
}

impl<S: LegacyStore + ?Sized> LegacyStore for &S {
    fn verify_schema(&self) -> Result<()> {
        (**self).verify_schema()
    }

    fn list_users(&self) -> Result<Vec<User>> {
        (**self).list_users()
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        (**self).get_user(id)
    }

    fn list_ssh_keys(&self, user_id: i64) -> Result<Vec<SshKey>> {
        (**self).list_ssh_keys(user_id)
    }

    fn get_group(&self, id: i64) -> Result<Option<Group>> {
        (**self).get_group(id)
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        (**self).list_projects()
    }

    fn list_repositories(&self, project_id: i64) -> Result<Vec<Repository>> {
        (**self).list_repositories(project_id)
    }

    fn list_committerships(&self, repository_id: i64) -> Result<Vec<Committership>> {
        (**self).list_committerships(repository_id)
    }
}

/// Loads the owner a reference points to.
pub fn load_owner<S: LegacyStore + ?Sized>(store: &S, owner: OwnerRef) -> Result<Owner> {
    match owner {
        OwnerRef::User(id) => store
            .get_user(id)?
            .map(Owner::User)
            .ok_or(crate::error::Error::NotFound),
        OwnerRef::Group(id) => store
            .get_group(id)?
            .map(Owner::Group)
            .ok_or(crate::error::Error::NotFound),
    }
}
