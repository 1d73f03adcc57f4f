mod client;
pub mod dto;

pub use client::ApiClient;

use crate::error::Result;
use crate::types::*;
use dto::*;

/// TargetApi is the administrative surface of the target platform.
pub trait TargetApi {
    /// The authenticated account. Used as the startup reachability check.
    fn current_user(&self) -> Result<TargetUser>;

    // User operations
    fn list_users(&self) -> Result<Vec<TargetUser>>;
    fn create_user(&self, user: &NewUser) -> Result<TargetUser>;
    fn delete_user(&self, id: u64) -> Result<()>;
    fn create_ssh_key(&self, user_id: u64, key: &NewSshKey) -> Result<()>;
    fn create_impersonation_token(
        &self,
        user_id: u64,
        token: &NewImpersonationToken,
    ) -> Result<ImpersonationToken>;

    // Group operations
    fn create_group(&self, group: &NewGroup) -> Result<TargetGroup>;
    fn list_groups(&self) -> Result<Vec<TargetGroup>>;
    fn delete_group(&self, id: u64) -> Result<()>;
    fn add_group_member(&self, group_id: u64, member: &NewMember) -> Result<()>;
    fn list_group_members(&self, group_id: u64) -> Result<Vec<Member>>;

    // Project operations
    fn create_project(&self, project: &NewProject) -> Result<TargetProject>;
    fn create_user_project(&self, user_id: u64, project: &NewProject) -> Result<TargetProject>;
    fn list_projects(&self) -> Result<Vec<TargetProject>>;
    fn delete_project(&self, id: u64) -> Result<()>;
    fn add_project_member(&self, project_id: u64, member: &NewMember) -> Result<()>;
    fn create_fork_relation(&self, project_id: u64, forked_from_id: u64) -> Result<()>;
}

impl<T: TargetApi + ?Sized> TargetApi for &T {
    fn current_user(&self) -> Result<TargetUser> {
        (**self).current_user()
    }

    fn list_users(&self) -> Result<Vec<TargetUser>> {
        (**self).list_users()
    }

    fn create_user(&self, user: &NewUser) -> Result<TargetUser> {
        (**self).create_user(user)
    }

    fn delete_user(&self, id: u64) -> Result<()> {
        (**self).delete_user(id)
    }

    fn create_ssh_key(&self, user_id: u64, key: &NewSshKey) -> Result<()> {
        (**self).create_ssh_key(user_id, key)
    }

    fn create_impersonation_token(
        &self,
        user_id: u64,
        token: &NewImpersonationToken,
    ) -> Result<ImpersonationToken> {
        (**self).create_impersonation_token(user_id, token)
    }

    fn create_group(&self, group: &NewGroup) -> Result<TargetGroup> {
        (**self).create_group(group)
    }

    fn list_groups(&self) -> Result<Vec<TargetGroup>> {
        (**self).list_groups()
    }

    fn delete_group(&self, id: u64) -> Result<()> {
        (**self).delete_group(id)
    }

    fn add_group_member(&self, group_id: u64, member: &NewMember) -> Result<()> {
        (**self).add_group_member(group_id, member)
    }

    fn list_group_members(&self, group_id: u64) -> Result<Vec<Member>> {
        (**self).list_group_members(group_id)
    }

    fn create_project(&self, project: &NewProject) -> Result<TargetProject> {
        (**self).create_project(project)
    }

    fn create_user_project(&self, user_id: u64, project: &NewProject) -> Result<TargetProject> {
        (**self).create_user_project(user_id, project)
    }

    fn list_projects(&self) -> Result<Vec<TargetProject>> {
        (**self).list_projects()
    }

    fn delete_project(&self, id: u64) -> Result<()> {
        (**self).delete_project(id)
    }

    fn add_project_member(&self, project_id: u64, member: &NewMember) -> Result<()> {
        (**self).add_project_member(project_id, member)
    }

    fn create_fork_relation(&self, project_id: u64, forked_from_id: u64) -> Result<()> {
        (**self).create_fork_relation(project_id, forked_from_id)
    }
}
