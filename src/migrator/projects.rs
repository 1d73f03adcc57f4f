use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::{FailureDetail, MigratedProject, Migrator};
use crate::api::TargetApi;
use crate::api::dto::{NewGroup, NewMember, NewProject};
use crate::error::{Error, Result};
use crate::grouping::{RepositoryGroup, group_repositories};
use crate::mirror::Mirror;
use crate::mirror::path::{authenticated_url, export_path, redact_url, wiki_export_path};
use crate::store::{LegacyStore, load_owner};
use crate::types::legacy::{Owner, OwnerRef, Project, Repository};
use crate::types::{AccessLevel, TargetGroup, TargetProject, TargetUser};

/// Longest description the target accepts.
pub const MAX_DESCRIPTION_LEN: usize = 255;

const RESERVED_GROUP_CHAR: char = '#';
const RESERVED_GROUP_REPLACEMENT: &str = "S";

/// Namespace a new project is created in.
#[derive(Debug, Clone)]
pub enum Destination {
    User(TargetUser),
    Group(TargetGroup),
}

fn truncate_description(description: Option<&str>) -> Option<String> {
    description.map(|d| d.chars().take(MAX_DESCRIPTION_LEN).collect())
}

fn group_name(title: &str) -> String {
    title.replace(RESERVED_GROUP_CHAR, RESERVED_GROUP_REPLACEMENT)
}

/// Treats "already a member" as success.
fn ignore_conflict(result: Result<()>) -> Result<()> {
    match result {
        Err(Error::Api { status: 409, .. }) => Ok(()),
        other => other,
    }
}

impl<S: LegacyStore, A: TargetApi, M: Mirror> Migrator<S, A, M> {
    /// Migrates one legacy project and returns every failure it hit.
    ///
    /// Failures before any target project exists abort the project. After
    /// that, each repository group fails independently.
    pub(super) fn migrate_project(&mut self, project: &Project) -> Vec<FailureDetail> {
        let repos = match self.load_repositories(project) {
            Ok(repos) => repos,
            Err(e) => return vec![FailureDetail::new(None, &e)],
        };

        match self.migrate_groups(project, &repos) {
            Ok(failures) => failures,
            Err(e) => vec![FailureDetail::new(None, &e)],
        }
    }

    fn load_repositories(&self, project: &Project) -> Result<Vec<Repository>> {
        // Resolve the owner first so a bad owner row fails before any I/O.
        project.owner()?;
        self.store.list_repositories(project.id)
    }

    fn migrate_groups(
        &mut self,
        project: &Project,
        repos: &[Repository],
    ) -> Result<Vec<FailureDetail>> {
        let grouping = group_repositories(repos)?;

        if grouping.orphaned_forks > 0 {
            self.record_warning(
                project,
                format!(
                    "{} fork(s) of forks not migrated",
                    grouping.orphaned_forks
                ),
            );
        }

        let mut failures = self.create_projects(project, &grouping.groups)?;

        // Leftover wikis fail the project once its groups are migrated.
        if grouping.unmigrated_wikis > 0 {
            let err = Error::UnmigratedWikis {
                count: grouping.unmigrated_wikis,
            };
            warn!("Project {}: {err}", project.slug);
            failures.push(FailureDetail::new(None, &err));
        }
        Ok(failures)
    }

    fn create_projects(
        &mut self,
        project: &Project,
        groups: &[RepositoryGroup<'_>],
    ) -> Result<Vec<FailureDetail>> {
        if groups.is_empty() {
            info!("Project {} has no repositories", project.slug);
            return Ok(Vec::new());
        }

        let owner = load_owner(&self.store, project.owner()?)?;
        let failed = |group: &RepositoryGroup<'_>, e: &Error| {
            FailureDetail::new(group.primary().map(|r| r.name.clone()), e)
        };

        if let (Owner::User(user), [group]) = (&owner, groups) {
            let destination = Destination::User(self.require_user(user.id)?);
            return Ok(self
                .create_project(project, &owner, group, &destination)
                .err()
                .map(|e| failed(group, &e))
                .into_iter()
                .collect());
        }

        let target_group = self.create_group_for(project, &owner)?;
        let destination = Destination::Group(target_group);

        let mut failures = Vec::new();
        for group in groups {
            if let Err(e) = self.create_project(project, &owner, group, &destination) {
                failures.push(failed(group, &e));
            }
        }
        Ok(failures)
    }

    /// Creates a target group for a project that cannot be a personal project.
    pub fn create_group_for(&mut self, project: &Project, owner: &Owner) -> Result<TargetGroup> {
        let group = self.api.create_group(&NewGroup {
            name: group_name(&project.title),
            path: project.slug.clone(),
            description: truncate_description(project.description.as_deref()),
            visibility: self.visibility.clone(),
        })?;
        info!("Created group {}", group.path);

        match owner {
            Owner::Group(legacy_group) => {
                for &member_id in &legacy_group.member_ids {
                    let access_level = if member_id == legacy_group.admin_id {
                        AccessLevel::Owner
                    } else {
                        AccessLevel::Developer
                    };
                    let user = match self.require_user(member_id) {
                        Ok(user) => user,
                        Err(e) if member_id != legacy_group.admin_id => {
                            warn!("Skipping member of {}: {e}", group.path);
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    self.add_group_member(&group, &user, access_level)?;
                }
            }
            Owner::User(legacy_user) => {
                let user = self.require_user(legacy_user.id)?;
                self.add_group_member(&group, &user, AccessLevel::Owner)?;
            }
        }

        Ok(group)
    }

    fn add_group_member(
        &self,
        group: &TargetGroup,
        user: &TargetUser,
        access_level: AccessLevel,
    ) -> Result<()> {
        let member = NewMember {
            user_id: user.id,
            access_level,
        };
        ignore_conflict(self.api.add_group_member(group.id, &member))?;
        debug!("Added {} to {} as {access_level:?}", user.username, group.path);
        Ok(())
    }

    /// Creates the target project for one repository group and mirrors
    /// its repository, wiki and forks.
    pub fn create_project(
        &mut self,
        project: &Project,
        owner: &Owner,
        group: &RepositoryGroup<'_>,
        destination: &Destination,
    ) -> Result<TargetProject> {
        let primary = group.primary().ok_or(Error::NotFound)?;
        let name = match group.project_repo {
            Some(repo) => repo.name.clone(),
            None => primary.base_name().to_string(),
        };
        let description = primary.description.as_deref().or(project.description.as_deref());

        let mut request = NewProject {
            name,
            description: truncate_description(description),
            wiki_enabled: group.wiki_repo.is_some(),
            topics: project.tags.clone(),
            visibility: self.visibility.clone(),
            namespace_id: None,
        };

        let target = match destination {
            Destination::User(user) => self.api.create_user_project(user.id, &request)?,
            Destination::Group(target_group) => {
                request.namespace_id = Some(target_group.id);
                self.api.create_project(&request)?
            }
        };
        info!(
            "Created project {}/{}",
            target.namespace.path, target.path
        );

        if let Some(repo) = group.project_repo {
            self.grant_committers(owner, repo, &target);
            self.mirror_repository(repo, &target, false)?;
        }
        if let Some(wiki) = group.wiki_repo {
            self.mirror_repository(wiki, &target, true)?;
        }
        for fork in &group.forks {
            self.create_fork(fork, &target)?;
        }

        self.report.migrated_projects.push(MigratedProject {
            slug: project.slug.clone(),
            target_path: format!("{}/{}", target.namespace.path, target.path),
        });
        Ok(target)
    }

    /// Forks always land in the fork owner's personal namespace.
    fn create_fork(&mut self, fork: &Repository, parent: &TargetProject) -> Result<TargetProject> {
        let owner = self.require_user(fork.fork_owner_id())?;

        let created = self.api.create_user_project(
            owner.id,
            &NewProject {
                name: fork.name.clone(),
                description: truncate_description(fork.description.as_deref()),
                wiki_enabled: false,
                topics: Vec::new(),
                visibility: self.visibility.clone(),
                namespace_id: None,
            },
        )?;
        self.api.create_fork_relation(created.id, parent.id)?;
        info!(
            "Created fork {}/{} of {}/{}",
            created.namespace.path, created.path, parent.namespace.path, parent.path
        );

        self.mirror_repository(fork, &created, false)?;
        Ok(created)
    }

    /// Grants developer access to committers other than the project owner.
    /// Best effort: failures are logged.
    fn grant_committers(&self, owner: &Owner, repo: &Repository, target: &TargetProject) {
        let committerships = match self.store.list_committerships(repo.id) {
            Ok(c) => c,
            Err(e) => {
                warn!("Cannot read committers of {}: {e}", repo.name);
                return;
            }
        };

        let owners: BTreeSet<i64> = match owner {
            Owner::User(user) => BTreeSet::from([user.id]),
            Owner::Group(group) => group.member_ids.iter().copied().collect(),
        };

        let mut committers = BTreeSet::new();
        for committership in committerships.iter().filter(|c| c.rights.can_push()) {
            match committership.committer {
                OwnerRef::User(id) => {
                    committers.insert(id);
                }
                OwnerRef::Group(id) => match self.store.get_group(id) {
                    Ok(Some(group)) => committers.extend(group.member_ids),
                    Ok(None) => warn!("Committer group {id} of {} not found", repo.name),
                    Err(e) => warn!("Cannot read committer group {id}: {e}"),
                },
            }
        }

        for legacy_id in committers.difference(&owners) {
            let user = match self.require_user(*legacy_id) {
                Ok(user) => user,
                Err(e) => {
                    warn!("Skipping committer of {}: {e}", repo.name);
                    continue;
                }
            };
            let member = NewMember {
                user_id: user.id,
                access_level: AccessLevel::Developer,
            };
            if let Err(e) = ignore_conflict(self.api.add_project_member(target.id, &member)) {
                warn!("Cannot grant {} on {}: {e}", user.username, target.path);
            }
        }
    }

    fn mirror_repository(
        &mut self,
        repo: &Repository,
        target: &TargetProject,
        wiki: bool,
    ) -> Result<()> {
        let token = self.tokens.token_for(&self.api, target)?;

        let (local_path, http_url) = if wiki {
            (
                wiki_export_path(&self.export_root, &target.namespace.path, &target.path)?,
                target.wiki_http_url(),
            )
        } else {
            (
                export_path(&self.export_root, &target.namespace.path, &target.path)?,
                target.http_url_to_repo.clone(),
            )
        };
        let push_url = authenticated_url(&http_url, &token)?;
        let source_url = repo.clone_url(&self.clone_url);

        debug!(
            "Mirroring {} -> {}",
            redact_url(&source_url),
            redact_url(&push_url)
        );
        self.mirror.mirror(&local_path, &source_url, &push_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_description_is_char_safe() {
        let long = "é".repeat(300);
        let truncated = truncate_description(Some(&long)).unwrap();
        assert_eq!(truncated.chars().count(), MAX_DESCRIPTION_LEN);
        assert_eq!(truncate_description(None), None);
        assert_eq!(truncate_description(Some("short")).as_deref(), Some("short"));
    }

    #[test]
    fn test_group_name_substitutes_reserved_char() {
        assert_eq!(group_name("C# tools"), "CS tools");
        assert_eq!(group_name("plain"), "plain");
    }

    #[test]
    fn test_ignore_conflict() {
        let conflict = Err(Error::Api {
            status: 409,
            message: "Member already exists".into(),
        });
        assert!(ignore_conflict(conflict).is_ok());

        let forbidden = Err(Error::Api {
            status: 403,
            message: "403 Forbidden".into(),
        });
        assert!(ignore_conflict(forbidden).is_err());
    }
}
