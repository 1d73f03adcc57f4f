//! Drives a complete migration run.
//!
//! A [`Migrator`] owns everything that lives for one run: the legacy-to-target
//! user mapping, the [`CredentialCache`] and the report being assembled. Runs
//! move through [`RunState`] in order:
//!
//! ```text
//! Idle -> UsersReconciled -> ProjectsMigrating -> Done
//! ```
//!
//! Every legacy project is processed inside its own failure boundary, so one
//! broken project never stops the batch.

mod projects;
mod report;
mod users;

pub use projects::Destination;
pub use report::*;

use std::collections::BTreeMap;
use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info, warn};

use crate::api::TargetApi;
use crate::config::{MigrationConfig, UsernameTransform};
use crate::credentials::CredentialCache;
use crate::error::{Error, Result};
use crate::mirror::Mirror;
use crate::store::LegacyStore;
use crate::types::TargetUser;
use crate::types::legacy::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    UsersReconciled,
    ProjectsMigrating,
    Done,
}

impl RunState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::UsersReconciled => "users-reconciled",
            Self::ProjectsMigrating => "projects-migrating",
            Self::Done => "done",
        }
    }
}

/// Legacy user and the target account it maps to, if any.
#[derive(Debug, Clone)]
struct MappedUser {
    login: String,
    target: Option<TargetUser>,
}

pub struct Migrator<S, A, M> {
    store: S,
    api: A,
    mirror: M,
    clone_url: String,
    export_root: PathBuf,
    visibility: String,
    usernames: UsernameTransform,
    system_user_max_id: u64,
    users: BTreeMap<i64, MappedUser>,
    tokens: CredentialCache,
    rng: StdRng,
    state: RunState,
    report: MigrationReport,
}

impl<S: LegacyStore, A: TargetApi, M: Mirror> Migrator<S, A, M> {
    pub fn new(store: S, api: A, mirror: M, config: &MigrationConfig) -> Self {
        Self {
            store,
            api,
            mirror,
            clone_url: config.legacy.clone_url.clone(),
            export_root: config.export.root.clone(),
            visibility: config.target.visibility.clone(),
            usernames: config.users.clone(),
            system_user_max_id: config.target.system_user_max_id,
            users: BTreeMap::new(),
            tokens: CredentialCache::new(&config.tokens, config.target.system_user_max_id),
            rng: StdRng::from_entropy(),
            state: RunState::Idle,
            report: MigrationReport::default(),
        }
    }

    /// Replaces the random source used for throwaway passwords.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn mirror(&self) -> &M {
        &self.mirror
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialCache {
        &self.tokens
    }

    /// Target account a legacy user was mapped to.
    #[must_use]
    pub fn mapped_user(&self, legacy_id: i64) -> Option<&TargetUser> {
        self.users.get(&legacy_id)?.target.as_ref()
    }

    /// Verifies the legacy store and the target API are usable.
    pub fn check(&self) -> Result<TargetUser> {
        self.store.verify_schema()?;
        let user = self
            .api
            .current_user()
            .map_err(|e| Error::Config(format!("target api is unreachable: {e}")))?;
        info!("Authenticated against target as {}", user.username);
        Ok(user)
    }

    /// Runs the whole pipeline, optionally wiping the target first.
    pub fn run(&mut self, wipe: bool) -> Result<MigrationReport> {
        self.check()?;
        if wipe {
            let cleaned = self.cleanup()?;
            info!(
                "Wiped target: {} project(s), {} group(s)",
                cleaned.projects_deleted, cleaned.groups_deleted
            );
        }
        self.reconcile_users()?;
        self.migrate_all_projects()
    }

    /// Migrates every legacy project, isolating failures per project.
    pub fn migrate_all_projects(&mut self) -> Result<MigrationReport> {
        if self.state != RunState::UsersReconciled {
            return Err(Error::OutOfOrder {
                expected: RunState::UsersReconciled.as_str(),
                actual: self.state.as_str(),
            });
        }
        self.state = RunState::ProjectsMigrating;

        let projects = self.store.list_projects()?;
        info!("Migrating {} project(s)", projects.len());

        for project in &projects {
            info!("Migrating project {}", project.slug);
            let errors = self.migrate_project(project);

            if errors.is_empty() {
                self.report.migrated += 1;
                continue;
            }

            for detail in &errors {
                error!(
                    "Project {} failed{}: {}",
                    project.slug,
                    detail
                        .repository
                        .as_deref()
                        .map(|r| format!(" at {r}"))
                        .unwrap_or_default(),
                    detail.message
                );
            }
            self.report.failures.push(ProjectFailure {
                project_id: project.id,
                slug: project.slug.clone(),
                errors,
            });
        }

        self.state = RunState::Done;
        info!(
            "Migrated {} project(s), {} failed",
            self.report.migrated,
            self.report.failures.len()
        );
        Ok(self.report.clone())
    }

    /// Deletes every target project, then every target group.
    ///
    /// Destructive: only meant to reset a staging target between trial runs.
    pub fn cleanup(&self) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();

        for project in self.api.list_projects()? {
            self.api.delete_project(project.id)?;
            report.projects_deleted += 1;
        }
        for group in self.api.list_groups()? {
            self.api.delete_group(group.id)?;
            report.groups_deleted += 1;
        }

        warn!(
            "Deleted {} project(s) and {} group(s) from target",
            report.projects_deleted, report.groups_deleted
        );
        Ok(report)
    }

    /// Deletes every target user that is not a system account.
    pub fn remove_users(&self) -> Result<usize> {
        let mut deleted = 0;
        for user in self.api.list_users()? {
            if user.id > self.system_user_max_id {
                self.api.delete_user(user.id)?;
                deleted += 1;
            }
        }
        warn!("Deleted {deleted} user(s) from target");
        Ok(deleted)
    }

    fn record_warning(&mut self, project: &Project, message: String) {
        warn!("Project {}: {message}", project.slug);
        self.report.warnings.push(ProjectWarning {
            slug: project.slug.clone(),
            message,
        });
    }
}
