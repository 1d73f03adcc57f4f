use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::{MappedUser, Migrator, RunState, UserFailure};
use crate::api::TargetApi;
use crate::api::dto::{NewSshKey, NewUser};
use crate::error::{Error, Result};
use crate::mirror::Mirror;
use crate::password::{PASSWORD_LENGTH, random_word};
use crate::store::LegacyStore;
use crate::types::TargetUser;
use crate::types::legacy::User;

impl<S: LegacyStore, A: TargetApi, M: Mirror> Migrator<S, A, M> {
    /// Maps every legacy user to a target account, creating missing ones.
    ///
    /// Users mapped by an earlier call are left alone. Returns the users that
    /// could not be created during this call.
    pub fn reconcile_users(&mut self) -> Result<Vec<UserFailure>> {
        if !matches!(self.state, RunState::Idle | RunState::UsersReconciled) {
            return Err(Error::OutOfOrder {
                expected: RunState::Idle.as_str(),
                actual: self.state.as_str(),
            });
        }

        let legacy_users = self.store.list_users()?;
        let mut existing: HashMap<String, TargetUser> = self
            .api
            .list_users()?
            .into_iter()
            .map(|u| (u.username.clone(), u))
            .collect();

        let mut failures = Vec::new();
        for user in &legacy_users {
            if let Some(target) = self.mapped_user(user.id) {
                debug!("{} already mapped to {}", user.login, target.username);
                continue;
            }

            let username = self.usernames.apply(&user.login);
            let target = match existing.remove(&username) {
                Some(found) => {
                    info!("{username} in target");
                    Some(found)
                }
                None => {
                    info!("{username} not in target");
                    match self.create_user(user, &username) {
                        Ok(created) => Some(created),
                        Err(e) => {
                            warn!("Problem with user {}: {e}", user.login);
                            failures.push(UserFailure {
                                login: user.login.clone(),
                                message: e.to_string(),
                            });
                            None
                        }
                    }
                }
            };

            self.users.insert(
                user.id,
                MappedUser {
                    login: user.login.clone(),
                    target,
                },
            );
        }

        let mapped = self.users.values().filter(|u| u.target.is_some()).count();
        info!("{mapped} of {} user(s) mapped", legacy_users.len());

        self.report.user_failures.extend(failures.iter().cloned());
        self.state = RunState::UsersReconciled;
        Ok(failures)
    }

    fn create_user(&mut self, user: &User, username: &str) -> Result<TargetUser> {
        let created = self.api.create_user(&NewUser {
            email: user.email.clone(),
            username: username.to_string(),
            name: user.display_name().to_string(),
            password: random_word(PASSWORD_LENGTH, &mut self.rng),
            skip_confirmation: true,
        })?;
        info!("Created user {} as {}", user.login, created.username);

        self.import_ssh_keys(user, &created);
        Ok(created)
    }

    /// Best effort: a rejected key never fails the user.
    fn import_ssh_keys(&self, user: &User, target: &TargetUser) {
        let keys = match self.store.list_ssh_keys(user.id) {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Cannot read ssh keys of {}: {e}", user.login);
                return;
            }
        };

        for (i, key) in keys.iter().enumerate() {
            let title = format!("key {}", i + 1);
            let request = NewSshKey {
                title: title.clone(),
                key: key.key.clone(),
            };
            if let Err(e) = self.api.create_ssh_key(target.id, &request) {
                warn!("Problem with {title} of {}: {e}", user.login);
            }
        }
    }

    /// Target account of a legacy user, or an error naming the login.
    pub(super) fn require_user(&self, legacy_id: i64) -> Result<TargetUser> {
        match self.users.get(&legacy_id) {
            Some(MappedUser {
                target: Some(target),
                ..
            }) => Ok(target.clone()),
            Some(MappedUser { login, .. }) => Err(Error::UnmappedUser {
                login: login.clone(),
            }),
            None => Err(Error::UnmappedUser {
                login: format!("#{legacy_id}"),
            }),
        }
    }
}
