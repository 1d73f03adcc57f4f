//! Per-run cache of impersonation tokens, one per target owner.

use std::collections::HashMap;

use chrono::{Days, Utc};
use tracing::{debug, info};

use crate::api::TargetApi;
use crate::api::dto::NewImpersonationToken;
use crate::config::TokenConfig;
use crate::error::{Error, Result};
use crate::types::{AccessLevel, NamespaceKind, TargetProject};

/// Tokens are created on first use and never refreshed or revoked.
pub struct CredentialCache {
    tokens: HashMap<u64, String>,
    request: NewImpersonationToken,
    system_user_max_id: u64,
}

impl CredentialCache {
    #[must_use]
    pub fn new(config: &TokenConfig, system_user_max_id: u64) -> Self {
        let expires_at = config.expires_in_days.and_then(|days| {
            Utc::now()
                .date_naive()
                .checked_add_days(Days::new(u64::from(days)))
                .map(|d| d.format("%Y-%m-%d").to_string())
        });

        Self {
            tokens: HashMap::new(),
            request: NewImpersonationToken {
                name: config.name.clone(),
                scopes: config.scopes.clone(),
                expires_at,
            },
            system_user_max_id,
        }
    }

    /// Target user whose credentials push to `project`.
    ///
    /// Personal namespaces resolve to their owner. Group namespaces resolve to
    /// the owner-level member with the lowest id, skipping system accounts.
    pub fn resolve_owner<A: TargetApi>(&self, api: &A, project: &TargetProject) -> Result<u64> {
        let no_owner = || Error::NoNamespaceOwner {
            namespace: project.namespace.path.clone(),
        };

        match project.namespace.kind {
            NamespaceKind::User => project.owner.as_ref().map(|o| o.id).ok_or_else(no_owner),
            NamespaceKind::Group => api
                .list_group_members(project.namespace.id)?
                .into_iter()
                .filter(|m| m.access_level == AccessLevel::Owner)
                .filter(|m| m.id > self.system_user_max_id)
                .map(|m| m.id)
                .min()
                .ok_or_else(no_owner),
        }
    }

    /// Returns the cached token for `project`'s owner, creating it on first use.
    pub fn token_for<A: TargetApi>(&mut self, api: &A, project: &TargetProject) -> Result<String> {
        let owner_id = self.resolve_owner(api, project)?;

        if let Some(token) = self.tokens.get(&owner_id) {
            debug!("Reusing impersonation token for user {owner_id}");
            return Ok(token.clone());
        }

        let token = api.create_impersonation_token(owner_id, &self.request)?;
        info!("Created impersonation token for user {owner_id}");
        self.tokens.insert(owner_id, token.token.clone());
        Ok(token.token)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
