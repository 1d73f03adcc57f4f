use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::UsernameTransform;
use crate::error::{Error, Result};

/// Environment variable that overrides `target.token`.
pub const TOKEN_ENV_VAR: &str = "FORGE_MIGRATE_TARGET_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub legacy: LegacyConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub users: UsernameTransform,
    #[serde(default)]
    pub tokens: TokenConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyConfig {
    /// Path to the legacy SQLite database.
    pub database: PathBuf,
    /// Clone URL template; `{path}` is replaced by the repository's hashed path.
    pub clone_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_visibility")]
    pub visibility: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Target accounts with an id up to this value are built-in system accounts.
    #[serde(default = "default_system_user_max_id")]
    pub system_user_max_id: u64,
    /// The target is assumed to sit on a trusted network.
    #[serde(default)]
    pub verify_tls: bool,
}

impl TargetConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Root directory for the local bare repositories.
    #[serde(default = "default_export_root")]
    pub root: PathBuf,
    /// Name of the remote that points at the target.
    #[serde(default = "default_remote_name")]
    pub remote_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            root: default_export_root(),
            remote_name: default_remote_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_token_name")]
    pub name: String,
    #[serde(default = "default_token_scopes")]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_days: Option<u32>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_token_name(),
            scopes: default_token_scopes(),
            expires_in_days: None,
        }
    }
}

fn default_visibility() -> String {
    "public".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_system_user_max_id() -> u64 {
    1
}

fn default_export_root() -> PathBuf {
    PathBuf::from("exported_repositories")
}

fn default_remote_name() -> String {
    "gitlab".to_string()
}

fn default_token_name() -> String {
    "import token".to_string()
}

fn default_token_scopes() -> Vec<String> {
    vec!["api".to_string(), "read_user".to_string()]
}

impl MigrationConfig {
    /// Loads a config file, applying the token environment override.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        let config = Self::parse(&content, env::var(TOKEN_ENV_VAR).ok())?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses config text. A non-empty `env_token` replaces `target.token`.
    pub fn parse(content: &str, env_token: Option<String>) -> Result<Self> {
        let mut config: MigrationConfig = toml::from_str(content)?;

        if let Some(token) = env_token.map(|t| t.trim().to_string()) {
            if !token.is_empty() {
                config.target.token = token;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.target.url.trim().is_empty() {
            return Err(Error::Config("target.url cannot be empty".into()));
        }
        if self.target.token.trim().is_empty() {
            return Err(Error::Config(format!(
                "target.token is empty; set it in the config or via {TOKEN_ENV_VAR}"
            )));
        }
        if !self.legacy.clone_url.contains("{path}") {
            return Err(Error::Config(
                "legacy.clone_url must contain a {path} placeholder".into(),
            ));
        }
        if self.export.remote_name.trim().is_empty() {
            return Err(Error::Config("export.remote_name cannot be empty".into()));
        }
        if self.tokens.scopes.is_empty() {
            return Err(Error::Config("tokens.scopes cannot be empty".into()));
        }
        Ok(())
    }
}
