//! # forge-migrate
//!
//! One-shot migration of a Gitorious installation into GitLab: users and
//! their SSH keys, groups and memberships, projects, wikis and forks, with
//! every repository mirrored through a local bare clone.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! forge-migrate = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::path::Path;
//! use forge_migrate::api::ApiClient;
//! use forge_migrate::config::MigrationConfig;
//! use forge_migrate::migrator::Migrator;
//! use forge_migrate::mirror::GitMirror;
//! use forge_migrate::store::SqliteLegacyStore;
//!
//! let config = MigrationConfig::load(Path::new("forge-migrate.toml"))?;
//! let store = SqliteLegacyStore::open(&config.legacy.database)?;
//! let api = ApiClient::new(&config.target)?;
//! let mirror = GitMirror::new(config.export.remote_name.clone());
//!
//! let report = Migrator::new(store, api, mirror, &config).run(false)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod api;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod grouping;
pub mod migrator;
pub mod mirror;
pub mod password;
pub mod store;
pub mod types;
