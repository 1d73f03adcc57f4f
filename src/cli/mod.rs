mod commands;
mod run;

pub use commands::Commands;
pub use run::{run_check, run_cleanup, run_migrate};

use std::io::IsTerminal;
use std::path::Path;

use crate::api::ApiClient;
use crate::config::MigrationConfig;
use crate::migrator::Migrator;
use crate::mirror::GitMirror;
use crate::store::SqliteLegacyStore;

pub type CliMigrator = Migrator<SqliteLegacyStore, ApiClient, GitMirror>;

/// Loads the config and wires the production store, client and mirror.
pub fn init_migrator(config_path: &Path) -> anyhow::Result<CliMigrator> {
    let config = MigrationConfig::load(config_path)?;
    let store = SqliteLegacyStore::open(&config.legacy.database)?;
    let api = ApiClient::new(&config.target)?;
    let mirror = GitMirror::new(config.export.remote_name.clone());
    Ok(Migrator::new(store, api, mirror, &config))
}

/// Request confirmation for a destructive operation
pub fn confirm_action(message: &str, yes: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if !std::io::stdin().is_terminal() {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}
