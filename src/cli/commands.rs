use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Migrate every legacy user and project into the target
    Run {
        /// Path to the migration config file
        #[arg(long, short, default_value = "forge-migrate.toml")]
        config: PathBuf,

        /// Delete all target projects and groups before migrating
        #[arg(long)]
        wipe: bool,

        /// Skip confirmation prompts
        #[arg(long, short)]
        yes: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all projects and groups from the target
    Cleanup {
        /// Path to the migration config file
        #[arg(long, short, default_value = "forge-migrate.toml")]
        config: PathBuf,

        /// Also delete every non-system user
        #[arg(long)]
        include_users: bool,

        /// Skip confirmation prompts
        #[arg(long, short)]
        yes: bool,
    },

    /// Verify the legacy database and target API are reachable
    Check {
        /// Path to the migration config file
        #[arg(long, short, default_value = "forge-migrate.toml")]
        config: PathBuf,
    },
}
