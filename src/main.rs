use clap::Parser;
use tracing_subscriber::EnvFilter;

use forge_migrate::cli::{Commands, run_check, run_cleanup, run_migrate};

#[derive(Parser)]
#[command(name = "forge-migrate")]
#[command(about = "Migrate users, projects and repositories from Gitorious to GitLab", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("forge_migrate=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            wipe,
            yes,
            json,
        } => run_migrate(&config, wipe, yes, json),
        Commands::Cleanup {
            config,
            include_users,
            yes,
        } => run_cleanup(&config, include_users, yes),
        Commands::Check { config } => run_check(&config),
    }
}
