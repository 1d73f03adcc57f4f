use std::path::Path;

use crate::migrator::MigrationReport;

use super::{confirm_action, init_migrator};

pub fn run_migrate(config: &Path, wipe: bool, yes: bool, json: bool) -> anyhow::Result<()> {
    let mut migrator = init_migrator(config)?;

    if wipe && !confirm_action("Delete every project and group on the target first?", yes)? {
        println!("Cancelled");
        return Ok(());
    }

    let report = migrator.run(wipe)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.is_success() {
        anyhow::bail!("{} project(s) failed to migrate", report.failures.len());
    }
    Ok(())
}

fn print_report(report: &MigrationReport) {
    println!();
    println!("Migrated projects: {}", report.migrated);
    for project in &report.migrated_projects {
        println!("  {} -> {}", project.slug, project.target_path);
    }

    if !report.user_failures.is_empty() {
        println!();
        println!("Users not migrated: {}", report.user_failures.len());
        for failure in &report.user_failures {
            println!("  {}: {}", failure.login, failure.message);
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  {}: {}", warning.slug, warning.message);
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!("Failed projects: {}", report.failures.len());
        for failure in &report.failures {
            println!("  {} (#{})", failure.slug, failure.project_id);
            for detail in &failure.errors {
                match &detail.repository {
                    Some(repo) => println!("    [{:?}] {repo}: {}", detail.kind, detail.message),
                    None => println!("    [{:?}] {}", detail.kind, detail.message),
                }
            }
        }
    }
}

pub fn run_cleanup(config: &Path, include_users: bool, yes: bool) -> anyhow::Result<()> {
    let migrator = init_migrator(config)?;

    let message = if include_users {
        "Delete every project, group and non-system user on the target?"
    } else {
        "Delete every project and group on the target?"
    };
    if !confirm_action(message, yes)? {
        println!("Cancelled");
        return Ok(());
    }

    migrator.check()?;
    let mut report = migrator.cleanup()?;
    if include_users {
        report.users_deleted = migrator.remove_users()?;
    }

    println!(
        "Deleted {} project(s), {} group(s), {} user(s)",
        report.projects_deleted, report.groups_deleted, report.users_deleted
    );
    Ok(())
}

pub fn run_check(config: &Path) -> anyhow::Result<()> {
    let migrator = init_migrator(config)?;
    let user = migrator.check()?;
    println!("Legacy database schema OK");
    println!("Target API reachable as {}", user.username);
    Ok(())
}
