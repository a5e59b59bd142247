//! Vape command: apply a migration target to the configured database

use anyhow::{Context, Result};
use forum_db::{Database, PostgresBackend};
use forum_migrate::{Plan, RunReport, Runner};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::{GlobalArgs, VapeArgs};
use crate::commands::common::{load_config, migration_source};

/// Execute the vape command
pub(crate) async fn execute(args: &VapeArgs, global: &GlobalArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = load_config(global)?;
    let source = migration_source(global)?;
    let base = config.migrations.base.as_str();

    log::info!(
        "Connecting to {} for target '{}'",
        config.db.postgres.summary(),
        args.migtarget
    );
    let backend = PostgresBackend::connect(&config.db.postgres)
        .await
        .context("Failed to connect to database")?;
    let db: Arc<dyn Database> = Arc::new(backend);
    let runner = Runner::new(db).with_max_parallel(config.migrations.max_parallel);

    if args.dry_run {
        let plan = runner
            .plan(&source, base, &args.migtarget)
            .await
            .with_context(|| format!("Failed to plan target '{}'", args.migtarget))?;
        print_plan(&plan);
        return Ok(());
    }

    let report = runner
        .run(&source, base, &args.migtarget)
        .await
        .with_context(|| format!("Failed to migrate to target '{}'", args.migtarget))?;
    print_report(&args.migtarget, &report);
    println!("Total time: {}ms", start_time.elapsed().as_millis());
    Ok(())
}

fn print_plan(plan: &Plan) {
    println!(
        "Plan for target '{}' ({} already applied)\n",
        plan.target, plan.already_applied
    );
    for (i, round) in plan.rounds.iter().enumerate() {
        println!("  Round {}: {}", i + 1, round.join(", "));
    }
    if plan.rounds.is_empty() {
        println!("  Nothing to do");
    }
}

fn print_report(target: &str, report: &RunReport) {
    for (i, round) in report.rounds.iter().enumerate() {
        println!("  ✓ Round {}: {}", i + 1, round.join(", "));
    }
    println!();
    println!(
        "Migrated to '{}': {} units in {} rounds, {} recorded, {} already applied",
        target,
        report.units_run(),
        report.rounds.len(),
        report.recorded,
        report.already_applied
    );
}
