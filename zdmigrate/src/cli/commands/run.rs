//! Run command: execute the migration and render the report

use anyhow::Result;
use colored::*;

use crate::api::ZendeskClient;
use crate::config::Config;
use crate::migrate::graph::DependencyGraph;
use crate::migrate::{ExecutionContext, IdMapping, MigrationReport, StepOutcome, read_catalog, run_plan};

pub async fn handle_run_command(config: &Config) -> Result<()> {
    let source_client = ZendeskClient::new(&config.source)?;
    let destination_client = ZendeskClient::new(&config.destination)?;

    let source = read_catalog(&source_client).await?;
    let destination = read_catalog(&destination_client).await?;

    let plan = DependencyGraph::build_plan(&source)?;
    log::info!(
        "migrating {} entities from {} to {}",
        plan.len(),
        config.source.subdomain,
        config.destination.subdomain
    );

    let context = ExecutionContext {
        source: &source,
        destination: &destination,
        source_name: &config.source.subdomain,
        destination_name: &config.destination.subdomain,
    };

    let mut mapping = IdMapping::new();
    let report = run_plan(&plan, &context, &destination_client, &mut mapping).await?;
    log::debug!("{} id mappings recorded", mapping.len());

    print_report(&report);

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &MigrationReport) {
    println!(
        "Migration {} -> {} ({})",
        report.source.cyan(),
        report.destination.cyan(),
        report.run_date.dimmed()
    );
    println!();

    for entry in &report.entries {
        match &entry.outcome {
            StepOutcome::Created { destination_id } => {
                println!(
                    "  {} {} (#{})",
                    "created".green().bold(),
                    entry.entity,
                    destination_id
                );
            }
            StepOutcome::Skipped { destination_id } => {
                println!(
                    "  {} {} (#{})",
                    "skipped".dimmed(),
                    entry.entity,
                    destination_id
                );
            }
            StepOutcome::Failed {
                error,
                cascaded_from,
            } => match cascaded_from {
                Some(root) => println!(
                    "  {} {} (dependency {} failed)",
                    "blocked".yellow().bold(),
                    entry.entity,
                    root
                ),
                None => println!("  {} {}: {}", "failed".red().bold(), entry.entity, error),
            },
        }
    }

    println!();
    let failed = report.failed_count();
    let summary = format!(
        "{} created, {} skipped, {} failed",
        report.created_count(),
        report.skipped_count(),
        failed
    );
    if failed == 0 {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }
}
