//! Plan command: show what a run would do, without writing

use anyhow::Result;
use colored::*;

use crate::api::ZendeskClient;
use crate::config::Config;
use crate::migrate::graph::DependencyGraph;
use crate::migrate::resolver::{self, Match};
use crate::migrate::types::{EntityKind, MigrationStep};
use crate::migrate::{Catalog, read_catalog};

pub async fn handle_plan_command(config: &Config) -> Result<()> {
    let source_client = ZendeskClient::new(&config.source)?;
    let destination_client = ZendeskClient::new(&config.destination)?;

    let source = read_catalog(&source_client).await?;
    let destination = read_catalog(&destination_client).await?;

    let plan = DependencyGraph::build_plan(&source)?;
    if plan.is_empty() {
        println!("Nothing to migrate: the source account has no entities.");
        return Ok(());
    }

    println!(
        "Migration plan: {} -> {} ({} entities)",
        config.source.subdomain.cyan(),
        config.destination.subdomain.cyan(),
        plan.len()
    );
    println!();

    let mut to_create = 0;
    for (position, step) in plan.steps.iter().enumerate() {
        let resolution = resolve_step(step, &source, &destination)?;
        let status = match resolution {
            Match::Existing(id) => format!("exists (#{})", id).dimmed(),
            Match::Absent => {
                to_create += 1;
                "create".green().bold()
            }
        };

        println!("{:>4}. {:<10} {}", position + 1, status, step.entity);
        for dependency in &step.dependencies {
            println!("      {} {}", "needs".dimmed(), dependency);
        }
    }

    println!();
    println!(
        "{} to create, {} already present",
        to_create.to_string().green(),
        (plan.len() - to_create).to_string().dimmed()
    );

    Ok(())
}

fn resolve_step(
    step: &MigrationStep,
    source: &Catalog,
    destination: &Catalog,
) -> Result<Match> {
    let resolution = match step.entity.kind {
        EntityKind::CustomObjectType => {
            let object = source
                .object_by_key(&step.entity.key)
                .ok_or_else(|| anyhow::anyhow!("{} missing from source catalog", step.entity))?;
            resolver::resolve_object(object, destination)?
        }
        EntityKind::TicketField => {
            let field = source
                .field_by_key(&step.entity.key)
                .ok_or_else(|| anyhow::anyhow!("{} missing from source catalog", step.entity))?;
            resolver::resolve_field(field, destination)?
        }
    };
    Ok(resolution)
}
