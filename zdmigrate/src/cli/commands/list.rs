//! List command: enumerate one account's fields or custom object types

use anyhow::Result;
use colored::*;

use crate::api::ZendeskClient;
use crate::cli::{AccountSide, EntityListing};
use crate::config::Config;
use crate::migrate::read_catalog;

pub async fn handle_list_command(
    config: &Config,
    account: AccountSide,
    entities: EntityListing,
) -> Result<()> {
    let account_config = match account {
        AccountSide::Source => &config.source,
        AccountSide::Destination => &config.destination,
    };

    let client = ZendeskClient::new(account_config)?;
    let catalog = read_catalog(&client).await?;

    match entities {
        EntityListing::Fields => {
            println!(
                "{} ticket fields in {}",
                catalog.fields.len(),
                account_config.subdomain.cyan()
            );
            for field in &catalog.fields {
                let kind = if field.field_type.is_system() {
                    "system".dimmed()
                } else {
                    "custom".green()
                };
                println!(
                    "  #{:<16} {:<8} {:<12} {} {}",
                    field.id,
                    kind,
                    field.field_type.as_wire(),
                    field.key.bold(),
                    field.title.dimmed()
                );
            }
        }
        EntityListing::Objects => {
            println!(
                "{} custom object types in {}",
                catalog.object_types.len(),
                account_config.subdomain.cyan()
            );
            for object in &catalog.object_types {
                println!(
                    "  #{:<16} {} {}",
                    object.id,
                    object.key.bold(),
                    object.title.dimmed()
                );
            }
        }
    }

    Ok(())
}
