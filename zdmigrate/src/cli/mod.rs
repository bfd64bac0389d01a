//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "zdmigrate",
    version,
    about = "Migrate Zendesk ticket fields and custom object types between accounts"
)]
pub struct Cli {
    /// Path to a config file (defaults to the user config dir, then
    /// SOURCE_*/TARGET_* environment variables)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the ordered migration plan without writing anything
    Plan,
    /// Execute the migration against the destination account
    Run,
    /// List ticket fields or custom object types of one account
    List {
        #[arg(value_enum)]
        account: AccountSide,
        #[arg(value_enum, default_value_t = EntityListing::Fields)]
        entities: EntityListing,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum AccountSide {
    Source,
    Destination,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum EntityListing {
    Fields,
    Objects,
}
