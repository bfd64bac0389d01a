use anyhow::Result;
use clap::Parser;

mod api;
mod cli;
mod config;
mod migrate;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Commands::Plan => cli::commands::handle_plan_command(&config).await,
        Commands::Run => cli::commands::handle_run_command(&config).await,
        Commands::List { account, entities } => {
            cli::commands::handle_list_command(&config, account, entities).await
        }
    }
}
