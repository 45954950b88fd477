mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("uso=info,uso_core=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = commands::load_config(&args.config, args.api_key)?;

    match args.command {
        Command::Chart { id, force } => commands::chart::run(&config, id, force),
        Command::ImportCharts { ids } => commands::import_charts::run(&config, &ids),
        Command::Profile { id, force } => commands::profile::run(&config, id, force),
        Command::Cache => commands::cache::run(&config),
    }
}
