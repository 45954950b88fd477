//! CLI argument definitions for uso.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "uso")]
#[command(about = "osu! chart and profile synchronizer", version)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", default_value = "uso.toml")]
    pub config: PathBuf,

    /// osu! API key (overrides the config file)
    #[arg(long, env = "USO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show a chart, importing it if needed
    Chart {
        /// Chart (beatmap) id
        id: u32,
        /// Check the service for a newer revision
        #[arg(short, long)]
        force: bool,
    },
    /// Import several charts, skipping those already stored
    ImportCharts {
        /// Chart (beatmap) ids
        #[arg(required = true, num_args = 1..)]
        ids: Vec<u32>,
    },
    /// Show a profile, importing or refreshing it if needed
    Profile {
        /// User id
        id: u32,
        /// Refresh even if the stored profile is recent
        #[arg(short, long)]
        force: bool,
    },
    /// Show chart cache status
    Cache,
}
