//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// SlnMerge - Merge an overlay solution into a generated solution
#[derive(Parser, Debug)]
#[command(name = "slnmerge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace); defaults to RUST_LOG or info
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge the overlay solution into a solution file
    Merge(commands::merge::MergeArgs),
    /// Show how a merged .sln differs from its overlay
    Diff(commands::diff::DiffArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level.as_deref());

        match self.command {
            Commands::Merge(args) => commands::merge::execute(args),
            Commands::Diff(args) => commands::diff::execute(args),
        }
    }
}

fn init_logging(level: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder.format_timestamp(None).target(env_logger::Target::Stderr);
    // a second initialization (tests) keeps the first logger
    let _ = builder.try_init();
}
