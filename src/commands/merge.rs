//! # Merge Command Implementation
//!
//! This module implements the `merge` subcommand, the command-line form of the
//! merge entry point.
//!
//! ## Functionality
//!
//! 1. **Settings**: `--settings`, else `<name>.<sln|slnx>.mergesettings` next
//!    to the solution, else defaults. Disabled settings end the command.
//! 2. **Overlay**: `--overlay`, else `MergeTargetSolution`, else
//!    `<name>.Merge.<ext>`. A missing overlay is a warning, not an error.
//! 3. **Merge**: both solutions are merged in memory. On failure the solution
//!    file is left untouched.
//! 4. **Output**: the result replaces the solution (or goes to `--output`,
//!    or to stdout with `--dry-run`).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::{debug, info, warn};

use slnmerge::settings::MergeSettings;
use slnmerge::solution::{merge_contents, overlay_path_for};

/// Merge the overlay solution into a solution file
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// The generated solution file (.sln or .slnx)
    #[arg(value_name = "SOLUTION")]
    pub solution: PathBuf,

    /// The overlay solution to merge in.
    ///
    /// Defaults to MergeTargetSolution from the settings, or
    /// `<name>.Merge.<ext>` next to SOLUTION.
    #[arg(long, value_name = "PATH")]
    pub overlay: Option<PathBuf>,

    /// Settings file (.mergesettings XML, or YAML with a .yaml/.yml extension).
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Where to write the merged solution. Defaults to SOLUTION.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the merged solution instead of writing it.
    #[arg(long)]
    pub dry_run: bool,
}

fn load_settings(args: &MergeArgs) -> Result<MergeSettings> {
    if let Some(path) = &args.settings {
        return MergeSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()));
    }
    match MergeSettings::discover(&args.solution)
        .with_context(|| format!("Failed to load settings for {}", args.solution.display()))?
    {
        Some((path, settings)) => {
            debug!("Using SlnMerge settings: {}", path.display());
            Ok(settings)
        }
        None => {
            debug!("No SlnMerge settings found; using defaults");
            Ok(MergeSettings::default())
        }
    }
}

/// Execute the `merge` command.
pub fn execute(args: MergeArgs) -> Result<()> {
    let settings = load_settings(&args)?;
    if settings.disabled {
        info!("SlnMerge is currently disabled.");
        return Ok(());
    }

    let overlay_path = match &args.overlay {
        Some(path) => path.clone(),
        None => overlay_path_for(&args.solution, &settings)?,
    };
    if !overlay_path.is_file() {
        warn!(
            "Cannot load the solution file to merge. skipped: {}",
            overlay_path.display()
        );
        return Ok(());
    }

    let base_content = fs::read_to_string(&args.solution)
        .with_context(|| format!("Failed to read {}", args.solution.display()))?;
    let overlay_content = fs::read_to_string(&overlay_path)
        .with_context(|| format!("Failed to read {}", overlay_path.display()))?;

    let merged = merge_contents(
        &args.solution.to_string_lossy(),
        &base_content,
        &overlay_path.to_string_lossy(),
        &overlay_content,
        &settings,
    )
    .with_context(|| {
        format!(
            "Failed to merge {} into {}",
            overlay_path.display(),
            args.solution.display()
        )
    })?;

    if args.dry_run {
        println!("{}", merged);
        return Ok(());
    }

    let output = args.output.as_ref().unwrap_or(&args.solution);
    fs::write(output, merged).with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        "Merged {} into {}",
        overlay_path.display(),
        output.display()
    );
    Ok(())
}
