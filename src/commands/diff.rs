//! # Diff Command Implementation
//!
//! This module implements the `diff` subcommand, which compares a merged
//! `.sln` with the overlay it was built from.
//!
//! ## Functionality
//!
//! - **Additions**: projects only in the merged solution. Generated Unity
//!   projects are left out, since they come from the build tool.
//! - **Deletions**: projects only in the overlay.
//! - **Updates**: projects in both whose location, name or sections differ.
//!
//! Output is a listing by GUID, or JSON with `--json`. This command is
//! read-only.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use slnmerge::legacy::diff::{diff, Differences, FsFileProvider};
use slnmerge::legacy::SolutionDocument;
use slnmerge::solution::SolutionFormat;

/// Show how a merged .sln differs from its overlay
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// The merged solution file
    #[arg(value_name = "SOLUTION")]
    pub solution: PathBuf,

    /// The overlay solution file
    #[arg(value_name = "OVERLAY")]
    pub overlay: PathBuf,

    /// Print the differences as JSON
    #[arg(long)]
    pub json: bool,
}

fn load(path: &PathBuf) -> Result<SolutionDocument> {
    let display = path.to_string_lossy();
    if SolutionFormat::from_path(&display)? != SolutionFormat::Legacy {
        bail!("diff only supports .sln solutions: {}", path.display());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    SolutionDocument::parse(&display, &content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn render(differences: &Differences) -> String {
    if differences.is_empty() {
        return "No differences.".to_string();
    }

    let mut out = String::new();
    for (title, marker, guids) in [
        ("Added projects:", '+', &differences.additions),
        ("Updated projects:", '~', &differences.updates),
        ("Deleted projects:", '-', &differences.deletions),
    ] {
        if guids.is_empty() {
            continue;
        }
        out.push_str(title);
        out.push('\n');
        for guid in guids {
            out.push_str(&format!("  {} {}\n", marker, guid));
        }
    }
    out.push_str(&format!(
        "Summary: {} added, {} updated, {} deleted",
        differences.additions.len(),
        differences.updates.len(),
        differences.deletions.len()
    ));
    out
}

/// Execute the `diff` command.
pub fn execute(args: DiffArgs) -> Result<()> {
    let merged = load(&args.solution)?;
    let overlay = load(&args.overlay)?;

    let differences = diff(&merged, &overlay, &FsFileProvider)
        .context("Failed to compare the solutions")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&differences)?);
    } else {
        println!("{}", render(&differences));
    }
    Ok(())
}
