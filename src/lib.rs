//! # SlnMerge
//!
//! Merge an overlay solution into a generated base solution. Build tools
//! such as Unity regenerate their `.sln` / `.slnx` on every change and drop
//! anything added by hand; the overlay keeps those additions (extra
//! projects, solution items, build configurations) and is merged back in
//! after each regeneration.
//!
//! ## Quick Example
//!
//! ```
//! use slnmerge::settings::MergeSettings;
//! use slnmerge::solution::merge_contents;
//!
//! let merged = merge_contents(
//!     "/repo/Unity/App.slnx",
//!     r#"<Solution><Project Path="Assembly-CSharp.csproj" /></Solution>"#,
//!     "/repo/Unity/App.Merge.slnx",
//!     r#"<Solution><Project Path="../Server/Server.csproj" /></Solution>"#,
//!     &MergeSettings::default(),
//! )
//! .unwrap();
//! assert!(merged.contains("Server.csproj"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Legacy solutions (`legacy`)**: lossless model of the line-based `.sln`
//!   format, its merge engine and the merged-vs-overlay difference.
//! - **XML solutions (`xml`)**: keyed element tree of `.slnx`, identity-based
//!   child merging and its merge engine.
//! - **Settings (`settings`)**: conflict policy, declared solution folders and
//!   nested-project rules, loaded from `.mergesettings` files.
//! - **Paths (`path`)**: normalization, relative paths between solutions and
//!   project-name wildcards.
//! - **Entry point (`solution`)**: format detection and the never-failing
//!   `try_merge` wrapper.

pub mod error;
pub mod legacy;
pub mod path;
pub mod settings;
pub mod solution;
pub mod xml;

#[cfg(test)]
mod path_proptest;
