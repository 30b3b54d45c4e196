//! # CLI Command Implementations
//!
//! Each subcommand of the `slnmerge` command-line tool lives in its own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic, calling into the `slnmerge` library.

pub mod diff;
pub mod merge;
