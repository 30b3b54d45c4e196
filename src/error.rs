//! # Error Handling
//!
//! This module defines the centralized error type for `slnmerge`. It uses the
//! `thiserror` library to build a single `Error` enum that covers every
//! failure mode of parsing, settings validation and merging.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant corresponds to one class of
//!   failure and carries the context needed to explain it.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! The variants follow the error taxonomy of the merge engines:
//!
//! - Structural parse errors in the line-based `.sln` format.
//! - Malformed `.slnx` / settings XML.
//! - Settings validation errors, raised before any tree is touched.
//! - Conflict-resolution errors that a policy cannot resolve.
//! - Missing nested-project targets (only fatal when the behavior flag says so).
//! - Missing solution-folder definitions (always fatal).
//! - Path, I/O, YAML and regex errors from the surrounding plumbing.
//!
//! A merge either fully succeeds or returns one of these errors; partially
//! mutated output is never handed back to the caller.

use thiserror::Error;

/// Main error type for slnmerge operations
#[derive(Error, Debug)]
pub enum Error {
    /// A begin/end marker of the line-based solution format appeared in the
    /// wrong container, or a structural line could not be decoded.
    #[error("Solution parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// An XML document (solution or settings) could not be read.
    #[error("XML error: {message}")]
    Xml { message: String },

    /// A settings entry is missing a required field or has an invalid value.
    #[error("Settings error: {message}")]
    Settings { message: String },

    /// Two entities collide and the configured policy has no resolution for it.
    #[error("Project conflict for '{path}': {message}")]
    Conflict { path: String, message: String },

    /// A nested-project rule points at a project or folder that does not exist.
    #[error("{kind} '{name}' does not exist in the solution")]
    MissingTarget { kind: TargetKind, name: String },

    /// A solution folder has to be created but no definition provides it.
    #[error("Solution folder '{path}' is not declared in the solution folder definitions")]
    MissingFolderDefinition { path: String },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// The file extension does not name a supported solution format, or the
    /// two documents of a merge use different formats.
    #[error("Unsupported solution format: {path}")]
    UnsupportedFormat { path: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// What a nested-project rule failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Project,
    Folder,
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetKind::Project => write!(f, "Project"),
            TargetKind::Folder => write!(f, "Solution folder"),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
