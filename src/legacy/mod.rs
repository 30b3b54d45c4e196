//! Line-based `.sln` solutions
//!
//! ## Modules
//!
//! - [`model`]: lossless document tree and the order-preserving project table
//! - [`parser`] / [`writer`]: text to tree and back, byte-exact for untouched input
//! - [`merge`]: overlay merge, global section union and solution-folder nesting
//! - [`diff`]: differences between a merged solution and its overlay

pub mod diff;
pub mod merge;
pub mod model;
pub mod parser;
pub mod writer;

pub use model::{Global, LineEnding, Project, ProjectTable, Section, SolutionDocument};

use crate::error::Result;

impl SolutionDocument {
    /// Parse `.sln` content; `path` anchors relative project paths.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        parser::parse(path, content)
    }

    pub fn to_file_content(&self) -> String {
        writer::write(self)
    }
}
