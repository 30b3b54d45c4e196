//! XML `.slnx` solutions
//!
//! ## Modules
//!
//! - [`model`]: keyed element tree and identity-based child/attribute merging
//! - [`parser`] / [`writer`]: `xot`-backed reading and indented writing
//! - [`merge`]: overlay merge with path rebasing, conflicts and folder nesting

pub mod merge;
pub mod model;
pub mod parser;
pub mod writer;

pub use model::{Element, KeyedElement, MergeStrategy, Node, SolutionDocument, SolutionElement};

use crate::error::Result;

impl SolutionDocument {
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        parser::parse(path, content)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        writer::write(self)
    }
}
