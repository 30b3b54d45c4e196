//! Differences between a merged solution and its overlay
//!
//! Used to find out what changed in a merged solution (for example after
//! the IDE edited it) relative to the overlay it was built from, so that
//! the changes can be written back to the overlay.

use std::collections::HashMap;

use serde::Serialize;

use super::model::{Project, SolutionDocument};
use crate::error::{Error, Result};
use crate::path::{directory_name, make_absolute, normalize_path};

/// Project type GUID that marks a generated Unity C# project.
pub const UNITY_PROJECT_MARKER: &str = "{E097FAD1-6243-4DAD-9C02-E9B9EFC3FFC1}";

/// Source of project file contents.
pub trait FileProvider {
    fn read_to_string(&self, path: &str) -> Result<String>;
}

/// Reads project files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileProvider;

impl FileProvider for FsFileProvider {
    fn read_to_string(&self, path: &str) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// In-memory project files keyed by normalized path.
#[derive(Debug, Default, Clone)]
pub struct MemoryFileProvider {
    files: HashMap<String, String>,
}

impl MemoryFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: &str, content: impl Into<String>) -> Result<()> {
        self.files.insert(normalize_path(path)?, content.into());
        Ok(())
    }
}

impl FileProvider for MemoryFileProvider {
    fn read_to_string(&self, path: &str) -> Result<String> {
        let key = normalize_path(path)?;
        self.files.get(&key).cloned().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found: {}", path),
            ))
        })
    }
}

/// Project GUIDs grouped by kind of change.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Differences {
    /// In the merged solution only, excluding generated Unity projects.
    pub additions: Vec<String>,
    /// In the overlay only.
    pub deletions: Vec<String>,
    /// In both, with a different location, name or contents.
    pub updates: Vec<String>,
}

impl Differences {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty() && self.updates.is_empty()
    }
}

fn is_unity_project(content: &str) -> bool {
    content
        .to_ascii_uppercase()
        .contains(UNITY_PROJECT_MARKER)
}

fn same_contents(a: &Project, b: &Project) -> bool {
    a.sections == b.sections && a.trivia == b.trivia
}

/// Compare `merged` against `overlay`.
pub fn diff(
    merged: &SolutionDocument,
    overlay: &SolutionDocument,
    files: &dyn FileProvider,
) -> Result<Differences> {
    let merged_path = normalize_path(&merged.path)?;
    let overlay_path = normalize_path(&overlay.path)?;
    let merged_dir = directory_name(&merged_path);
    let overlay_dir = directory_name(&overlay_path);

    let mut differences = Differences::default();

    for project in merged.projects.iter() {
        match overlay.projects.get(&project.guid) {
            None => {
                if project.is_folder() {
                    differences.additions.push(project.guid.clone());
                    continue;
                }
                let path = make_absolute(merged_dir, &project.path)?;
                if !is_unity_project(&files.read_to_string(&path)?) {
                    differences.additions.push(project.guid.clone());
                }
            }
            Some(original) => {
                let updated_path = make_absolute(merged_dir, &project.path)?;
                let original_path = make_absolute(overlay_dir, &original.path)?;
                if updated_path != original_path
                    || project.name != original.name
                    || !same_contents(project, original)
                {
                    differences.updates.push(project.guid.clone());
                }
            }
        }
    }

    differences.deletions = overlay
        .projects
        .iter()
        .filter(|p| !merged.projects.contains(&p.guid))
        .map(|p| p.guid.clone())
        .collect();

    Ok(differences)
}
