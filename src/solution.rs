//! Format detection and the outer merge entry point
//!
//! [`merge_contents`] parses both solutions, runs the engine for their
//! format and serializes the result. [`try_merge`] wraps it for callers that
//! must never fail: the error is logged and the caller keeps the base
//! content.

use std::path::{Path, PathBuf};

use log::error;

use crate::error::{Error, Result};
use crate::settings::MergeSettings;
use crate::{legacy, path, xml};

/// The two solution file dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionFormat {
    /// Line-based `.sln`
    Legacy,
    /// XML `.slnx`
    Xml,
}

impl SolutionFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let name = path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path);
        match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            Some(ext) if ext == "sln" => Ok(SolutionFormat::Legacy),
            Some(ext) if ext == "slnx" => Ok(SolutionFormat::Xml),
            _ => Err(Error::UnsupportedFormat {
                path: path.to_string(),
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SolutionFormat::Legacy => "sln",
            SolutionFormat::Xml => "slnx",
        }
    }
}

/// Merge overlay content into base content and return the merged text.
pub fn merge_contents(
    base_path: &str,
    base_content: &str,
    overlay_path: &str,
    overlay_content: &str,
    settings: &MergeSettings,
) -> Result<String> {
    let format = SolutionFormat::from_path(base_path)?;
    if SolutionFormat::from_path(overlay_path)? != format {
        return Err(Error::UnsupportedFormat {
            path: overlay_path.to_string(),
        });
    }

    match format {
        SolutionFormat::Legacy => {
            let base = legacy::SolutionDocument::parse(base_path, base_content)?;
            let overlay = legacy::SolutionDocument::parse(overlay_path, overlay_content)?;
            Ok(legacy::merge::merge(&base, &overlay, settings)?.to_file_content())
        }
        SolutionFormat::Xml => {
            let base = xml::SolutionDocument::parse(base_path, base_content)?;
            let overlay = xml::SolutionDocument::parse(overlay_path, overlay_content)?;
            xml::merge::merge(&base, &overlay, settings)?.to_xml_string()
        }
    }
}

/// Like [`merge_contents`], but logs the failure and returns `None`.
pub fn try_merge(
    base_path: &str,
    base_content: &str,
    overlay_path: &str,
    overlay_content: &str,
    settings: &MergeSettings,
) -> Option<String> {
    match merge_contents(base_path, base_content, overlay_path, overlay_content, settings) {
        Ok(merged) => Some(merged),
        Err(e) => {
            error!("Failed to merge the solutions: {}", e);
            None
        }
    }
}

/// Where the overlay for `solution_path` lives: `MergeTargetSolution`
/// relative to the solution directory, else `<stem>.Merge.<ext>` next to it.
pub fn overlay_path_for(solution_path: &Path, settings: &MergeSettings) -> Result<PathBuf> {
    let dir = solution_path.parent().unwrap_or_else(|| Path::new(""));
    if let Some(target) = settings
        .merge_target_solution
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        let combined = path::combine(&dir.to_string_lossy(), target);
        return Ok(PathBuf::from(path::normalize_path(&combined)?));
    }

    let stem = solution_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Path {
            message: format!("'{}' has no file name", solution_path.display()),
        })?;
    let format = SolutionFormat::from_path(&solution_path.to_string_lossy())?;
    Ok(dir.join(format!("{}.Merge.{}", stem, format.extension())))
}
