//! Merge engine for `.slnx` solutions
//!
//! ## Steps
//!
//! 1. Validate the settings.
//! 2. Rebase every overlay project, file and build-dependency path onto the
//!    base solution directory.
//! 3. Resolve projects present in both solutions (same path) with the
//!    conflict policy.
//! 4. Add the declared solution folders.
//! 5. Merge the overlay's top-level children: folders and configurations by
//!    identity, everything else appended. Prefixed namespace declarations
//!    on the overlay root are carried over so foreign markup stays bound.
//! 6. Move the projects named by each nested-project rule into its folder.

use log::{debug, info};

use super::model::{
    merge_attributes, KeyedElement, MergeStrategy, Node, SolutionDocument,
};
use crate::error::{Error, Result, TargetKind};
use crate::path::{directory_name, make_absolute, make_relative, normalize_path, WildcardPattern};
use crate::settings::{non_blank, MergeSettings, ProjectConflictResolution, ProjectMergeBehavior};

/// `Tools`, `/Tools`, `\Tools\` → `/Tools/`
pub fn normalize_solution_folder_path(path: &str) -> String {
    format!("/{}/", path.trim_matches(|c: char| c == '/' || c == '\\'))
}

fn validate(settings: &MergeSettings) -> Result<()> {
    settings.validate()?;
    for rule in &settings.nested_projects {
        if non_blank(&rule.project_name).is_none() {
            return Err(Error::Settings {
                message: format!(
                    "NestedProject '{}' requires a ProjectName for .slnx solutions",
                    rule.project_label()
                ),
            });
        }
        if non_blank(&rule.folder_path).is_none() {
            return Err(Error::Settings {
                message: format!(
                    "NestedProject '{}' requires a FolderPath for .slnx solutions",
                    rule.project_label()
                ),
            });
        }
    }
    Ok(())
}

/// Merge `overlay` into a copy of `base`.
pub fn merge(
    base: &SolutionDocument,
    overlay: &SolutionDocument,
    settings: &MergeSettings,
) -> Result<SolutionDocument> {
    validate(settings)?;
    debug!(
        "Merge solution: Base={}; Overlay={}",
        base.path, overlay.path
    );

    let strategy = MergeStrategy::from(settings.project_conflict_resolution);
    let mut merged = base.clone();
    let mut overlay = overlay.clone();

    let base_path = normalize_path(&merged.path)?;
    let overlay_path = normalize_path(&overlay.path)?;
    let overlay_dir = directory_name(&overlay_path);
    overlay
        .root
        .rewrite_paths(|path| Ok(make_relative(&base_path, &make_absolute(overlay_dir, path)?)))?;

    resolve_conflicts(&mut merged, &mut overlay, settings.project_conflict_resolution)?;

    for folder in &settings.solution_folders {
        let name = normalize_solution_folder_path(&folder.folder_path);
        merged
            .root
            .add_or_merge_folder(KeyedElement::new(name), strategy);
    }

    let prefixes: Vec<(String, String)> = overlay
        .root
        .attributes
        .iter()
        .filter(|(name, _)| name.starts_with("xmlns:"))
        .cloned()
        .collect();
    merge_attributes(&mut merged.root.attributes, &prefixes, MergeStrategy::Preserve);

    for child in std::mem::take(&mut overlay.root.children) {
        match child {
            Node::Folder(folder) => merged.root.add_or_merge_folder(folder, strategy),
            Node::Configurations(configurations) => merged
                .root
                .add_or_merge_configurations(configurations, strategy),
            other => merged.root.add_child(other),
        }
    }

    nest_projects(&mut merged, settings)?;
    Ok(merged)
}

fn resolve_conflicts(
    merged: &mut SolutionDocument,
    overlay: &mut SolutionDocument,
    policy: ProjectConflictResolution,
) -> Result<()> {
    let overlay_paths: Vec<String> = overlay.root.projects().into_keys().collect();
    for path in overlay_paths {
        if !merged.root.projects().contains_key(&path) {
            continue;
        }
        match policy {
            ProjectConflictResolution::PreserveOverlay => {
                info!("Project '{}' replaced by the overlay project", path);
                merged.root.remove_project(&path);
            }
            ProjectConflictResolution::PreserveUnity => {
                info!("Project '{}' from the overlay skipped", path);
                overlay.root.remove_project(&path);
            }
            ProjectConflictResolution::PreserveAll => {
                return Err(Error::Conflict {
                    path,
                    message: "the project exists in both solutions and PreserveAll cannot keep two projects with the same path".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn nest_projects(merged: &mut SolutionDocument, settings: &MergeSettings) -> Result<()> {
    let mut moves = Vec::with_capacity(settings.nested_projects.len());
    for rule in &settings.nested_projects {
        let (Some(name), Some(folder)) = (non_blank(&rule.project_name), non_blank(&rule.folder_path))
        else {
            continue;
        };
        let pattern = WildcardPattern::new(name)?;
        let projects = merged.root.detach_projects(&pattern);
        moves.push((name, normalize_solution_folder_path(folder), projects));
    }

    for (name, folder, projects) in moves {
        if !merged.root.has_folder(&folder) {
            return Err(Error::MissingTarget {
                kind: TargetKind::Folder,
                name: folder,
            });
        }
        if projects.is_empty() {
            if settings.project_merge_behavior
                == ProjectMergeBehavior::ErrorIfProjectOrFolderDoesNotExist
            {
                return Err(Error::MissingTarget {
                    kind: TargetKind::Project,
                    name: name.to_string(),
                });
            }
            debug!(
                "{} '{}' does not exist in the solution; skipped",
                TargetKind::Project,
                name
            );
            continue;
        }
        for project in projects {
            merged.root.add_project(project, &folder);
        }
    }
    Ok(())
}
