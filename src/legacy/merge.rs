//! Merge engine for line-based `.sln` solutions
//!
//! The merge runs in three passes over a clone of the base document:
//!
//! 1. **Projects**: overlay projects are appended with their paths rebased
//!    onto the base solution directory. Projects sharing a display name are
//!    resolved by [`ProjectConflictResolution`].
//! 2. **Global sections**: overlay sections are unioned into the base;
//!    overlay values win per key.
//! 3. **Solution folders**: every nested-project rule is resolved against a
//!    flattened folder tree, creating missing folders from their declarations,
//!    and recorded in the `NestedProjects` global section.
//!
//! The inputs are never mutated; an error aborts the whole merge.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, info};
use uuid::Uuid;

use super::model::{Global, Project, SolutionDocument, SOLUTION_ITEMS};
use crate::error::{Error, Result, TargetKind};
use crate::path::{directory_name, make_absolute, make_relative, normalize_path, WildcardPattern};
use crate::settings::{
    non_blank, MergeSettings, NestedProject, ProjectConflictResolution, ProjectMergeBehavior,
};

/// Merge `overlay` into a copy of `base`.
pub fn merge(
    base: &SolutionDocument,
    overlay: &SolutionDocument,
    settings: &MergeSettings,
) -> Result<SolutionDocument> {
    settings.validate()?;
    debug!(
        "Merge solution: Base={}; Overlay={}",
        base.path, overlay.path
    );

    let mut merged = base.clone();
    merge_projects(&mut merged, overlay, settings.project_conflict_resolution)?;
    merge_global_sections(&mut merged, overlay);
    nest_projects(&mut merged, settings)?;
    Ok(merged)
}

fn merge_projects(
    merged: &mut SolutionDocument,
    overlay: &SolutionDocument,
    policy: ProjectConflictResolution,
) -> Result<()> {
    let base_path = normalize_path(&merged.path)?;
    let overlay_path = normalize_path(&overlay.path)?;
    let overlay_dir = directory_name(&overlay_path);

    for project in overlay.projects.iter() {
        if merged.projects.contains(&project.guid) {
            deduplicate_by_name(merged, project, policy);
            continue;
        }

        let conflicting = merged
            .find_project_by_name(&project.name)
            .map(|p| p.guid.clone());
        if let Some(existing) = conflicting {
            match policy {
                ProjectConflictResolution::PreserveOverlay => {
                    info!(
                        "Project '{}' {} replaced by overlay project {}",
                        project.name, existing, project.guid
                    );
                    merged.projects.remove(&existing);
                }
                ProjectConflictResolution::PreserveUnity => {
                    info!(
                        "Project '{}' {} from the overlay skipped; keeping {}",
                        project.name, project.guid, existing
                    );
                    continue;
                }
                ProjectConflictResolution::PreserveAll => {
                    info!(
                        "Project '{}' exists as {} and {}; keeping both",
                        project.name, existing, project.guid
                    );
                }
            }
        }

        let mut incoming = project.clone();
        incoming.leading.clear();
        rebase_project(&mut incoming, overlay_dir, &base_path)?;
        merged.projects.insert(incoming);
    }

    Ok(())
}

/// The overlay GUID already exists in the base. The existing entry stays as
/// it is; only other projects with the same display name are resolved.
fn deduplicate_by_name(
    merged: &mut SolutionDocument,
    project: &Project,
    policy: ProjectConflictResolution,
) {
    let same_name: Vec<String> = merged
        .projects
        .iter()
        .filter(|p| p.name == project.name)
        .map(|p| p.guid.clone())
        .collect();
    if same_name.len() < 2 {
        return;
    }

    match policy {
        ProjectConflictResolution::PreserveOverlay => {
            for guid in same_name.iter().filter(|g| **g != project.guid) {
                info!(
                    "Project '{}' {} removed in favor of overlay project {}",
                    project.name, guid, project.guid
                );
                merged.projects.remove(guid);
            }
        }
        ProjectConflictResolution::PreserveUnity => {
            info!(
                "Project '{}' {} from the overlay removed; keeping the generated project",
                project.name, project.guid
            );
            merged.projects.remove(&project.guid);
        }
        ProjectConflictResolution::PreserveAll => {
            info!(
                "Project '{}' exists {} times; keeping all",
                project.name,
                same_name.len()
            );
        }
    }
}

/// Re-express an overlay project's paths relative to the base solution.
fn rebase_project(project: &mut Project, overlay_dir: &str, base_path: &str) -> Result<()> {
    let rebase = |path: &str| -> Result<String> {
        Ok(make_relative(base_path, &make_absolute(overlay_dir, path)?))
    };

    if !project.is_folder() {
        project.path = rebase(&project.path)?;
        return Ok(());
    }

    for section in project.sections.values_mut() {
        if section.category != SOLUTION_ITEMS {
            continue;
        }
        let mut entries = IndexMap::with_capacity(section.entries.len());
        for (key, value) in &section.entries {
            entries.insert(rebase(key)?, rebase(value)?);
        }
        section.entries = entries;
    }
    Ok(())
}

fn merge_global_sections(merged: &mut SolutionDocument, overlay: &SolutionDocument) {
    let Some(overlay_global) = &overlay.global else {
        return;
    };
    let global = merged.global.get_or_insert_with(Global::default);

    for (key, section) in &overlay_global.sections {
        match global.sections.get_mut(key) {
            Some(target) => {
                for (k, v) in &section.entries {
                    target.entries.insert(k.clone(), v.clone());
                }
                let end = target.entries.len();
                target
                    .trivia
                    .extend(section.trivia.iter().map(|(_, line)| (end, line.clone())));
            }
            None => {
                global.sections.insert(key.clone(), section.clone());
            }
        }
    }
}

/// A solution entry seen through the `NestedProjects` hierarchy.
#[derive(Debug, Clone)]
struct TreeNode {
    guid: String,
    is_folder: bool,
}

/// Every project keyed by its lower-cased `Parent/Child` path.
struct SolutionTree {
    nodes: HashMap<String, TreeNode>,
}

impl SolutionTree {
    fn build(doc: &SolutionDocument) -> Self {
        let by_guid: HashMap<String, &Project> = doc
            .projects
            .iter()
            .map(|p| (p.guid.to_lowercase(), p))
            .collect();

        let mut parents: HashMap<String, String> = HashMap::new();
        if let Some(section) = doc.global.as_ref().and_then(Global::nested_projects) {
            for (child, parent) in &section.entries {
                let (child, parent) = (child.to_lowercase(), parent.to_lowercase());
                if by_guid.contains_key(&child) && by_guid.contains_key(&parent) {
                    parents.insert(child, parent);
                }
            }
        }

        let mut nodes = HashMap::new();
        for project in doc.projects.iter() {
            let mut names = vec![project.name.as_str()];
            let mut visited = HashSet::new();
            let mut current = project.guid.to_lowercase();
            visited.insert(current.clone());
            while let Some(parent) = parents.get(&current) {
                if !visited.insert(parent.clone()) {
                    break;
                }
                if let Some(p) = by_guid.get(parent) {
                    names.push(p.name.as_str());
                }
                current = parent.clone();
            }
            names.reverse();
            nodes.insert(
                names.join("/").to_lowercase(),
                TreeNode {
                    guid: project.guid.clone(),
                    is_folder: project.is_folder(),
                },
            );
        }

        Self { nodes }
    }

    fn get(&self, path: &str) -> Option<&TreeNode> {
        self.nodes.get(&path.to_lowercase())
    }
}

/// `a\b/` → `a/b`
fn tree_path(folder_path: &str) -> String {
    folder_path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn not_a_folder(path: &str) -> Error {
    Error::Conflict {
        path: path.to_string(),
        message: "the path is not a solution folder".to_string(),
    }
}

fn missing_target(kind: TargetKind, name: &str, behavior: ProjectMergeBehavior) -> Result<()> {
    if behavior == ProjectMergeBehavior::ErrorIfProjectOrFolderDoesNotExist {
        return Err(Error::MissingTarget {
            kind,
            name: name.to_string(),
        });
    }
    debug!("{} '{}' does not exist in the solution; skipped", kind, name);
    Ok(())
}

/// GUID for a folder about to be created at `level`.
fn declared_folder_guid(settings: &MergeSettings, level: &str) -> Result<String> {
    let declaration = settings
        .solution_folders
        .iter()
        .find(|f| tree_path(&f.folder_path).eq_ignore_ascii_case(level))
        .ok_or_else(|| Error::MissingFolderDefinition {
            path: level.to_string(),
        })?;
    Ok(match non_blank(&declaration.guid) {
        Some(guid) => guid.trim().to_string(),
        None => format!("{{{}}}", Uuid::new_v4()).to_uppercase(),
    })
}

fn nest_projects(merged: &mut SolutionDocument, settings: &MergeSettings) -> Result<()> {
    if settings.nested_projects.is_empty() {
        return Ok(());
    }

    merged
        .global
        .get_or_insert_with(Global::default)
        .nested_projects_mut();
    let mut tree = SolutionTree::build(merged);

    let mut assignments: IndexMap<String, String> = IndexMap::new();
    for rule in &settings.nested_projects {
        let folder = resolve_folder(merged, &mut tree, rule, settings)?;
        let projects = resolve_projects(merged, rule)?;

        let Some(folder) = folder else {
            missing_target(
                TargetKind::Folder,
                rule.folder_label(),
                settings.project_merge_behavior,
            )?;
            continue;
        };
        if projects.is_empty() {
            missing_target(
                TargetKind::Project,
                rule.project_label(),
                settings.project_merge_behavior,
            )?;
            continue;
        }

        for guid in projects {
            if guid.eq_ignore_ascii_case(&folder) {
                continue;
            }
            assignments.insert(guid, folder.clone());
        }
    }

    if let Some(global) = merged.global.as_mut() {
        let section = global.nested_projects_mut();
        for (child, parent) in assignments {
            section.entries.insert(child, parent);
        }
    }
    Ok(())
}

fn resolve_projects(merged: &SolutionDocument, rule: &NestedProject) -> Result<Vec<String>> {
    if let Some(name) = non_blank(&rule.project_name) {
        let pattern = WildcardPattern::new(name)?;
        return Ok(merged
            .projects
            .iter()
            .filter(|p| pattern.is_match(&p.name))
            .map(|p| p.guid.clone())
            .collect());
    }
    Ok(non_blank(&rule.project_guid)
        .filter(|guid| merged.projects.contains(guid))
        .map(|guid| vec![guid.to_string()])
        .unwrap_or_default())
}

/// Find the rule's folder, creating missing levels of a folder path.
fn resolve_folder(
    merged: &mut SolutionDocument,
    tree: &mut SolutionTree,
    rule: &NestedProject,
    settings: &MergeSettings,
) -> Result<Option<String>> {
    let Some(folder_path) = non_blank(&rule.folder_path) else {
        let Some(guid) = non_blank(&rule.folder_guid) else {
            return Ok(None);
        };
        return match merged.projects.get(guid) {
            Some(p) if p.is_folder() => Ok(Some(p.guid.clone())),
            Some(_) => Err(not_a_folder(guid)),
            None => Ok(None),
        };
    };

    let path = tree_path(folder_path);
    if let Some(node) = tree.get(&path) {
        if !node.is_folder {
            return Err(not_a_folder(&path));
        }
        return Ok(Some(node.guid.clone()));
    }

    let parts: Vec<&str> = path.split('/').collect();
    let mut created = None;
    for i in 0..parts.len() {
        let level = parts[..=i].join("/");
        if let Some(node) = tree.get(&level) {
            if !node.is_folder {
                return Err(not_a_folder(&level));
            }
            continue;
        }

        let guid = declared_folder_guid(settings, &level)?;
        if !merged.projects.insert(Project::new_folder(parts[i], &guid)) {
            return Err(Error::Conflict {
                path: level,
                message: format!("folder GUID {} is already used by another project", guid),
            });
        }
        debug!("Created solution folder '{}' {}", level, guid);

        if i > 0 {
            let parent = parts[..i].join("/");
            if let (Some(parent), Some(global)) = (tree.get(&parent), merged.global.as_mut()) {
                global
                    .nested_projects_mut()
                    .entries
                    .insert(guid.clone(), parent.guid.clone());
            }
        }

        *tree = SolutionTree::build(merged);
        created = Some(guid);
    }

    Ok(created)
}
