//! Merge settings
//!
//! Settings control how an overlay solution is merged into a base solution:
//! which solution folders to declare, which projects to nest under them and
//! how to resolve project conflicts.
//!
//! ## Sources
//!
//! Settings normally live next to the solution as
//! `<name>.<sln|slnx>.mergesettings`, an XML document:
//!
//! ```xml
//! <SlnMergeSettings>
//!   <ProjectConflictResolution>PreserveOverlay</ProjectConflictResolution>
//!   <SolutionFolders>
//!     <SolutionFolder FolderPath="Tools" />
//!   </SolutionFolders>
//!   <NestedProjects>
//!     <NestedProject ProjectName="MyTool*" FolderPath="Tools" />
//!   </NestedProjects>
//! </SlnMergeSettings>
//! ```
//!
//! The same schema is also accepted as YAML (`.yaml` / `.yml`), using the
//! same PascalCase field names.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};
use xot::{Node, Value, Xot};

use crate::error::{Error, Result};

/// How to resolve two projects that claim the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectConflictResolution {
    /// Keep the project from the generated (base) solution.
    #[default]
    PreserveUnity,
    /// Keep the project from the overlay solution.
    PreserveOverlay,
    /// Keep both projects.
    PreserveAll,
}

impl FromStr for ProjectConflictResolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "PreserveUnity" => Ok(Self::PreserveUnity),
            "PreserveOverlay" => Ok(Self::PreserveOverlay),
            "PreserveAll" => Ok(Self::PreserveAll),
            other => Err(Error::Settings {
                message: format!("unknown ProjectConflictResolution '{}'", other),
            }),
        }
    }
}

/// What to do when a nested-project rule names something that is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectMergeBehavior {
    /// Log at debug level and skip the rule.
    #[default]
    None,
    /// Fail the merge.
    ErrorIfProjectOrFolderDoesNotExist,
}

impl FromStr for ProjectMergeBehavior {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "None" | "" => Ok(Self::None),
            "ErrorIfProjectOrFolderDoesNotExist" => Ok(Self::ErrorIfProjectOrFolderDoesNotExist),
            other => Err(Error::Settings {
                message: format!("unknown ProjectMergeBehavior '{}'", other),
            }),
        }
    }
}

/// A solution folder that may be created during the merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SolutionFolder {
    pub folder_path: String,
    /// GUID used when the folder is created in a `.sln` solution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

/// Place every project matching a name (or a GUID) into a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NestedProject {
    /// Project name; `*` and `?` wildcards are allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_guid: Option<String>,
}

impl NestedProject {
    /// Name used in log messages and errors for the project side of the rule.
    pub fn project_label(&self) -> &str {
        non_blank(&self.project_name)
            .or_else(|| non_blank(&self.project_guid))
            .unwrap_or("")
    }

    /// Name used in log messages and errors for the folder side of the rule.
    pub fn folder_label(&self) -> &str {
        non_blank(&self.folder_path)
            .or_else(|| non_blank(&self.folder_guid))
            .unwrap_or("")
    }
}

/// Returns the value when it is present and not whitespace-only.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Settings for one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MergeSettings {
    pub disabled: bool,
    pub solution_folders: Vec<SolutionFolder>,
    pub nested_projects: Vec<NestedProject>,
    pub project_conflict_resolution: ProjectConflictResolution,
    pub project_merge_behavior: ProjectMergeBehavior,
    /// Overlay solution path, relative to the solution directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_target_solution: Option<String>,
}

impl MergeSettings {
    /// Check every entry before any document is touched.
    pub fn validate(&self) -> Result<()> {
        for folder in &self.solution_folders {
            if folder.folder_path.trim().is_empty() {
                return Err(Error::Settings {
                    message: "SolutionFolder requires a FolderPath".to_string(),
                });
            }
        }
        for nested in &self.nested_projects {
            if non_blank(&nested.project_name).is_none() && non_blank(&nested.project_guid).is_none() {
                return Err(Error::Settings {
                    message: "NestedProject requires a ProjectName or ProjectGuid".to_string(),
                });
            }
            if non_blank(&nested.folder_path).is_none() && non_blank(&nested.folder_guid).is_none() {
                return Err(Error::Settings {
                    message: format!(
                        "NestedProject '{}' requires a FolderPath or FolderGuid",
                        nested.project_label()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Parse settings from YAML.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a `.mergesettings` XML document.
    pub fn from_xml_str(content: &str) -> Result<Self> {
        let mut xot = Xot::new();
        let doc = xot.parse(content).map_err(|e| Error::Settings {
            message: format!("invalid settings XML: {}", e),
        })?;
        let root = first_element(&xot, doc).ok_or_else(|| Error::Settings {
            message: "settings document has no root element".to_string(),
        })?;
        if element_name(&xot, root) != Some("SlnMergeSettings") {
            return Err(Error::Settings {
                message: format!(
                    "expected <SlnMergeSettings> root, found <{}>",
                    element_name(&xot, root).unwrap_or_default()
                ),
            });
        }

        let mut settings = MergeSettings::default();
        for child in xot.children(root) {
            let Some(name) = element_name(&xot, child) else {
                continue;
            };
            match name {
                "Disabled" => {
                    settings.disabled = text_of(&xot, child).trim().eq_ignore_ascii_case("true");
                }
                "ProjectConflictResolution" => {
                    settings.project_conflict_resolution = text_of(&xot, child).parse()?;
                }
                "ProjectMergeBehavior" => {
                    settings.project_merge_behavior = text_of(&xot, child).parse()?;
                }
                "MergeTargetSolution" => {
                    let target = text_of(&xot, child).trim().to_string();
                    settings.merge_target_solution = (!target.is_empty()).then_some(target);
                }
                "SolutionFolders" => {
                    for item in xot.children(child) {
                        if element_name(&xot, item) != Some("SolutionFolder") {
                            continue;
                        }
                        settings.solution_folders.push(SolutionFolder {
                            folder_path: attribute(&xot, item, "FolderPath").unwrap_or_default(),
                            guid: attribute(&xot, item, "Guid"),
                        });
                    }
                }
                "NestedProjects" => {
                    for item in xot.children(child) {
                        if element_name(&xot, item) != Some("NestedProject") {
                            continue;
                        }
                        settings.nested_projects.push(NestedProject {
                            project_name: attribute(&xot, item, "ProjectName"),
                            project_guid: attribute(&xot, item, "ProjectGuid"),
                            folder_path: attribute(&xot, item, "FolderPath"),
                            folder_guid: attribute(&xot, item, "FolderGuid"),
                        });
                    }
                }
                other => debug!("Ignoring unknown settings element <{}>", other),
            }
        }

        Ok(settings)
    }

    /// Load settings from a file; `.yaml`/`.yml` is YAML, anything else XML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_xml_str(&content),
        }
    }

    /// Find and load the settings file belonging to `solution_path`.
    ///
    /// Looks for `<stem>.sln.mergesettings` / `<stem>.slnx.mergesettings`
    /// next to the solution, the solution's own extension first.
    pub fn discover(solution_path: &Path) -> Result<Option<(PathBuf, Self)>> {
        let Some(stem) = solution_path.file_stem().and_then(|s| s.to_str()) else {
            return Ok(None);
        };
        let dir = solution_path.parent().unwrap_or_else(|| Path::new(""));
        let is_slnx = solution_path.extension().and_then(|e| e.to_str()) == Some("slnx");
        let (own, alternative) = if is_slnx { ("slnx", "sln") } else { ("sln", "slnx") };

        for ext in [own, alternative] {
            let candidate = dir.join(format!("{}.{}.mergesettings", stem, ext));
            if candidate.is_file() {
                debug!("Using merge settings {}", candidate.display());
                let settings = Self::load(&candidate)?;
                return Ok(Some((candidate, settings)));
            }
        }
        Ok(None)
    }
}

fn first_element(xot: &Xot, node: Node) -> Option<Node> {
    xot.children(node)
        .find(|&child| matches!(xot.value(child), Value::Element(_)))
}

fn element_name(xot: &Xot, node: Node) -> Option<&str> {
    match xot.value(node) {
        Value::Element(element) => Some(xot.local_name_str(element.name())),
        _ => None,
    }
}

fn text_of(xot: &Xot, node: Node) -> String {
    let mut text = String::new();
    for child in xot.children(node) {
        if let Value::Text(t) = xot.value(child) {
            text.push_str(t.get());
        }
    }
    text
}

fn attribute(xot: &Xot, node: Node, name: &str) -> Option<String> {
    xot.attributes(node)
        .iter()
        .find(|(attr_name, _)| xot.local_name_str(*attr_name) == name)
        .map(|(_, value)| value.to_string())
}
