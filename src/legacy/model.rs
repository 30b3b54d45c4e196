//! Lossless document model for line-based `.sln` files.
//!
//! The tree is `SolutionDocument → Project → ProjectSection` and
//! `SolutionDocument → Global → GlobalSection`. Lines the model does not
//! understand are kept as trivia, verbatim, next to the block they were
//! found in so an untouched document writes back byte-for-byte.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::path;

/// Project type GUID of a solution folder.
pub const FOLDER_TYPE_GUID: &str = "{2150E333-8FDC-42A3-9474-1A3956D46DE8}";

/// Category of the project section listing a solution folder's files.
pub const SOLUTION_ITEMS: &str = "SolutionItems";

/// Category and value of the global section that maps child GUIDs to folders.
pub const NESTED_PROJECTS_CATEGORY: &str = "NestedProjects";
pub const NESTED_PROJECTS_VALUE: &str = "preSolution";

/// Sections are keyed by `(category, value)`, e.g. `("NestedProjects", "preSolution")`.
pub type SectionKey = (String, String);

/// Line terminator used when the document is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Detect the convention from the first line break of `content`.
    pub fn detect(content: &str) -> Self {
        match content.find('\n') {
            Some(idx) if idx > 0 && content.as_bytes()[idx - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A `ProjectSection` or `GlobalSection` block.
///
/// The tag is not stored: the owner decides whether the section is written
/// as a project section or a global section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub category: String,
    pub value: String,
    /// Lines inside the block that are not `key = value` entries, each with
    /// the index of the entry it precedes.
    pub trivia: Vec<(usize, String)>,
    pub entries: IndexMap<String, String>,
}

impl Section {
    pub fn new(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            value: value.into(),
            trivia: Vec::new(),
            entries: IndexMap::new(),
        }
    }

    pub fn key(&self) -> SectionKey {
        (self.category.clone(), self.value.clone())
    }

    /// Add one body line: `key = value` becomes an entry (a repeated key
    /// overwrites in place), anything else is kept as trivia.
    pub fn push_line(&mut self, raw: &str) {
        let parts: Vec<&str> = raw.trim().split(" = ").collect();
        if let [key, value] = parts.as_slice() {
            self.entries.insert(key.to_string(), value.to_string());
        } else {
            self.trivia.push((self.entries.len(), raw.to_string()));
        }
    }
}

/// A `Project(...) = ...` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub type_guid: String,
    pub name: String,
    pub path: String,
    pub guid: String,
    /// Trivia between the previous block and this one.
    pub leading: Vec<String>,
    pub trivia: Vec<String>,
    pub sections: IndexMap<SectionKey, Section>,
}

impl Project {
    pub fn new(
        type_guid: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        guid: impl Into<String>,
    ) -> Self {
        Self {
            type_guid: type_guid.into(),
            name: name.into(),
            path: path.into(),
            guid: guid.into(),
            leading: Vec::new(),
            trivia: Vec::new(),
            sections: IndexMap::new(),
        }
    }

    /// A solution folder; its name doubles as its path.
    pub fn new_folder(name: &str, guid: &str) -> Self {
        Self::new(FOLDER_TYPE_GUID, name, name, guid)
    }

    pub fn is_folder(&self) -> bool {
        self.type_guid.eq_ignore_ascii_case(FOLDER_TYPE_GUID)
    }
}

/// The `Global ... EndGlobal` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Global {
    pub leading: Vec<String>,
    pub trivia: Vec<String>,
    pub sections: IndexMap<SectionKey, Section>,
}

impl Global {
    pub fn section(&self, category: &str, value: &str) -> Option<&Section> {
        self.sections
            .get(&(category.to_string(), value.to_string()))
    }

    pub fn nested_projects(&self) -> Option<&Section> {
        self.section(NESTED_PROJECTS_CATEGORY, NESTED_PROJECTS_VALUE)
    }

    /// The `NestedProjects` section, appended empty when absent.
    pub fn nested_projects_mut(&mut self) -> &mut Section {
        self.sections
            .entry((
                NESTED_PROJECTS_CATEGORY.to_string(),
                NESTED_PROJECTS_VALUE.to_string(),
            ))
            .or_insert_with(|| Section::new(NESTED_PROJECTS_CATEGORY, NESTED_PROJECTS_VALUE))
    }
}

/// Projects keyed by GUID, in document order.
///
/// Removing a project leaves its slot vacant; the next insertion fills the
/// most recently vacated slot. Merge output order depends on this.
#[derive(Debug, Clone, Default)]
pub struct ProjectTable {
    slots: Vec<Option<Project>>,
    vacant: Vec<usize>,
    index: HashMap<String, usize>,
}

impl ProjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, guid: &str) -> bool {
        self.index.contains_key(guid)
    }

    pub fn get(&self, guid: &str) -> Option<&Project> {
        self.index
            .get(guid)
            .and_then(|&slot| self.slots[slot].as_ref())
    }

    pub fn get_mut(&mut self, guid: &str) -> Option<&mut Project> {
        match self.index.get(guid) {
            Some(&slot) => self.slots[slot].as_mut(),
            None => None,
        }
    }

    /// Insert a project. Returns `false` and leaves the table unchanged when
    /// the GUID is already present.
    pub fn insert(&mut self, project: Project) -> bool {
        if self.index.contains_key(&project.guid) {
            return false;
        }
        let guid = project.guid.clone();
        let slot = match self.vacant.pop() {
            Some(slot) => {
                self.slots[slot] = Some(project);
                slot
            }
            None => {
                self.slots.push(Some(project));
                self.slots.len() - 1
            }
        };
        self.index.insert(guid, slot);
        true
    }

    pub fn remove(&mut self, guid: &str) -> Option<Project> {
        let slot = self.index.remove(guid)?;
        self.vacant.push(slot);
        self.slots[slot].take()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Project> {
        self.slots.iter_mut().flatten()
    }

    pub fn guids(&self) -> Vec<String> {
        self.iter().map(|p| p.guid.clone()).collect()
    }
}

impl PartialEq for ProjectTable {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for ProjectTable {}

/// A parsed `.sln` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionDocument {
    /// Location of the file; project paths are relative to its directory.
    pub path: String,
    /// Trivia before the first project or global block (format header,
    /// version lines, comments).
    pub header: Vec<String>,
    pub projects: ProjectTable,
    pub global: Option<Global>,
    /// Trivia after the last block.
    pub footer: Vec<String>,
    pub line_ending: LineEnding,
    pub trailing_newline: bool,
}

impl SolutionDocument {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            header: Vec::new(),
            projects: ProjectTable::new(),
            global: None,
            footer: Vec::new(),
            line_ending: LineEnding::default(),
            trailing_newline: false,
        }
    }

    pub fn directory(&self) -> &str {
        path::directory_name(&self.path)
    }

    /// `12.00` from `Microsoft Visual Studio Solution File, Format Version 12.00`.
    pub fn format_version(&self) -> Option<&str> {
        self.header_value("Microsoft Visual Studio Solution File, Format Version")
            .map(str::trim)
    }

    pub fn visual_studio_version(&self) -> Option<&str> {
        self.header_assignment("VisualStudioVersion")
    }

    pub fn minimum_visual_studio_version(&self) -> Option<&str> {
        self.header_assignment("MinimumVisualStudioVersion")
    }

    fn header_value(&self, prefix: &str) -> Option<&str> {
        self.header
            .iter()
            .find_map(|line| line.trim().strip_prefix(prefix))
    }

    fn header_assignment(&self, name: &str) -> Option<&str> {
        self.header_value(name)
            .and_then(|rest| rest.trim_start().strip_prefix('='))
            .map(str::trim)
    }

    /// First project with the given display name.
    pub fn find_project_by_name(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str, guid: &str) -> Project {
        Project::new(
            "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}",
            name,
            format!("{}.csproj", name),
            guid,
        )
    }

    #[test]
    fn test_project_table_keeps_insertion_order() {
        let mut table = ProjectTable::new();
        assert!(table.insert(project("A", "{1}")));
        assert!(table.insert(project("B", "{2}")));
        assert!(table.insert(project("C", "{3}")));
        assert_eq!(table.guids(), vec!["{1}", "{2}", "{3}"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_project_table_rejects_duplicate_guid() {
        let mut table = ProjectTable::new();
        assert!(table.insert(project("A", "{1}")));
        assert!(!table.insert(project("Other", "{1}")));
        assert_eq!(table.get("{1}").unwrap().name, "A");
    }

    #[test]
    fn test_project_table_reuses_vacated_slot() {
        let mut table = ProjectTable::new();
        table.insert(project("A", "{1}"));
        table.insert(project("B", "{2}"));
        table.insert(project("C", "{3}"));

        let removed = table.remove("{2}").unwrap();
        assert_eq!(removed.name, "B");
        table.insert(project("D", "{4}"));
        table.insert(project("E", "{5}"));

        assert_eq!(table.guids(), vec!["{1}", "{4}", "{3}", "{5}"]);
    }

    #[test]
    fn test_project_table_reuses_last_vacated_slot_first() {
        let mut table = ProjectTable::new();
        table.insert(project("A", "{1}"));
        table.insert(project("B", "{2}"));
        table.insert(project("C", "{3}"));
        table.remove("{1}");
        table.remove("{3}");

        table.insert(project("D", "{4}"));
        table.insert(project("E", "{5}"));
        assert_eq!(table.guids(), vec!["{5}", "{2}", "{4}"]);
    }

    #[test]
    fn test_section_push_line() {
        let mut section = Section::new("SolutionConfigurationPlatforms", "preSolution");
        section.push_line("\t\tDebug|Any CPU = Debug|Any CPU");
        section.push_line("\t\t# comment");
        section.push_line("\t\ta = b = c");
        section.push_line("\t\tDebug|Any CPU = Debug|x64");

        assert_eq!(section.entries.len(), 1);
        assert_eq!(section.entries["Debug|Any CPU"], "Debug|x64");
        assert_eq!(
            section.trivia,
            vec![
                (1, "\t\t# comment".to_string()),
                (1, "\t\ta = b = c".to_string())
            ]
        );
    }

    #[test]
    fn test_is_folder_ignores_case() {
        let folder = Project::new(
            FOLDER_TYPE_GUID.to_lowercase(),
            "Folder",
            "Folder",
            "{F95BC0CF-E609-419F-B0A0-019BD5783670}",
        );
        assert!(folder.is_folder());
        assert!(!project("A", "{1}").is_folder());
    }

    #[test]
    fn test_nested_projects_section_created_once() {
        let mut global = Global::default();
        assert!(global.nested_projects().is_none());
        global
            .nested_projects_mut()
            .entries
            .insert("{1}".to_string(), "{2}".to_string());
        global.nested_projects_mut();
        assert_eq!(global.sections.len(), 1);
        assert_eq!(global.nested_projects().unwrap().entries.len(), 1);
    }

    #[test]
    fn test_line_ending_detection() {
        assert_eq!(LineEnding::detect("a\r\nb"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a\nb\r\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a"), LineEnding::Lf);
    }

    #[test]
    fn test_header_accessors() {
        let mut doc = SolutionDocument::new("/src/App.sln");
        doc.header = vec![
            String::new(),
            "Microsoft Visual Studio Solution File, Format Version 12.00".to_string(),
            "# Visual Studio Version 16".to_string(),
            "VisualStudioVersion = 16.0.29509.3".to_string(),
            "MinimumVisualStudioVersion = 10.0.40219.1".to_string(),
        ];
        assert_eq!(doc.format_version(), Some("12.00"));
        assert_eq!(doc.visual_studio_version(), Some("16.0.29509.3"));
        assert_eq!(doc.minimum_visual_studio_version(), Some("10.0.40219.1"));
        assert_eq!(doc.directory(), "/src");
    }
}
