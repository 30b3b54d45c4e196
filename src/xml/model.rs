//! Element tree for `.slnx` solutions
//!
//! `Project`, `Folder`, `File` and `BuildType` elements are *keyed*: they
//! carry one identifying attribute (`Path` or `Name`) that decides whether
//! two elements describe the same thing. Everything else is kept as a plain
//! element so unknown content survives a merge.
//!
//! Names are kept qualified (`v:Foo`) and namespace declarations are kept
//! as `xmlns` / `xmlns:*` attributes, so foreign markup writes back as read.

use indexmap::IndexMap;

use crate::error::Result;
use crate::path::{file_stem, WildcardPattern};
use crate::settings::ProjectConflictResolution;

/// How `merge_children` / `merge_attributes` treat an overlay item whose
/// identity already exists in the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Replace the base item with the overlay item.
    Overlay,
    /// Keep the base item, drop the overlay item.
    Preserve,
    /// Keep both.
    Both,
}

impl From<ProjectConflictResolution> for MergeStrategy {
    fn from(policy: ProjectConflictResolution) -> Self {
        match policy {
            ProjectConflictResolution::PreserveOverlay => MergeStrategy::Overlay,
            ProjectConflictResolution::PreserveUnity => MergeStrategy::Preserve,
            ProjectConflictResolution::PreserveAll => MergeStrategy::Both,
        }
    }
}

/// A generic element with ordered attributes. Names are qualified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        find_attribute(&self.attributes, name)
    }
}

/// An element identified by a single key attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyedElement {
    pub key: String,
    /// Attributes other than the key attribute.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl KeyedElement {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        find_attribute(&self.attributes, name)
    }
}

/// `xmlns` or `xmlns:*`: a namespace declaration kept among the attributes.
pub fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

fn find_attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

/// Which keyed element a node is, and the name of its key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Project,
    Folder,
    File,
    BuildType,
}

impl KeyKind {
    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "Project" => Some(KeyKind::Project),
            "Folder" => Some(KeyKind::Folder),
            "File" => Some(KeyKind::File),
            "BuildType" => Some(KeyKind::BuildType),
            _ => None,
        }
    }

    pub fn element_name(&self) -> &'static str {
        match self {
            KeyKind::Project => "Project",
            KeyKind::Folder => "Folder",
            KeyKind::File => "File",
            KeyKind::BuildType => "BuildType",
        }
    }

    pub fn key_attribute(&self) -> &'static str {
        match self {
            KeyKind::Project | KeyKind::File => "Path",
            KeyKind::Folder | KeyKind::BuildType => "Name",
        }
    }
}

/// Any node below the `<Solution>` root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Project(KeyedElement),
    Folder(KeyedElement),
    File(KeyedElement),
    BuildType(KeyedElement),
    Configurations(Element),
    Unknown(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: Option<String>,
    },
}

/// (element name, key attribute name, key value)
pub type Identity<'a> = (&'static str, &'static str, &'a str);

impl Node {
    /// Build the typed node for an element, dispatching on its name.
    pub fn from_element(element: Element) -> Node {
        if element.name == "Configurations" {
            return Node::Configurations(element);
        }
        let Some(kind) = KeyKind::from_element_name(&element.name) else {
            return Node::Unknown(element);
        };

        let key_name = kind.key_attribute();
        let mut key = String::new();
        let mut attributes = Vec::with_capacity(element.attributes.len());
        for (name, value) in element.attributes {
            if name == key_name {
                key = value;
            } else {
                attributes.push((name, value));
            }
        }
        Node::keyed(
            kind,
            KeyedElement {
                key,
                attributes,
                children: element.children,
            },
        )
    }

    pub fn keyed(kind: KeyKind, element: KeyedElement) -> Node {
        match kind {
            KeyKind::Project => Node::Project(element),
            KeyKind::Folder => Node::Folder(element),
            KeyKind::File => Node::File(element),
            KeyKind::BuildType => Node::BuildType(element),
        }
    }

    pub fn key_kind(&self) -> Option<KeyKind> {
        match self {
            Node::Project(_) => Some(KeyKind::Project),
            Node::Folder(_) => Some(KeyKind::Folder),
            Node::File(_) => Some(KeyKind::File),
            Node::BuildType(_) => Some(KeyKind::BuildType),
            _ => None,
        }
    }

    pub fn as_keyed(&self) -> Option<&KeyedElement> {
        match self {
            Node::Project(e) | Node::Folder(e) | Node::File(e) | Node::BuildType(e) => Some(e),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<Identity<'_>> {
        let kind = self.key_kind()?;
        let element = self.as_keyed()?;
        Some((kind.element_name(), kind.key_attribute(), element.key.as_str()))
    }

    /// Element name, or `None` for text, comments and processing instructions.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Configurations(_) => Some("Configurations"),
            Node::Unknown(e) => Some(e.name.as_str()),
            Node::Text(_) | Node::Comment(_) | Node::ProcessingInstruction { .. } => None,
            keyed => keyed.key_kind().map(|k| k.element_name()),
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Project(e) | Node::Folder(e) | Node::File(e) | Node::BuildType(e) => &e.children,
            Node::Configurations(e) | Node::Unknown(e) => &e.children,
            Node::Text(_) | Node::Comment(_) | Node::ProcessingInstruction { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Project(e) | Node::Folder(e) | Node::File(e) | Node::BuildType(e) => {
                Some(&mut e.children)
            }
            Node::Configurations(e) | Node::Unknown(e) => Some(&mut e.children),
            Node::Text(_) | Node::Comment(_) | Node::ProcessingInstruction { .. } => None,
        }
    }
}

/// Merge overlay children into `base`, matching keyed nodes by identity.
pub fn merge_children(base: &mut Vec<Node>, overlay: Vec<Node>, strategy: MergeStrategy) {
    for child in overlay {
        let existing = child.identity().and_then(|identity| {
            base.iter()
                .position(|node| node.identity() == Some(identity))
        });
        match (existing, strategy) {
            (Some(idx), MergeStrategy::Overlay) => {
                base.remove(idx);
                base.push(child);
            }
            (Some(_), MergeStrategy::Preserve) => {}
            _ => base.push(child),
        }
    }
}

/// Merge overlay attributes into `base`; existing names keep their position.
pub fn merge_attributes(
    base: &mut Vec<(String, String)>,
    overlay: &[(String, String)],
    strategy: MergeStrategy,
) {
    for (name, value) in overlay {
        match base.iter_mut().find(|(n, _)| n == name) {
            Some(existing) => {
                if strategy == MergeStrategy::Overlay {
                    existing.1 = value.clone();
                }
            }
            None => base.push((name.clone(), value.clone())),
        }
    }
}

/// The `<Solution>` root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolutionElement {
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

fn collect_projects<'a>(nodes: &'a [Node], out: &mut IndexMap<String, &'a KeyedElement>) {
    for node in nodes {
        if let Node::Project(project) = node {
            out.entry(project.key.clone()).or_insert(project);
        }
        collect_projects(node.children(), out);
    }
}

fn remove_projects(nodes: &mut Vec<Node>, path: &str) -> usize {
    let before = nodes.len();
    nodes.retain(|node| !matches!(node, Node::Project(p) if p.key == path));
    let mut removed = before - nodes.len();
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            removed += remove_projects(children, path);
        }
    }
    removed
}

fn detach_matching(nodes: &mut Vec<Node>, pattern: &WildcardPattern) -> Vec<KeyedElement> {
    let mut detached = Vec::new();
    for mut node in std::mem::take(nodes) {
        match node {
            Node::Project(project) if pattern.is_match(file_stem(&project.key)) => {
                detached.push(project);
            }
            _ => {
                if let Some(children) = node.children_mut() {
                    detached.extend(detach_matching(children, pattern));
                }
                nodes.push(node);
            }
        }
    }
    detached
}

fn rewrite_nodes(
    nodes: &mut [Node],
    rewrite: &mut dyn FnMut(&str) -> Result<String>,
) -> Result<()> {
    for node in nodes.iter_mut() {
        match node {
            Node::Project(e) | Node::File(e) if !e.key.trim().is_empty() => {
                e.key = rewrite(&e.key)?;
            }
            Node::Unknown(e) if e.name == "BuildDependency" => {
                for (name, value) in e.attributes.iter_mut() {
                    if *name == "Project" && !value.trim().is_empty() {
                        *value = rewrite(value.as_str())?;
                    }
                }
            }
            _ => {}
        }
        if let Some(children) = node.children_mut() {
            rewrite_nodes(children, rewrite)?;
        }
    }
    Ok(())
}

impl SolutionElement {
    /// Every project anywhere in the tree, keyed by path; first occurrence wins.
    pub fn projects(&self) -> IndexMap<String, &KeyedElement> {
        let mut projects = IndexMap::new();
        collect_projects(&self.children, &mut projects);
        projects
    }

    /// Top-level folders keyed by name.
    pub fn folders(&self) -> IndexMap<String, &KeyedElement> {
        let mut folders = IndexMap::new();
        for node in &self.children {
            if let Node::Folder(folder) = node {
                folders.entry(folder.key.clone()).or_insert(folder);
            }
        }
        folders
    }

    pub fn configurations(&self) -> Option<&Element> {
        self.children.iter().find_map(|node| match node {
            Node::Configurations(e) => Some(e),
            _ => None,
        })
    }

    pub fn has_folder(&self, name: &str) -> bool {
        self.folder_position(name).is_some()
    }

    fn folder_position(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, Node::Folder(f) if f.key == name))
    }

    pub fn add_child(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Add a top-level folder, or merge it into the folder with the same name.
    pub fn add_or_merge_folder(&mut self, folder: KeyedElement, strategy: MergeStrategy) {
        match self.folder_position(&folder.key) {
            Some(idx) => {
                if let Node::Folder(existing) = &mut self.children[idx] {
                    merge_attributes(&mut existing.attributes, &folder.attributes, strategy);
                    merge_children(&mut existing.children, folder.children, strategy);
                }
            }
            None => self.children.push(Node::Folder(folder)),
        }
    }

    /// Add the `<Configurations>` element, or merge it into the existing one.
    pub fn add_or_merge_configurations(&mut self, configurations: Element, strategy: MergeStrategy) {
        let existing = self.children.iter_mut().find_map(|node| match node {
            Node::Configurations(e) => Some(e),
            _ => None,
        });
        match existing {
            Some(existing) => {
                merge_attributes(&mut existing.attributes, &configurations.attributes, strategy);
                merge_children(&mut existing.children, configurations.children, strategy);
            }
            None => self.children.push(Node::Configurations(configurations)),
        }
    }

    /// Append a project to the top-level folder `folder`. Returns `false`
    /// when there is no such folder.
    pub fn add_project(&mut self, project: KeyedElement, folder: &str) -> bool {
        match self.folder_position(folder) {
            Some(idx) => match self.children[idx].children_mut() {
                Some(children) => {
                    children.push(Node::Project(project));
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Remove every project with this path, at any depth.
    pub fn remove_project(&mut self, path: &str) -> usize {
        remove_projects(&mut self.children, path)
    }

    /// Take out every project whose file stem matches `pattern`, at any
    /// depth, in document order.
    pub fn detach_projects(&mut self, pattern: &WildcardPattern) -> Vec<KeyedElement> {
        detach_matching(&mut self.children, pattern)
    }

    /// Apply `rewrite` to every project and file path and to the `Project`
    /// attribute of build dependencies.
    pub fn rewrite_paths(
        &mut self,
        mut rewrite: impl FnMut(&str) -> Result<String>,
    ) -> Result<()> {
        rewrite_nodes(&mut self.children, &mut rewrite)
    }
}

/// A parsed `.slnx` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionDocument {
    pub path: String,
    pub root: SolutionElement,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(path: &str) -> Node {
        Node::Project(KeyedElement::new(path))
    }

    fn folder(name: &str, children: Vec<Node>) -> Node {
        Node::Folder(KeyedElement {
            key: name.to_string(),
            attributes: Vec::new(),
            children,
        })
    }

    fn keys(nodes: &[Node]) -> Vec<&str> {
        nodes
            .iter()
            .filter_map(|n| n.as_keyed().map(|k| k.key.as_str()))
            .collect()
    }

    #[test]
    fn test_from_element_extracts_key() {
        let element = Element {
            name: "Project".to_string(),
            attributes: vec![
                ("Type".to_string(), "Classic C#".to_string()),
                ("Path".to_string(), "a/A.csproj".to_string()),
            ],
            children: Vec::new(),
        };
        let node = Node::from_element(element);
        assert_eq!(node.identity(), Some(("Project", "Path", "a/A.csproj")));
        assert_eq!(node.as_keyed().unwrap().attribute("Type"), Some("Classic C#"));

        let build_type = Node::from_element(Element {
            name: "BuildType".to_string(),
            attributes: vec![("Name".to_string(), "Debug".to_string())],
            children: Vec::new(),
        });
        assert_eq!(build_type.identity(), Some(("BuildType", "Name", "Debug")));

        let unknown = Node::from_element(Element::new("Properties"));
        assert_eq!(unknown.identity(), None);
        assert_eq!(unknown.name(), Some("Properties"));
    }

    #[test]
    fn test_identity_differs_by_kind() {
        let file = Node::File(KeyedElement::new("x"));
        let project = Node::Project(KeyedElement::new("x"));
        assert_ne!(file.identity(), project.identity());
    }

    #[test]
    fn test_merge_children_strategies() {
        let base = vec![project("a"), project("b")];
        let overlay = vec![project("b"), project("c")];

        let mut merged = base.clone();
        merge_children(&mut merged, overlay.clone(), MergeStrategy::Overlay);
        assert_eq!(keys(&merged), vec!["a", "b", "c"]);

        let mut merged = vec![project("b"), project("a")];
        merge_children(&mut merged, overlay.clone(), MergeStrategy::Overlay);
        assert_eq!(keys(&merged), vec!["a", "b", "c"]);

        let mut merged = base.clone();
        merge_children(&mut merged, overlay.clone(), MergeStrategy::Preserve);
        assert_eq!(keys(&merged), vec!["a", "b", "c"]);

        let mut merged = base;
        merge_children(&mut merged, overlay, MergeStrategy::Both);
        assert_eq!(keys(&merged), vec!["a", "b", "b", "c"]);
    }

    #[test]
    fn test_merge_children_appends_unkeyed() {
        let mut merged = vec![Node::Comment("x".to_string())];
        merge_children(
            &mut merged,
            vec![Node::Comment("x".to_string())],
            MergeStrategy::Preserve,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_attributes() {
        let overlay = vec![
            ("Name".to_string(), "overlay".to_string()),
            ("Extra".to_string(), "1".to_string()),
        ];
        let mut base = vec![
            ("Name".to_string(), "base".to_string()),
            ("Id".to_string(), "7".to_string()),
        ];
        merge_attributes(&mut base, &overlay, MergeStrategy::Overlay);
        assert_eq!(
            base,
            vec![
                ("Name".to_string(), "overlay".to_string()),
                ("Id".to_string(), "7".to_string()),
                ("Extra".to_string(), "1".to_string()),
            ]
        );

        let mut base = vec![("Name".to_string(), "base".to_string())];
        merge_attributes(&mut base, &overlay, MergeStrategy::Preserve);
        assert_eq!(base[0].1, "base");
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_projects_view_is_recursive() {
        let root = SolutionElement {
            attributes: Vec::new(),
            children: vec![
                project("a"),
                folder("/Tools/", vec![project("b"), project("a")]),
            ],
        };
        let projects = root.projects();
        assert_eq!(projects.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(root.folders().len(), 1);
        assert!(root.configurations().is_none());
    }

    #[test]
    fn test_remove_project_everywhere() {
        let mut root = SolutionElement {
            attributes: Vec::new(),
            children: vec![project("a"), folder("/Tools/", vec![project("a"), project("b")])],
        };
        assert_eq!(root.remove_project("a"), 2);
        assert_eq!(root.projects().len(), 1);
    }

    #[test]
    fn test_detach_projects_by_file_stem() {
        let mut root = SolutionElement {
            attributes: Vec::new(),
            children: vec![
                project("src/MyTool.Core/MyTool.Core.csproj"),
                folder("/Tools/", vec![project("tools/MyTool/MyTool.csproj")]),
                project("src/App/App.csproj"),
            ],
        };
        let pattern = WildcardPattern::new("MyTool*").unwrap();
        let detached = root.detach_projects(&pattern);
        assert_eq!(
            detached.iter().map(|p| p.key.as_str()).collect::<Vec<_>>(),
            vec!["src/MyTool.Core/MyTool.Core.csproj", "tools/MyTool/MyTool.csproj"]
        );
        assert_eq!(root.projects().len(), 1);
        assert!(root.has_folder("/Tools/"));
    }

    #[test]
    fn test_add_project_requires_folder() {
        let mut root = SolutionElement::default();
        assert!(!root.add_project(KeyedElement::new("a"), "/Tools/"));
        root.add_or_merge_folder(KeyedElement::new("/Tools/"), MergeStrategy::Preserve);
        assert!(root.add_project(KeyedElement::new("a"), "/Tools/"));
        assert_eq!(root.folders()["/Tools/"].children.len(), 1);
    }

    #[test]
    fn test_add_or_merge_folder_merges_children() {
        let mut root = SolutionElement {
            attributes: Vec::new(),
            children: vec![folder("/Items/", vec![Node::File(KeyedElement::new("a.txt"))])],
        };
        root.add_or_merge_folder(
            KeyedElement {
                key: "/Items/".to_string(),
                attributes: Vec::new(),
                children: vec![
                    Node::File(KeyedElement::new("a.txt")),
                    Node::File(KeyedElement::new("b.txt")),
                ],
            },
            MergeStrategy::Preserve,
        );
        assert_eq!(root.children.len(), 1);
        assert_eq!(keys(root.children[0].children()), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_add_or_merge_configurations() {
        let mut root = SolutionElement::default();
        let mut cfg = Element::new("Configurations");
        cfg.children.push(Node::BuildType(KeyedElement::new("Debug")));
        root.add_or_merge_configurations(cfg, MergeStrategy::Preserve);

        let mut overlay = Element::new("Configurations");
        overlay.children.push(Node::BuildType(KeyedElement::new("Debug")));
        overlay.children.push(Node::BuildType(KeyedElement::new("Release")));
        root.add_or_merge_configurations(overlay, MergeStrategy::Preserve);

        assert_eq!(keys(&root.configurations().unwrap().children), vec!["Debug", "Release"]);
    }

    #[test]
    fn test_rewrite_paths() {
        let mut dependency = Element::new("BuildDependency");
        dependency
            .attributes
            .push(("Project".to_string(), "b.csproj".to_string()));
        let mut root = SolutionElement {
            attributes: Vec::new(),
            children: vec![
                Node::Project(KeyedElement {
                    key: "a.csproj".to_string(),
                    attributes: Vec::new(),
                    children: vec![Node::Unknown(dependency)],
                }),
                folder("/Items/", vec![Node::File(KeyedElement::new("readme.md"))]),
            ],
        };
        root.rewrite_paths(|p| Ok(format!("../{}", p))).unwrap();

        assert!(root.projects().contains_key("../a.csproj"));
        let project = &root.children[0];
        match &project.children()[0] {
            Node::Unknown(e) => assert_eq!(e.attribute("Project"), Some("../b.csproj")),
            other => panic!("unexpected node {:?}", other),
        }
        assert_eq!(keys(root.children[1].children()), vec!["../readme.md"]);
        // folder names are not paths
        assert!(root.has_folder("/Items/"));
    }

    #[test]
    fn test_strategy_from_policy() {
        assert_eq!(
            MergeStrategy::from(ProjectConflictResolution::PreserveOverlay),
            MergeStrategy::Overlay
        );
        assert_eq!(
            MergeStrategy::from(ProjectConflictResolution::PreserveUnity),
            MergeStrategy::Preserve
        );
        assert_eq!(
            MergeStrategy::from(ProjectConflictResolution::PreserveAll),
            MergeStrategy::Both
        );
    }
}
