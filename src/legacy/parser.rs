//! Line-based `.sln` parser
//!
//! Every line is classified by its trimmed prefix and fed through a small
//! state machine (`Document → Project → ProjectSection`,
//! `Document → Global → GlobalSection`). Unrecognized lines are kept as
//! trivia of the innermost open block.

use log::debug;
use regex::Regex;

use super::model::{Global, LineEnding, Project, Section, SolutionDocument};
use crate::error::{Error, Result};

/// Structural meaning of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    FormatVersion,
    VsVersion,
    MinVsVersion,
    ProjectBegin,
    ProjectEnd,
    ProjectSectionBegin,
    ProjectSectionEnd,
    GlobalBegin,
    GlobalEnd,
    GlobalSectionBegin,
    GlobalSectionEnd,
    Unknown,
}

/// Classify a line by its trimmed prefix.
pub fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.starts_with("Microsoft Visual Studio Solution File, Format Version") {
        LineKind::FormatVersion
    } else if trimmed.starts_with("VisualStudioVersion") {
        LineKind::VsVersion
    } else if trimmed.starts_with("MinimumVisualStudioVersion") {
        LineKind::MinVsVersion
    } else if trimmed.starts_with("Project(\"") {
        LineKind::ProjectBegin
    } else if trimmed == "EndProject" {
        LineKind::ProjectEnd
    } else if trimmed.starts_with("ProjectSection(") {
        LineKind::ProjectSectionBegin
    } else if trimmed == "EndProjectSection" {
        LineKind::ProjectSectionEnd
    } else if trimmed == "Global" {
        LineKind::GlobalBegin
    } else if trimmed == "EndGlobal" {
        LineKind::GlobalEnd
    } else if trimmed.starts_with("GlobalSection(") {
        LineKind::GlobalSectionBegin
    } else if trimmed == "EndGlobalSection" {
        LineKind::GlobalSectionEnd
    } else {
        LineKind::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Document,
    Project,
    ProjectSection,
    Global,
    GlobalSection,
}

struct Patterns {
    project: Regex,
    project_section: Regex,
    global_section: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Self {
            project: Regex::new(
                r#"^Project\("?([^")]+)"?\)\s+=\s+"([^"]+)",\s*"([^"]+)",\s*"([^"]+)""#,
            )?,
            project_section: Regex::new(r"^ProjectSection\(([^)]+)\)(?:\s+=\s+(.*))?")?,
            global_section: Regex::new(r"^GlobalSection\(([^)]+)\)(?:\s+=\s+(.*))?")?,
        })
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

fn parse_section(pattern: &Regex, trimmed: &str, line_no: usize) -> Result<Section> {
    let caps = pattern
        .captures(trimmed)
        .ok_or_else(|| parse_error(line_no, format!("malformed section line '{}'", trimmed)))?;
    let category = caps.get(1).map_or("", |m| m.as_str());
    let value = caps.get(2).map_or("", |m| m.as_str());
    Ok(Section::new(category.trim(), value.trim()))
}

/// Parse the content of a `.sln` file located at `path`.
pub fn parse(path: &str, content: &str) -> Result<SolutionDocument> {
    let patterns = Patterns::new()?;

    let mut doc = SolutionDocument::new(path);
    doc.line_ending = LineEnding::detect(content);
    doc.trailing_newline = content.ends_with('\n');

    let lines: Vec<&str> = if content.is_empty() {
        Vec::new()
    } else {
        let body = content.strip_suffix('\n').unwrap_or(content);
        body.split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect()
    };

    let mut state = State::Document;
    let mut seen_block = false;
    let mut pending: Vec<String> = Vec::new();
    let mut project: Option<Project> = None;
    let mut global: Option<Global> = None;
    let mut section: Option<Section> = None;

    for (idx, raw) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let kind = classify(raw);
        let trimmed = raw.trim();

        match (state, kind) {
            (State::Document, LineKind::ProjectBegin) => {
                let caps = patterns.project.captures(trimmed).ok_or_else(|| {
                    parse_error(line_no, format!("malformed project line '{}'", trimmed))
                })?;
                let mut p = Project::new(&caps[1], &caps[2], &caps[3], &caps[4]);
                if seen_block {
                    p.leading = std::mem::take(&mut pending);
                } else {
                    doc.header = std::mem::take(&mut pending);
                    seen_block = true;
                }
                project = Some(p);
                state = State::Project;
            }
            (State::Document, LineKind::GlobalBegin) => {
                let mut g = match doc.global.take() {
                    Some(existing) => {
                        debug!("Line {}: repeated Global block folded into the first", line_no);
                        existing
                    }
                    None => Global::default(),
                };
                if seen_block {
                    g.leading.append(&mut pending);
                } else {
                    doc.header = std::mem::take(&mut pending);
                    seen_block = true;
                }
                global = Some(g);
                state = State::Global;
            }
            (State::Document, LineKind::Unknown)
            | (State::Document, LineKind::FormatVersion)
            | (State::Document, LineKind::VsVersion)
            | (State::Document, LineKind::MinVsVersion) => {
                pending.push(raw.to_string());
            }

            (State::Project, LineKind::ProjectSectionBegin) => {
                section = Some(parse_section(&patterns.project_section, trimmed, line_no)?);
                state = State::ProjectSection;
            }
            (State::Project, LineKind::ProjectEnd) => {
                if let Some(p) = project.take() {
                    if doc.projects.contains(&p.guid) {
                        debug!("Line {}: duplicate project {} skipped", line_no, p.guid);
                        pending = p.leading;
                    } else {
                        doc.projects.insert(p);
                    }
                }
                state = State::Document;
            }
            (State::ProjectSection, LineKind::ProjectSectionEnd) => {
                if let (Some(s), Some(p)) = (section.take(), project.as_mut()) {
                    let key = s.key();
                    if !p.sections.contains_key(&key) {
                        p.sections.insert(key, s);
                    }
                }
                state = State::Project;
            }

            (State::Global, LineKind::GlobalSectionBegin) => {
                section = Some(parse_section(&patterns.global_section, trimmed, line_no)?);
                state = State::GlobalSection;
            }
            (State::Global, LineKind::GlobalEnd) => {
                doc.global = global.take();
                state = State::Document;
            }
            (State::GlobalSection, LineKind::GlobalSectionEnd) => {
                if let (Some(s), Some(g)) = (section.take(), global.as_mut()) {
                    let key = s.key();
                    if !g.sections.contains_key(&key) {
                        g.sections.insert(key, s);
                    }
                }
                state = State::Global;
            }

            (State::ProjectSection, LineKind::Unknown)
            | (State::ProjectSection, LineKind::FormatVersion)
            | (State::ProjectSection, LineKind::VsVersion)
            | (State::ProjectSection, LineKind::MinVsVersion)
            | (State::GlobalSection, LineKind::Unknown)
            | (State::GlobalSection, LineKind::FormatVersion)
            | (State::GlobalSection, LineKind::VsVersion)
            | (State::GlobalSection, LineKind::MinVsVersion) => {
                if let Some(s) = section.as_mut() {
                    s.push_line(raw);
                }
            }
            (State::Project, LineKind::Unknown)
            | (State::Project, LineKind::FormatVersion)
            | (State::Project, LineKind::VsVersion)
            | (State::Project, LineKind::MinVsVersion) => {
                if let Some(p) = project.as_mut() {
                    p.trivia.push(raw.to_string());
                }
            }
            (State::Global, LineKind::Unknown)
            | (State::Global, LineKind::FormatVersion)
            | (State::Global, LineKind::VsVersion)
            | (State::Global, LineKind::MinVsVersion) => {
                if let Some(g) = global.as_mut() {
                    g.trivia.push(raw.to_string());
                }
            }

            (_, LineKind::ProjectBegin) => {
                return Err(parse_error(
                    line_no,
                    "Project must be located at the top level of the solution",
                ));
            }
            (_, LineKind::GlobalBegin) => {
                return Err(parse_error(
                    line_no,
                    "Global must be located at the top level of the solution",
                ));
            }
            (_, LineKind::ProjectSectionBegin) => {
                return Err(parse_error(
                    line_no,
                    "ProjectSection must be located under Project",
                ));
            }
            (_, LineKind::GlobalSectionBegin) => {
                return Err(parse_error(
                    line_no,
                    "GlobalSection must be located under Global",
                ));
            }
            (_, end) => {
                return Err(parse_error(
                    line_no,
                    format!("unexpected {:?} while in {:?}", end, state),
                ));
            }
        }
    }

    if state != State::Document {
        return Err(parse_error(
            lines.len(),
            format!("unexpected end of file while in {:?}", state),
        ));
    }

    if seen_block {
        doc.footer = pending;
    } else {
        doc.header = pending;
    }

    Ok(doc)
}
