//! `.sln` writer
//!
//! Emits the document in canonical order: header, projects, global block,
//! footer. Trivia lines are written exactly as they were read; inside a
//! section they keep their place among the entries, whose indentation is
//! regenerated as two tabs.

use super::model::{Project, Section, SolutionDocument};

fn write_section(lines: &mut Vec<String>, tag: &str, section: &Section) {
    lines.push(format!(
        "\t{}({}) = {}",
        tag, section.category, section.value
    ));
    let mut trivia = section.trivia.iter().peekable();
    for (index, (key, value)) in section.entries.iter().enumerate() {
        while let Some((_, line)) = trivia.next_if(|(at, _)| *at <= index) {
            lines.push(line.clone());
        }
        lines.push(format!("\t\t{} = {}", key, value));
    }
    // positions past the last entry, including entries removed since parsing
    lines.extend(trivia.map(|(_, line)| line.clone()));
    lines.push(format!("\tEnd{}", tag));
}

fn write_project(lines: &mut Vec<String>, project: &Project) {
    lines.extend(project.leading.iter().cloned());
    lines.push(format!(
        "Project(\"{}\") = \"{}\", \"{}\", \"{}\"",
        project.type_guid, project.name, project.path, project.guid
    ));
    lines.extend(project.trivia.iter().cloned());
    for section in project.sections.values() {
        write_section(lines, "ProjectSection", section);
    }
    lines.push("EndProject".to_string());
}

/// Serialize the document to `.sln` text.
pub fn write(doc: &SolutionDocument) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.extend(doc.header.iter().cloned());
    for project in doc.projects.iter() {
        write_project(&mut lines, project);
    }
    if let Some(global) = &doc.global {
        lines.extend(global.leading.iter().cloned());
        lines.push("Global".to_string());
        lines.extend(global.trivia.iter().cloned());
        for section in global.sections.values() {
            write_section(&mut lines, "GlobalSection", section);
        }
        lines.push("EndGlobal".to_string());
    }
    lines.extend(doc.footer.iter().cloned());

    let newline = doc.line_ending.as_str();
    let mut out = lines.join(newline);
    if doc.trailing_newline && !lines.is_empty() {
        out.push_str(newline);
    }
    out
}
