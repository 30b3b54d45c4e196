//! Path manipulation utilities for slnmerge
//!
//! Solution files store project locations relative to the solution file.
//! When a project moves from the overlay solution into the base solution its
//! path has to be re-expressed relative to the base. Inputs may use either
//! `/` or `\` as separator; outputs use the platform separator.

use std::path::MAIN_SEPARATOR;

use regex::Regex;

use crate::error::{Error, Result};

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Returns true for rooted paths (`/x`, `\x`) and drive paths (`C:\x`).
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(is_separator) || has_drive_prefix(path)
}

/// Resolve `.` and `..` segments and make the path absolute.
///
/// Relative paths are resolved against the current working directory. A
/// leading drive (`C:`) is kept as the root on every platform so that paths
/// written on Windows still compare consistently.
pub fn normalize_path(path: &str) -> Result<String> {
    let absolute = if is_absolute(path) {
        path.to_string()
    } else {
        let cwd = std::env::current_dir().map_err(|e| Error::Path {
            message: format!("cannot resolve '{}' against the current directory: {}", path, e),
        })?;
        combine(&cwd.to_string_lossy(), path)
    };

    let (root, rest) = if has_drive_prefix(&absolute) {
        (format!("{}{}", &absolute[..2], MAIN_SEPARATOR), &absolute[2..])
    } else {
        (MAIN_SEPARATOR.to_string(), absolute.as_str())
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split(is_separator) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    Ok(format!(
        "{}{}",
        root,
        segments.join(&MAIN_SEPARATOR.to_string())
    ))
}

/// Join a directory and a path. An absolute `path` replaces the directory.
pub fn combine(dir: &str, path: &str) -> String {
    if dir.is_empty() || is_absolute(path) {
        return path.to_string();
    }
    if dir.ends_with(is_separator) {
        format!("{}{}", dir, path)
    } else {
        format!("{}{}{}", dir, MAIN_SEPARATOR, path)
    }
}

/// Resolve `path` against `dir` and normalize the result.
pub fn make_absolute(dir: &str, path: &str) -> Result<String> {
    normalize_path(&combine(dir, path))
}

/// The directory part of a file path, without trailing separator.
pub fn directory_name(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(0) => &path[..1],
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// The file name of a path without its final extension.
pub fn file_stem(path: &str) -> &str {
    let name = match path.rfind(is_separator) {
        Some(idx) => &path[idx + 1..],
        None => path,
    };
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Express `target_path` relative to the directory containing `base_path`.
///
/// `base_path` is a file path; its last segment is ignored. The two paths are
/// compared segment by segment; for the longest agreeing prefix the result
/// climbs out of the remaining base directories with `..` and appends the
/// rest of the target. Paths without any common prefix (different drives)
/// are returned unchanged.
pub fn make_relative(base_path: &str, target_path: &str) -> String {
    let base_parts: Vec<&str> = base_path.split(is_separator).collect();
    let target_parts: Vec<&str> = target_path.split(is_separator).collect();

    let mut relative = target_path.to_string();
    let mut prefix_len = 0usize;
    for i in 0..base_parts.len().min(target_parts.len()) {
        if base_parts[i] != target_parts[i] {
            break;
        }

        // byte length of the `/`-joined prefix up to and including segment i
        prefix_len += target_parts[i].len() + usize::from(i > 0);
        let climb = base_parts.len().saturating_sub(i + 2);

        let mut candidate = String::new();
        for _ in 0..climb {
            candidate.push_str("..");
            candidate.push(MAIN_SEPARATOR);
        }
        candidate.push_str(target_path.get(prefix_len + 1..).unwrap_or(""));
        relative = candidate;
    }

    relative
}

/// A compiled project-name wildcard (`*` = any sequence, `?` = any character).
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
}

impl WildcardPattern {
    /// Compile a wildcard. Every other character matches literally.
    pub fn new(pattern: &str) -> Result<Self> {
        let escaped = regex::escape(pattern)
            .replace(r"\*", ".*")
            .replace(r"\?", ".");
        let regex = Regex::new(&format!("^{}$", escaped))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}
