// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Pattern and module resolution.
//!
//! Maps command-line patterns (`.`, `./...`, `example.com/mod/pkg/...`) to
//! package directories and derives import paths and default package names.

use std::fs;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::LoadError;

static MODULE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*module\s+"?([^\s"]+)"?"#).expect("valid regex"));

static MAJOR_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v[0-9]+$").expect("valid regex"));

static VERSION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.v[0-9]+$").expect("valid regex"));

/// The Go module enclosing a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Module path from the `module` directive.
    pub path: String,
    /// Directory containing `go.mod`.
    pub root: PathBuf,
}

impl Module {
    /// Directory for an import path inside this module, if it is one.
    pub fn dir_for(&self, import_path: &str) -> Option<PathBuf> {
        if import_path == self.path {
            return Some(self.root.clone());
        }
        let rel = import_path.strip_prefix(&self.path)?.strip_prefix('/')?;
        Some(self.root.join(rel))
    }
}

/// Find the nearest `go.mod` at or above `dir`.
pub fn find_module(dir: &Path) -> Result<Option<Module>, LoadError> {
    for candidate in dir.ancestors() {
        let go_mod = candidate.join("go.mod");
        if !go_mod.is_file() {
            continue;
        }
        let content = fs::read_to_string(&go_mod).map_err(|e| LoadError::InvalidModule {
            path: go_mod.display().to_string(),
            message: e.to_string(),
        })?;
        let path = parse_module_path(&content).ok_or_else(|| LoadError::InvalidModule {
            path: go_mod.display().to_string(),
            message: "missing module directive".to_string(),
        })?;
        return Ok(Some(Module {
            path,
            root: candidate.to_path_buf(),
        }));
    }
    Ok(None)
}

/// Extract the module path from `go.mod` content.
pub fn parse_module_path(content: &str) -> Option<String> {
    MODULE_LINE
        .captures(content)
        .map(|caps| caps[1].to_string())
}

/// A directory selected by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub dir: PathBuf,
    /// Named directly rather than found by a recursive walk.
    pub explicit: bool,
}

/// Expand one pattern to candidate package directories.
///
/// `root` is the directory relative patterns are resolved against and
/// `module` the module enclosing it, used for import-path patterns.
pub fn expand_pattern(
    pattern: &str,
    root: &Path,
    module: Option<&Module>,
) -> Result<Vec<PatternMatch>, LoadError> {
    let (base, recursive) = match pattern.strip_suffix("...") {
        Some(prefix) => (prefix.trim_end_matches('/'), true),
        None => (pattern, false),
    };
    let base = if base.is_empty() { "." } else { base };

    let dir = if is_local(base) {
        normalize(&root.join(base))
    } else if let Some(dir) = module.and_then(|m| m.dir_for(base)) {
        normalize(&dir)
    } else {
        return Err(LoadError::PatternNotFound(pattern.to_string()));
    };

    if !dir.is_dir() {
        return Err(LoadError::PatternNotFound(pattern.to_string()));
    }

    if !recursive {
        return Ok(vec![PatternMatch {
            dir,
            explicit: true,
        }]);
    }

    let mut matches = Vec::new();
    let walker = WalkDir::new(&dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !skip_dir(e.path()));
    for entry in walker.filter_map(|e| e.ok()) {
        if entry.file_type().is_dir() {
            matches.push(PatternMatch {
                dir: entry.path().to_path_buf(),
                explicit: false,
            });
        }
    }
    matches.sort_by(|a, b| a.dir.cmp(&b.dir));
    Ok(matches)
}

fn is_local(pattern: &str) -> bool {
    pattern == "."
        || pattern == ".."
        || pattern.starts_with("./")
        || pattern.starts_with("../")
        || Path::new(pattern).is_absolute()
}

/// Directories a recursive pattern never descends into.
pub fn skip_dir(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    name == "testdata" || name == "vendor" || name.starts_with('.') || name.starts_with('_')
}

/// Lexically clean a path (drop `.` and resolve `..` where possible).
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Non-test Go sources in a directory, sorted by file name.
pub fn go_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".go") && !name.ends_with("_test.go") && !name.starts_with('.') {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Import path of a package directory.
pub fn package_id(dir: &Path, root: &Path, module: Option<&Module>) -> String {
    match module {
        Some(module) => match dir.strip_prefix(&module.root) {
            Ok(rel) if rel.as_os_str().is_empty() => module.path.clone(),
            Ok(rel) => format!("{}/{}", module.path, slash_path(rel)),
            Err(_) => slash_path(dir),
        },
        None => match dir.strip_prefix(root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => slash_path(rel),
            Err(_) => slash_path(dir),
        },
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Default package name for an import path that cannot be read from disk.
///
/// Uses the last path element, ignoring a trailing major-version element
/// (`/v2`) and `.vN` / `go-` decorations.
pub fn default_package_name(import_path: &str) -> String {
    let mut elements: Vec<&str> = import_path.split('/').filter(|e| !e.is_empty()).collect();
    if elements.len() > 1 && elements.last().is_some_and(|e| MAJOR_VERSION.is_match(e)) {
        elements.pop();
    }
    let last = elements.last().copied().unwrap_or(import_path);
    let last = VERSION_SUFFIX.replace(last, "");
    let last = last.strip_prefix("go-").unwrap_or(&last);
    last.replace(['-', '.'], "_")
}
