// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Types for the package loader.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::syntax::File;

/// A loaded Go package.
///
/// Packages are immutable once loaded and are shared read-only between
/// generator workers.
#[derive(Debug, Clone)]
pub struct Package {
    /// Full import path (module path plus directory).
    pub id: String,
    /// Name from the package clause.
    pub name: String,
    /// Directory holding the package sources.
    pub dir: PathBuf,
    /// Parsed source files, sorted by file name.
    pub files: Vec<SourceFile>,
    /// Import graph: import path -> default package name.
    pub imports: HashMap<String, String>,
    /// Diagnostics collected while loading.
    pub errors: Vec<PackageDiagnostic>,
}

impl Package {
    /// Default name of an imported package, if the package imports it.
    pub fn import_name(&self, path: &str) -> Option<&str> {
        self.imports.get(path).map(String::as_str)
    }

    /// Whether this is a command (`package main`), which cannot be imported.
    pub fn is_command(&self) -> bool {
        self.name == "main"
    }
}

/// One parsed source file of a package.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub syntax: File,
}

impl SourceFile {
    /// Base name of the file (`service.go`).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// A problem found while loading a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDiagnostic {
    /// File the problem was found in, if any.
    pub file: Option<PathBuf>,
    /// Line (1-indexed, 0 when unknown).
    pub line: u32,
    /// Column (1-indexed, 0 when unknown).
    pub column: u32,
    pub message: String,
}

impl PackageDiagnostic {
    /// A diagnostic not tied to a source position.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: 0,
            column: 0,
            message: message.into(),
        }
    }

    /// A diagnostic at a position in a file.
    pub fn at(path: &Path, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            file: Some(path.to_path_buf()),
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for PackageDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) if self.line > 0 => write!(
                f,
                "{}:{}:{}: {}",
                file.display(),
                self.line,
                self.column,
                self.message
            ),
            Some(file) => write!(f, "{}: {}", file.display(), self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Options for loading packages.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directory patterns are resolved against.
    pub root: PathBuf,
    /// Glob patterns (relative to `root`) for files and directories to skip.
    pub exclude: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            exclude: Vec::new(),
        }
    }
}

impl LoadOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }
}
