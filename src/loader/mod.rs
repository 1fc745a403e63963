// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Go package loading.
//!
//! Resolves patterns to package directories, parses every non-test source
//! file with tree-sitter-go and builds the per-package import graph the
//! generator uses to re-materialize imports.
//!
//! # Example
//!
//! ```rust,ignore
//! use otwgen::loader::{load_packages, print_errors, LoadOptions};
//!
//! let packages = load_packages(&["./...".to_string()], &LoadOptions::new("."))?;
//! if print_errors(&packages) > 0 {
//!     anyhow::bail!("package errors found");
//! }
//! ```
//!
//! # Telemetry
//!
//! - `loader.load_packages` - Whole load
//! - `loader.parse_file` - Parsing of a single file

pub mod parser;
pub mod resolve;
pub mod types;

pub use parser::{GoParser, ParsedFile};
pub use resolve::{default_package_name, find_module, Module};
pub use types::{LoadOptions, Package, PackageDiagnostic, SourceFile};

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error};

use crate::error::LoadError;
#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use resolve::{expand_pattern, go_files, normalize, package_id, PatternMatch};

static PACKAGE_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*package\s+([\p{L}_][\p{L}\p{N}_]*)").expect("valid regex"));

/// Load the packages matched by `patterns`.
///
/// An empty pattern list loads the package in `options.root`. Problems inside
/// a package are collected in [`Package::errors`]; only failures to resolve
/// the patterns themselves are returned as errors.
pub fn load_packages(patterns: &[String], options: &LoadOptions) -> Result<Vec<Package>, LoadError> {
    let start = Instant::now();

    let root = fs::canonicalize(&options.root)
        .map_err(|e| LoadError::PatternNotFound(format!("{}: {}", options.root.display(), e)))?;
    let module = find_module(&root)?;
    let exclude = build_exclude(&options.exclude)?;

    let default_pattern = [".".to_string()];
    let patterns = if patterns.is_empty() {
        &default_pattern[..]
    } else {
        patterns
    };

    let mut seen = HashSet::new();
    let mut matches = Vec::new();
    for pattern in patterns {
        for found in expand_pattern(pattern, &root, module.as_ref())? {
            if is_excluded(&exclude, &root, &found.dir) {
                debug!("Excluded directory {}", found.dir.display());
                continue;
            }
            if seen.insert(found.dir.clone()) {
                matches.push(found);
            }
        }
    }

    let mut parser = GoParser::new()?;
    let mut names = ImportNames::new(module.clone());
    let mut packages = Vec::new();

    for found in &matches {
        let loaded = load_dir(found, &root, module.as_ref(), &exclude, &mut parser, &mut names)?;
        if let Some(package) = loaded {
            debug!(
                "Loaded package {} ({} files, {} errors)",
                package.id,
                package.files.len(),
                package.errors.len()
            );
            packages.push(package);
        }
    }

    #[cfg(feature = "telemetry")]
    GLOBAL_METRICS.record_operation("loader.load_packages", start.elapsed());
    #[cfg(not(feature = "telemetry"))]
    let _ = start;

    if packages.is_empty() {
        return Err(LoadError::NoPackages(patterns.join(" ")));
    }
    Ok(packages)
}

/// Print every package diagnostic to stderr and return how many there were.
pub fn print_errors(packages: &[Package]) -> usize {
    let mut count = 0;
    for package in packages {
        for diagnostic in &package.errors {
            error!(package = %package.id, "{}", diagnostic);
            eprintln!("{}", diagnostic);
            count += 1;
        }
    }
    count
}

fn build_exclude(patterns: &[String]) -> Result<GlobSet, LoadError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| LoadError::InvalidExclude {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| LoadError::InvalidExclude {
        pattern: patterns.join(","),
        message: e.to_string(),
    })
}

fn is_excluded(exclude: &GlobSet, root: &Path, path: &Path) -> bool {
    if exclude.is_empty() {
        return false;
    }
    let rel = path.strip_prefix(root).unwrap_or(path);
    !rel.as_os_str().is_empty() && exclude.is_match(rel)
}

/// Load the package in one directory.
///
/// Returns `None` for directories without Go sources that were only reached
/// by a recursive walk.
fn load_dir(
    found: &PatternMatch,
    root: &Path,
    module: Option<&Module>,
    exclude: &GlobSet,
    parser: &mut GoParser,
    names: &mut ImportNames,
) -> Result<Option<Package>, LoadError> {
    let dir = &found.dir;
    let paths: Vec<PathBuf> = go_files(dir)?
        .into_iter()
        .filter(|p| !is_excluded(exclude, root, p))
        .collect();

    let mut package = Package {
        id: package_id(dir, root, module),
        name: String::new(),
        dir: dir.clone(),
        files: Vec::new(),
        imports: HashMap::new(),
        errors: Vec::new(),
    };

    if paths.is_empty() {
        if !found.explicit {
            return Ok(None);
        }
        package
            .errors
            .push(PackageDiagnostic::new(format!("no Go files in {}", dir.display())));
        return Ok(Some(package));
    }

    let mut first_file = String::new();
    for path in paths {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                package
                    .errors
                    .push(PackageDiagnostic::at(&path, 0, 0, format!("cannot read file: {}", e)));
                continue;
            }
        };

        let parsed = parser.parse_file(&path, &content)?;
        package.errors.extend(parsed.diagnostics);
        let source = SourceFile {
            path,
            syntax: parsed.syntax,
        };

        let clause = source.syntax.package.clone();
        if !clause.is_empty() {
            if package.name.is_empty() {
                package.name = clause;
                first_file = source.file_name();
            } else if package.name != clause {
                package.errors.push(PackageDiagnostic::new(format!(
                    "found packages {} ({}) and {} ({}) in {}",
                    package.name,
                    first_file,
                    clause,
                    source.file_name(),
                    dir.display()
                )));
            }
        }

        for spec in &source.syntax.imports {
            if !package.imports.contains_key(&spec.path) {
                let name = names.resolve(&spec.path);
                package.imports.insert(spec.path.clone(), name);
            }
        }

        package.files.push(source);
    }

    Ok(Some(package))
}

/// Default package names for import paths, cached across packages.
struct ImportNames {
    module: Option<Module>,
    cache: HashMap<String, String>,
}

impl ImportNames {
    fn new(module: Option<Module>) -> Self {
        Self {
            module,
            cache: HashMap::new(),
        }
    }

    fn resolve(&mut self, import_path: &str) -> String {
        if let Some(name) = self.cache.get(import_path) {
            return name.clone();
        }
        let name = self
            .module
            .as_ref()
            .and_then(|m| m.dir_for(import_path))
            .and_then(|dir| read_package_name(&normalize(&dir)))
            .unwrap_or_else(|| default_package_name(import_path));
        self.cache.insert(import_path.to_string(), name.clone());
        name
    }
}

/// Package clause of the first readable Go file in a directory.
fn read_package_name(dir: &Path) -> Option<String> {
    let files = go_files(dir).ok()?;
    files.iter().find_map(|path| {
        let content = fs::read_to_string(path).ok()?;
        PACKAGE_CLAUSE
            .captures(&content)
            .map(|caps| caps[1].to_string())
    })
}
