// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Types for wrapper generation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::loader::Package;
use crate::syntax::{print_file, Decl, File, FuncDecl, TypeSpec};

use super::plan::PackagePlan;

/// Default tracing package import path.
pub const DEFAULT_TRACING_IMPORT: &str = "go.opencensus.io/trace";

/// Default annotation given to every generated span.
pub const DEFAULT_SPAN_NAME: &str = "auto generated span";

/// A source declaration, classified once.
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    Function(&'a FuncDecl),
    Method(&'a FuncDecl),
    Type(&'a TypeSpec),
}

impl<'a> Declaration<'a> {
    /// Classify a top-level declaration.
    pub fn from_decl(decl: &'a Decl) -> Self {
        match decl {
            Decl::Func(func) if func.is_method() => Self::Method(func),
            Decl::Func(func) => Self::Function(func),
            Decl::Type(spec) => Self::Type(spec),
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Self::Function(func) | Self::Method(func) => &func.name,
            Self::Type(spec) => &spec.name,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Function(_) => "function",
            Self::Method(_) => "method",
            Self::Type(_) => "type",
        }
    }
}

/// A synthesized wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperDecl {
    Function(FuncDecl),
    Method(FuncDecl),
    /// Wrapper struct plus its `New<Name>` constructor.
    Type {
        wrapper: TypeSpec,
        constructor: FuncDecl,
    },
}

impl WrapperDecl {
    /// Whether this wrapper delegates a call (function or method).
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Method(_))
    }

    /// Top-level declarations in output order.
    pub fn into_decls(self) -> Vec<Decl> {
        match self {
            Self::Function(func) | Self::Method(func) => vec![Decl::Func(func)],
            Self::Type {
                wrapper,
                constructor,
            } => vec![Decl::Type(wrapper), Decl::Func(constructor)],
        }
    }
}

/// How generated declarations are grouped into files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// One output file per source file, named after it.
    #[default]
    PerFile,
    /// One output file per package, named `<package>.go`.
    PerPackage,
}

impl std::fmt::Display for Grouping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerFile => write!(f, "per_file"),
            Self::PerPackage => write!(f, "per_package"),
        }
    }
}

impl std::str::FromStr for Grouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_file" | "per-file" | "file" => Ok(Self::PerFile),
            "per_package" | "per-package" | "package" => Ok(Self::PerPackage),
            other => Err(format!("unknown grouping '{}'", other)),
        }
    }
}

/// The tracing package generated code calls into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingTarget {
    /// Import path of the tracing package.
    pub import_path: String,
    /// Identifier the package is referred to by.
    pub package: String,
    /// Annotation passed to `StartSpan`.
    pub span_name: String,
}

impl Default for TracingTarget {
    fn default() -> Self {
        Self {
            import_path: DEFAULT_TRACING_IMPORT.to_string(),
            package: "trace".to_string(),
            span_name: DEFAULT_SPAN_NAME.to_string(),
        }
    }
}

impl TracingTarget {
    /// Target for a custom import path; the identifier is derived from it.
    pub fn new(import_path: impl Into<String>, span_name: impl Into<String>) -> Self {
        let import_path = import_path.into();
        Self {
            package: crate::loader::default_package_name(&import_path),
            import_path,
            span_name: span_name.into(),
        }
    }
}

/// A generated wrapper file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Output file name (base name only).
    pub name: String,
    /// Import path of the wrapped package.
    pub source: String,
    pub file: File,
    /// Number of wrapped functions and methods.
    pub callables: usize,
}

impl GeneratedFile {
    /// Render the file as Go source.
    pub fn render(&self) -> String {
        print_file(&self.file)
    }
}

/// Options for the generation pipeline.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub tracing: TracingTarget,
    pub grouping: Grouping,
    /// Worker task count; 0 is treated as 1.
    pub workers: usize,
    /// Capacity of the work handoff channel; 0 is treated as 1.
    pub channel_capacity: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            tracing: TracingTarget::default(),
            grouping: Grouping::default(),
            workers,
            channel_capacity: workers * 2,
        }
    }
}

/// One unit of work: a package, or a subset of its files.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    /// Output file name.
    pub name: String,
    pub package: Arc<Package>,
    /// Indices into `package.files`, in source order.
    pub files: Vec<usize>,
    /// Position among the package's units.
    pub index: usize,
    /// Placement shared by every unit of the package.
    pub plan: Arc<PackagePlan>,
}

impl WorkUnit {
    /// Build the units for a package under the given grouping.
    pub fn for_package(package: Arc<Package>, grouping: Grouping) -> Vec<WorkUnit> {
        let plan = Arc::new(PackagePlan::new(&package, grouping));
        match grouping {
            Grouping::PerPackage => vec![WorkUnit {
                name: format!("{}.go", package.name),
                files: (0..package.files.len()).collect(),
                index: 0,
                plan,
                package,
            }],
            Grouping::PerFile => (0..package.files.len())
                .map(|i| WorkUnit {
                    name: package.files[i].file_name(),
                    files: vec![i],
                    index: i,
                    plan: Arc::clone(&plan),
                    package: Arc::clone(&package),
                })
                .collect(),
        }
    }
}
