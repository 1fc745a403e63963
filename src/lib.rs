// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! otwgen - tracing wrappers for Go packages.
//!
//! Loads Go packages, finds the exported functions and methods that take a
//! `context.Context`, and writes new Go files that re-export them with a
//! tracing span around every call.
//!
//! # Architecture
//!
//! - [`syntax`] - Go syntax model and printer
//! - [`loader`] - package discovery and tree-sitter parsing
//! - [`generate`] - eligibility, synthesis, imports, assembly and the worker pipeline
//! - [`output`] - writing or printing generated files
//! - [`config`] - configuration loading and merging
//! - [`telemetry`] - tracing subscriber setup and metrics
//! - [`error`] - error types and result aliases
//!
//! # Example
//!
//! ```rust,ignore
//! use otwgen::generate::{generate_all, GenerateOptions};
//! use otwgen::loader::{load_packages, LoadOptions};
//!
//! let packages = load_packages(&["./...".to_string()], &LoadOptions::new("."))?;
//! let (_tx, cancel) = tokio::sync::watch::channel(false);
//! for file in generate_all(packages, GenerateOptions::default(), cancel).await {
//!     println!("{}", file.render());
//! }
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod loader;
pub mod output;
pub mod syntax;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use error::{ConfigError, GenerateError, LoadError, Result};
pub use generate::{GenerateOptions, GeneratedFile, Grouping, Pipeline, TracingTarget};
pub use loader::{LoadOptions, Package};

/// otwgen version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_exports() {
        let options = GenerateOptions::default();
        assert!(options.workers >= 1);
        assert_eq!(options.grouping, Grouping::PerFile);
        assert_eq!(TracingTarget::default().package, "trace");
    }
}
