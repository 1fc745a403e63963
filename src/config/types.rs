// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Defines the structure of workspace and resolved configuration,
//! supporting JSON and YAML formats.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::generate::{
    GenerateOptions, Grouping, TracingTarget, DEFAULT_SPAN_NAME, DEFAULT_TRACING_IMPORT,
};

/// Workspace configuration for otwgen.
/// Can be defined in .otwgen.json or .otwgen.yaml in the project root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Directory generated files are written to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,

    /// One output file per source file or per package.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping: Option<Grouping>,

    /// Import path of the tracing package.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracing_import: Option<String>,

    /// Identifier for the tracing package (defaults to its package name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracing_package: Option<String>,

    /// Annotation passed to every generated span.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_name: Option<String>,

    /// Number of generator workers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_jobs: Option<usize>,

    /// Capacity of the work handoff channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_capacity: Option<usize>,

    /// Glob patterns for files and directories to skip while loading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

/// Resolved configuration with all values set.
/// This is the merged result of global, workspace, local, and CLI configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub output_dir: String,
    pub grouping: Grouping,
    pub tracing_import: String,
    pub tracing_package: Option<String>,
    pub span_name: String,
    pub parallel_jobs: usize,
    pub channel_capacity: usize,
    pub exclude: Vec<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let parallel_jobs = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            output_dir: ".".to_string(),
            grouping: Grouping::default(),
            tracing_import: DEFAULT_TRACING_IMPORT.to_string(),
            tracing_package: None,
            span_name: DEFAULT_SPAN_NAME.to_string(),
            parallel_jobs,
            channel_capacity: parallel_jobs * 2,
            exclude: Vec::new(),
        }
    }
}

impl ResolvedConfig {
    /// Output directory as a path.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }

    /// Tracing package the generated code calls.
    pub fn tracing_target(&self) -> TracingTarget {
        let mut target = TracingTarget::new(&self.tracing_import, &self.span_name);
        if let Some(package) = &self.tracing_package {
            target.package = package.clone();
        }
        target
    }

    /// Options for the generation pipeline.
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            tracing: self.tracing_target(),
            grouping: self.grouping,
            workers: self.parallel_jobs.max(1),
            channel_capacity: self.channel_capacity.max(1),
        }
    }

    /// Reject values that would produce broken output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracing_import.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tracingImport".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if let Some(package) = &self.tracing_package {
            let valid = package
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_')
                && package.chars().all(|c| c.is_alphanumeric() || c == '_');
            if !valid {
                return Err(ConfigError::InvalidValue {
                    field: "tracingPackage".to_string(),
                    message: format!("'{}' is not a Go identifier", package),
                });
            }
        }
        if self.output_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "outputDir".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_config_json() {
        let config: WorkspaceConfig = serde_json::from_str(
            r#"{"outputDir": "wrapped", "grouping": "per_package", "parallelJobs": 2}"#,
        )
        .unwrap();
        assert_eq!(config.output_dir, Some("wrapped".to_string()));
        assert_eq!(config.grouping, Some(Grouping::PerPackage));
        assert_eq!(config.parallel_jobs, Some(2));
        assert!(config.span_name.is_none());
    }

    #[test]
    fn test_workspace_config_yaml() {
        let config: WorkspaceConfig = serde_yaml::from_str(
            "spanName: traced\nexclude:\n  - \"gen/**\"\n",
        )
        .unwrap();
        assert_eq!(config.span_name, Some("traced".to_string()));
        assert_eq!(config.exclude, Some(vec!["gen/**".to_string()]));
    }

    #[test]
    fn test_workspace_config_skips_none() {
        let json = serde_json::to_string(&WorkspaceConfig::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_resolved_defaults() {
        let config = ResolvedConfig::default();
        assert_eq!(config.output_dir, ".");
        assert_eq!(config.grouping, Grouping::PerFile);
        assert_eq!(config.channel_capacity, config.parallel_jobs * 2);
        assert!(config.validate().is_ok());

        let target = config.tracing_target();
        assert_eq!(target.package, "trace");
        assert_eq!(target.span_name, "auto generated span");
    }

    #[test]
    fn test_generate_options_clamps() {
        let config = ResolvedConfig {
            parallel_jobs: 0,
            channel_capacity: 0,
            tracing_package: Some("octrace".to_string()),
            ..Default::default()
        };
        let options = config.generate_options();
        assert_eq!(options.workers, 1);
        assert_eq!(options.channel_capacity, 1);
        assert_eq!(options.tracing.package, "octrace");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ResolvedConfig {
            tracing_package: Some("not-an-ident".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let config = ResolvedConfig {
            tracing_import: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
