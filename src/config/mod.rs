// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for otwgen.
//!
//! Handles loading, merging, and validation of configuration from multiple sources:
//! - Global config: ~/.otwgen/config.json
//! - Workspace config: .otwgen.json, .otwgen.yaml, or otwgen.config.json
//! - Local config: .otwgen.local.json (gitignored, for personal overrides)
//! - CLI options: command-line arguments
//!
//! Configuration is merged with precedence (CLI > local > workspace > global > defaults).

mod loader;
mod merger;
mod types;

// Re-export public types
pub use loader::{
    find_workspace_root, get_example_config, get_global_config_dir, get_global_config_path,
    init_config, load_config_file, load_global_config, load_local_config, load_workspace_config,
    save_workspace_config, CONFIG_FILES, GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE, LOCAL_CONFIG_FILE,
};

pub use merger::{default_config, merge_config, CliOptions};

pub use types::{ResolvedConfig, WorkspaceConfig};

use crate::error::ConfigError;
use std::path::Path;

/// Load, merge and validate all configuration sources for a workspace.
pub fn load_config(
    workspace_root: &Path,
    cli_options: CliOptions,
) -> Result<ResolvedConfig, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;
    let local = load_local_config(workspace_root)?;

    let config = merge_config(global, workspace, local, cli_options);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::Grouping;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_with_workspace_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".otwgen.json"),
            r#"{"grouping": "per_package", "channelCapacity": 5}"#,
        )
        .unwrap();

        let config = load_config(temp.path(), CliOptions::default()).unwrap();
        assert_eq!(config.grouping, Grouping::PerPackage);
        assert_eq!(config.channel_capacity, 5);
    }

    #[test]
    fn test_load_config_cli_override() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".otwgen.json"), r#"{"outputDir": "ws"}"#).unwrap();
        std::fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            r#"{"outputDir": "local"}"#,
        )
        .unwrap();

        let config = load_config(temp.path(), CliOptions::default()).unwrap();
        assert_eq!(config.output_dir, "local");

        let cli = CliOptions {
            output_dir: Some("cli".to_string()),
            ..Default::default()
        };
        let config = load_config(temp.path(), cli).unwrap();
        assert_eq!(config.output_dir, "cli"); // CLI wins
    }

    #[test]
    fn test_load_config_invalid_value() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".otwgen.json"),
            r#"{"tracingPackage": "9lives"}"#,
        )
        .unwrap();
        let result = load_config(temp.path(), CliOptions::default());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
