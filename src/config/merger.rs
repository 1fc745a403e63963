// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles merging configurations from different sources with proper precedence.

use crate::generate::Grouping;

use super::types::{ResolvedConfig, WorkspaceConfig};

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub output_dir: Option<String>,
    pub grouping: Option<Grouping>,
    pub parallel_jobs: Option<usize>,
    pub span_name: Option<String>,
    pub tracing_import: Option<String>,
    /// Extra exclude globs, added to the configured ones.
    pub exclude: Vec<String>,
}

/// Default configuration values.
pub fn default_config() -> ResolvedConfig {
    ResolvedConfig::default()
}

/// Merge multiple configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Local config (.otwgen.local.json)
/// 3. Workspace config (.otwgen.json)
/// 4. Global config (~/.otwgen/config.json)
/// 5. Default values
///
/// Exclude lists accumulate across sources. The channel capacity follows the
/// job count unless some source sets it explicitly.
pub fn merge_config(
    global: Option<WorkspaceConfig>,
    workspace: Option<WorkspaceConfig>,
    local: Option<WorkspaceConfig>,
    cli: CliOptions,
) -> ResolvedConfig {
    let mut result = default_config();
    let mut capacity = None;

    for config in [global, workspace, local].into_iter().flatten() {
        apply_workspace_config(&mut result, &config);
        if config.channel_capacity.is_some() {
            capacity = config.channel_capacity;
        }
    }

    // Apply CLI options (highest precedence)
    apply_cli_options(&mut result, &cli);

    result.channel_capacity = capacity.unwrap_or(result.parallel_jobs.max(1) * 2);
    result
}

fn apply_workspace_config(result: &mut ResolvedConfig, config: &WorkspaceConfig) {
    if let Some(ref output_dir) = config.output_dir {
        result.output_dir = output_dir.clone();
    }

    if let Some(grouping) = config.grouping {
        result.grouping = grouping;
    }

    if let Some(ref tracing_import) = config.tracing_import {
        result.tracing_import = tracing_import.clone();
    }

    if config.tracing_package.is_some() {
        result.tracing_package = config.tracing_package.clone();
    }

    if let Some(ref span_name) = config.span_name {
        result.span_name = span_name.clone();
    }

    if let Some(jobs) = config.parallel_jobs {
        result.parallel_jobs = jobs;
    }

    if let Some(ref exclude) = config.exclude {
        merge_excludes(result, exclude);
    }
}

fn apply_cli_options(result: &mut ResolvedConfig, cli: &CliOptions) {
    if let Some(ref output_dir) = cli.output_dir {
        result.output_dir = output_dir.clone();
    }

    if let Some(grouping) = cli.grouping {
        result.grouping = grouping;
    }

    if let Some(jobs) = cli.parallel_jobs {
        result.parallel_jobs = jobs;
    }

    if let Some(ref span_name) = cli.span_name {
        result.span_name = span_name.clone();
    }

    if let Some(ref tracing_import) = cli.tracing_import {
        result.tracing_import = tracing_import.clone();
    }

    merge_excludes(result, &cli.exclude);
}

fn merge_excludes(result: &mut ResolvedConfig, exclude: &[String]) {
    for pattern in exclude {
        if !result.exclude.contains(pattern) {
            result.exclude.push(pattern.clone());
        }
    }
}
