// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Subscriber setup for the command line.
//!
//! Everything is written to stderr; stdout carries generated source only.

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::metrics::GLOBAL_METRICS;

/// What the CLI reports on stderr, derived from its global flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Level for otwgen's own events when `RUST_LOG` is unset.
    pub level: Level,
    /// Include target, file and line in each event.
    pub source_locations: bool,
    /// Print the metrics report when the guard is dropped.
    pub report_stats: bool,
    pub ansi: bool,
}

impl TelemetryConfig {
    /// `--debug` wins over `--verbose`; without either only warnings show.
    pub fn from_flags(verbose: bool, debug: bool, stats: bool) -> Self {
        let level = if debug {
            Level::DEBUG
        } else if verbose {
            Level::INFO
        } else {
            Level::WARN
        };
        Self {
            level,
            source_locations: debug,
            report_stats: stats,
            ansi: io::stderr().is_terminal(),
        }
    }

    /// Filter used when `RUST_LOG` is unset. Dependencies stay at `warn`.
    pub fn directive(&self) -> String {
        format!("warn,otwgen={}", self.level.to_string().to_lowercase())
    }
}

/// Returned by [`init_telemetry`]; hold it until the command finishes.
#[must_use]
pub struct TelemetryGuard {
    report_stats: bool,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.report_stats {
            eprintln!("{}", GLOBAL_METRICS.snapshot().format_report());
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> io::Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directive()));

    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.ansi)
        .with_target(config.source_locations)
        .with_file(config.source_locations)
        .with_line_number(config.source_locations);

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.source_locations {
        registry.with(layer).try_init()
    } else {
        registry.with(layer.compact()).try_init()
    };
    installed.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    Ok(TelemetryGuard {
        report_stats: config.report_stats,
    })
}
