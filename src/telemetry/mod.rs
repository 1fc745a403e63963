// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry, tracing, and metrics infrastructure.
//!
//! - **Tracing**: structured logging through `tracing-subscriber`, filtered by
//!   `RUST_LOG` or the `--verbose`/`--debug` flags, written to stderr
//! - **Metrics**: operation timings and wrapper counts, printed by `--stats`
//!   when the guard drops
//!
//! # Usage
//!
//! ```rust,ignore
//! use otwgen::telemetry::{init_telemetry, TelemetryConfig};
//!
//! // --verbose, no --debug, --stats
//! let _guard = init_telemetry(&TelemetryConfig::from_flags(true, false, true))?;
//! ```
//!
//! Loader and generator stages record their timings when the `telemetry`
//! feature is enabled:
//!
//! ```rust,ignore
//! #[cfg(feature = "telemetry")]
//! GLOBAL_METRICS.record_operation("loader.parse_file", start.elapsed());
//! ```

mod init;
pub mod metrics;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use metrics::{
    Histogram, Metrics, MetricsSnapshot, OperationMetrics, WrapCounts, GLOBAL_METRICS,
};
