// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tracing wrapper generation.
//!
//! For every exported function and method taking a `context.Context`, and
//! every exported type, a wrapper is synthesized that delegates to the
//! original while opening a tracing span around the call.
//!
//! # Architecture
//!
//! ```text
//! packages ─▶ producer ─▶ [work units] ─▶ workers ─▶ [files] ─▶ caller
//!                                          │
//!               plan ─▶ filter ─▶ synth ─▶ imports ─▶ assemble
//! ```
//!
//! Units of one package share a [`PackagePlan`] computed up front, so names
//! stay unique and types stay defined across all of the package's output
//! files.
//!
//! # Example
//!
//! ```rust,ignore
//! use otwgen::generate::{generate_all, GenerateOptions};
//!
//! let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
//! for file in generate_all(packages, GenerateOptions::default(), cancel_rx).await {
//!     println!("{}", file.render());
//! }
//! ```
//!
//! # Telemetry
//!
//! - `generate.assemble` - Building one file
//! - `generate.pipeline.run` - Whole pipeline run
//! - wrap counters per declaration kind and an emitted files counter

pub mod assemble;
pub mod filter;
pub mod imports;
pub mod pipeline;
pub mod plan;
pub mod synth;
pub mod types;

pub use assemble::assemble;
pub use filter::{has_context_param, is_wrappable, receiver_is_exported};
pub use imports::{local_names, ImportSet};
pub use pipeline::{generate_all, Pipeline, PipelineState};
pub use plan::{PackagePlan, Placement};
pub use synth::{fixed_names, span_statements, Synthesizer};
pub use types::{
    Declaration, GenerateOptions, GeneratedFile, Grouping, TracingTarget, WorkUnit, WrapperDecl,
    DEFAULT_SPAN_NAME, DEFAULT_TRACING_IMPORT,
};
