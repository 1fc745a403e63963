// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Concurrent generation pipeline.
//!
//! A producer task feeds work units into a bounded channel, a fixed pool of
//! workers turns them into [`GeneratedFile`]s, and a coordinator closes the
//! output channel once every worker has finished. Every blocking channel
//! operation also watches the cancellation signal.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::loader::Package;
#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::assemble::assemble;
use super::types::{GenerateOptions, GeneratedFile, Grouping, TracingTarget, WorkUnit};

/// Lifecycle of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    Idle = 0,
    /// Work units are being handed to workers.
    Dispatching = 1,
    /// All units are dispatched; workers are finishing.
    Draining = 2,
    /// Output channel closed.
    Closed = 3,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Dispatching,
            2 => Self::Draining,
            _ => Self::Closed,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Dispatching => write!(f, "dispatching"),
            Self::Draining => write!(f, "draining"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Generation pipeline over loaded packages.
pub struct Pipeline {
    options: GenerateOptions,
    state: Arc<AtomicU8>,
}

impl Pipeline {
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            state: Arc::new(AtomicU8::new(PipelineState::Idle as u8)),
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Start the pipeline and return the output stream.
    ///
    /// Files arrive in no particular order. The stream ends when all work is
    /// done or `cancel` becomes `true`. A pipeline runs once; later calls
    /// return an already closed stream. Must be called within a tokio
    /// runtime.
    pub fn run(
        &self,
        packages: Vec<Package>,
        cancel: watch::Receiver<bool>,
    ) -> mpsc::Receiver<GeneratedFile> {
        let workers = self.options.workers.max(1);
        let capacity = self.options.channel_capacity.max(1);
        let (out_tx, out_rx) = mpsc::channel::<GeneratedFile>(capacity);

        if self
            .state
            .compare_exchange(
                PipelineState::Idle as u8,
                PipelineState::Dispatching as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            warn!("Pipeline already started, ignoring run");
            return out_rx;
        }

        let start = Instant::now();
        debug!(
            "Pipeline dispatching {} packages to {} workers",
            packages.len(),
            workers
        );

        let (work_tx, work_rx) = mpsc::channel::<WorkUnit>(capacity);
        let work_rx = Arc::new(Mutex::new(work_rx));

        let producer = tokio::spawn(produce(
            packages.into_iter().map(Arc::new).collect(),
            self.options.grouping,
            work_tx,
            cancel.clone(),
        ));

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            handles.push(tokio::spawn(work(
                id,
                Arc::clone(&work_rx),
                out_tx.clone(),
                cancel.clone(),
                self.options.tracing.clone(),
            )));
        }

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            join_or_abort(producer).await;
            state.store(PipelineState::Draining as u8, Ordering::SeqCst);
            debug!("Pipeline draining");

            for handle in handles {
                join_or_abort(handle).await;
            }

            state.store(PipelineState::Closed as u8, Ordering::SeqCst);
            drop(out_tx);
            debug!("Pipeline closed after {:?}", start.elapsed());

            #[cfg(feature = "telemetry")]
            GLOBAL_METRICS.record_operation("generate.pipeline.run", start.elapsed());
        });

        out_rx
    }
}

/// Run the pipeline to completion and collect its files, sorted by source
/// package and file name.
pub async fn generate_all(
    packages: Vec<Package>,
    options: GenerateOptions,
    cancel: watch::Receiver<bool>,
) -> Vec<GeneratedFile> {
    let pipeline = Pipeline::new(options);
    let mut rx = pipeline.run(packages, cancel);

    let mut files = Vec::new();
    while let Some(file) = rx.recv().await {
        files.push(file);
    }
    files.sort_by(|a, b| (&a.source, &a.name).cmp(&(&b.source, &b.name)));
    files
}

/// Resolve once the cancellation signal is `true`.
///
/// A dropped sender can no longer cancel, so this then never resolves.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// A panicking task means a broken invariant; there is nothing to recover.
async fn join_or_abort(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        if e.is_panic() {
            error!("Pipeline task panicked: {}", e);
            std::process::abort();
        }
    }
}

async fn produce(
    packages: Vec<Arc<Package>>,
    grouping: Grouping,
    tx: mpsc::Sender<WorkUnit>,
    mut cancel: watch::Receiver<bool>,
) {
    for package in packages {
        if package.is_command() {
            warn!("Skipping command package {}", package.id);
            continue;
        }
        for unit in WorkUnit::for_package(package, grouping) {
            tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => {
                    debug!("Producer cancelled");
                    return;
                }
                res = tx.send(unit) => {
                    if res.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

async fn work(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<WorkUnit>>>,
    tx: mpsc::Sender<GeneratedFile>,
    mut cancel: watch::Receiver<bool>,
    tracing: TracingTarget,
) {
    loop {
        let unit = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                debug!("Worker {} cancelled", id);
                return;
            }
            unit = async { rx.lock().await.recv().await } => unit,
        };
        let Some(unit) = unit else {
            return;
        };

        let Some(file) = assemble(&unit, &tracing) else {
            continue;
        };
        debug!("Worker {} generated {} for {}", id, file.name, file.source);

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_file_emitted();

        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                debug!("Worker {} cancelled", id);
                return;
            }
            res = tx.send(file) => {
                if res.is_err() {
                    return;
                }
            }
        }
    }
}
