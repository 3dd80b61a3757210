use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};
use tokio::sync::{mpsc, Semaphore};

use crate::config::FetchConfig;
use crate::error::AppError;
use crate::records::{BatchReport, ChannelFault, IdentifierReport};

use super::channel::ChannelFactory;
use super::fan_out::{fan_out, OutcomeSet};
use super::fold::fold_outcomes;
use super::racer::FailureReason;
use super::{ensure_concurrency_limit, FetchResult};

/// Emitted once per identifier as it settles. `completed` counts up from 1 to `total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub identifier: String,
    pub produced_report: bool,
}

struct Settled {
    index: usize,
    report: Option<IdentifierReport>,
    faults: Vec<ChannelFault>,
    open_failures: usize,
    last_open_error: Option<String>,
}

/// Runs the fan-out for a whole identifier list with a fixed worker budget, exposing a shared
/// progress counter and an optional progress event stream.
pub struct BatchDriver<F> {
    pub identifiers: Vec<String>,
    pub factory: F,
    pub config: FetchConfig,
    pub progress_counter: Arc<AtomicUsize>,
    pub total: usize,
    concurrency_limit: usize,
    progress_tx: Option<mpsc::UnboundedSender<BatchProgress>>,
}

impl<F: ChannelFactory> BatchDriver<F> {
    pub fn new(identifiers: Vec<String>, factory: F, config: FetchConfig) -> Self {
        let total = identifiers.len();
        let concurrency_limit = ensure_concurrency_limit(config.concurrency_limit);
        Self {
            identifiers,
            factory,
            config,
            progress_counter: Arc::new(AtomicUsize::new(0)),
            total,
            concurrency_limit,
            progress_tx: None,
        }
    }

    /// Subscribe to per-identifier progress events. Replaces any earlier subscriber.
    pub fn progress_events(&mut self) -> mpsc::UnboundedReceiver<BatchProgress> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.progress_tx = Some(tx);
        rx
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Process every identifier, at most `concurrency_limit` at a time, and assemble the
    /// report in input order. Identifiers whose baseline failed are left out.
    ///
    /// Errors only when the worker pool breaks or when not a single channel could be opened
    /// for a non-empty batch.
    pub async fn run(&self) -> FetchResult<BatchReport> {
        let concurrency_limit = self.concurrency_limit;
        let semaphore = Arc::new(Semaphore::new(concurrency_limit));
        let progress_counter = Arc::clone(&self.progress_counter);

        progress_counter.store(0, Ordering::SeqCst);

        if self.identifiers.is_empty() {
            return Ok(BatchReport::default());
        }

        let started = Instant::now();
        info!(
            "Fetching data for {} identifiers ({} at a time)...",
            self.total, concurrency_limit
        );

        let mut settled: Vec<Settled> = stream::iter(self.identifiers.iter().enumerate())
            .map(|(index, identifier)| {
                let semaphore = Arc::clone(&semaphore);
                let progress_counter = Arc::clone(&progress_counter);
                let this = self;
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| AppError::message("batch worker pool closed"))?;

                    let outcomes = fan_out(&this.factory, identifier, &this.config).await;
                    let settled = settle(index, &outcomes);

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    info!(
                        "[{}/{}] {} ({:.1?})",
                        completed,
                        this.total,
                        identifier,
                        started.elapsed()
                    );
                    this.emit(BatchProgress {
                        completed,
                        total: this.total,
                        identifier: identifier.clone(),
                        produced_report: settled.report.is_some(),
                    });

                    Ok::<_, AppError>(settled)
                }
            })
            .buffer_unordered(concurrency_limit)
            .try_collect()
            .await?;

        settled.sort_by_key(|entry| entry.index);

        let attempted = settled.len() * super::FIXED_OFFSETS.len();
        let open_failures: usize = settled.iter().map(|entry| entry.open_failures).sum();
        if open_failures == attempted {
            let reason = settled
                .iter()
                .rev()
                .find_map(|entry| entry.last_open_error.clone())
                .unwrap_or_default();
            return Err(AppError::SourceUnavailable(reason));
        }

        let mut records = Vec::with_capacity(settled.len());
        let mut faults = Vec::new();
        for entry in settled {
            records.extend(entry.report);
            faults.extend(entry.faults);
        }

        info!(
            "Fetched {} of {} identifiers in {:.1?}",
            records.len(),
            self.total,
            started.elapsed()
        );

        Ok(BatchReport::new(records, faults))
    }

    fn emit(&self, progress: BatchProgress) {
        if let Some(tx) = &self.progress_tx {
            if tx.send(progress).is_err() {
                debug!("progress receiver dropped");
            }
        }
    }
}

fn settle(index: usize, outcomes: &OutcomeSet) -> Settled {
    let mut faults = Vec::new();
    let mut open_failures = 0;
    let mut last_open_error = None;

    for outcome in outcomes.iter() {
        match outcome.failure_reason() {
            Some(FailureReason::Remote(text)) => faults.push(ChannelFault {
                identifier: outcomes.identifier().to_string(),
                offset: outcome.offset(),
                reason: text.clone(),
            }),
            Some(FailureReason::Open(text)) => {
                open_failures += 1;
                last_open_error = Some(text.clone());
            }
            _ => {}
        }
    }

    Settled {
        index,
        report: fold_outcomes(outcomes),
        faults,
        open_failures,
        last_open_error,
    }
}
