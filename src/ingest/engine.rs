//! Bounded concurrent dispatch of a batch of items.
//!
//! # Concurrency Model
//!
//! - Each item runs in its own Tokio task
//! - Every `dispatch` call owns its own semaphore, so concurrent batches do
//!   not share slots
//! - A semaphore permit is acquired before spawning and held until the item
//!   reaches a terminal state, so fetch, parse, write and retry waits all
//!   count against the limit
//! - Outcomes go over an mpsc channel to one collector task that owns the
//!   [`ResultAggregator`]
//! - `dispatch` returns only after every task has finished

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, instrument, warn};

use super::error::{EngineError, ItemError};
use super::processor::ItemProcessor;
use super::report::{IngestReport, ItemOutcome, ResultAggregator};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 32;

/// In-flight item limit used by the service.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// One ingestion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Repository identifier passed to the content source.
    pub repository: String,
    /// Item names in submission order.
    pub items: Vec<String>,
}

impl Batch {
    pub fn new(repository: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            repository: repository.into(),
            items,
        }
    }

    /// Item names with repeats removed, first occurrence kept.
    #[must_use]
    pub fn unique_items(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|item| seen.insert(item.as_str()))
            .cloned()
            .collect()
    }
}

/// Fans a batch out over a fixed number of concurrent item pipelines.
///
/// The limit applies per [`dispatch`](Self::dispatch) call.
#[derive(Debug)]
pub struct IngestEngine {
    concurrency: usize,
    processor: Arc<ItemProcessor>,
}

impl IngestEngine {
    /// Creates an engine running at most `concurrency` items at once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] outside
    /// `MIN_CONCURRENCY..=MAX_CONCURRENCY`.
    #[instrument(level = "debug", skip(processor))]
    pub fn new(concurrency: usize, processor: ItemProcessor) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency {
                value: concurrency,
                min: MIN_CONCURRENCY,
                max: MAX_CONCURRENCY,
            });
        }

        debug!(
            concurrency,
            max_attempts = processor.retry_policy().max_attempts(),
            "creating ingest engine"
        );

        Ok(Self {
            concurrency,
            processor: Arc::new(processor),
        })
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Processes every item in `batch` and returns the combined report.
    ///
    /// Item failures never fail the call. The report holds exactly one
    /// entry per distinct item name.
    #[instrument(skip(self, batch), fields(repository = %batch.repository, items = batch.items.len()))]
    pub async fn dispatch(&self, batch: &Batch) -> IngestReport {
        let items = batch.unique_items();
        if items.len() < batch.items.len() {
            debug!(
                duplicates = batch.items.len() - items.len(),
                "dropping repeated item names"
            );
        }
        info!(items = items.len(), "starting batch");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let (tx, mut rx) = mpsc::channel::<ItemOutcome>(items.len().max(1));
        let collector = tokio::spawn(async move {
            let mut aggregator = ResultAggregator::new();
            while let Some(outcome) = rx.recv().await {
                aggregator.record(outcome);
            }
            aggregator
        });

        let mut handles = Vec::with_capacity(items.len());
        for item in &items {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    let error = ItemError::aborted("admission gate closed");
                    send_outcome(&tx, failed(item, &error)).await;
                    continue;
                }
            };

            let processor = Arc::clone(&self.processor);
            let repository = batch.repository.clone();
            let task_item = item.clone();
            let task_tx = tx.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let outcome = match processor.process(&repository, &task_item).await {
                    Ok(_) => ItemOutcome::Succeeded { item: task_item },
                    Err(error) => {
                        warn!(item = %task_item, error = %error, "item failed");
                        failed(&task_item, &error)
                    }
                };
                send_outcome(&task_tx, outcome).await;
            });
            handles.push((item.clone(), handle));
        }

        debug!(task_count = handles.len(), "waiting for items to complete");

        for (item, handle) in handles {
            if let Err(e) = handle.await {
                warn!(item = %item, error = %e, "item task panicked");
                let error = ItemError::aborted(format!("task panicked: {e}"));
                send_outcome(&tx, failed(&item, &error)).await;
            }
        }
        drop(tx);

        let mut aggregator = match collector.await {
            Ok(aggregator) => aggregator,
            Err(e) => {
                warn!(error = %e, "result collector failed");
                ResultAggregator::new()
            }
        };

        for item in &items {
            if !aggregator.contains(item) {
                let error = ItemError::aborted("no outcome recorded");
                aggregator.record(failed(item, &error));
            }
        }

        let report = aggregator.finish();
        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch complete"
        );
        report
    }
}

fn failed(item: &str, error: &ItemError) -> ItemOutcome {
    ItemOutcome::Failed {
        item: item.to_string(),
        error: error.to_string(),
    }
}

async fn send_outcome(tx: &mpsc::Sender<ItemOutcome>, outcome: ItemOutcome) {
    if let Err(e) = tx.send(outcome).await {
        warn!(item = e.0.item(), "result collector is gone, outcome dropped");
    }
}
