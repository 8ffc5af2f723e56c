//! Batch outcome collection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Terminal result of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Every record for the item was committed.
    Succeeded {
        /// Item name.
        item: String,
    },
    /// The item failed; nothing from it was kept.
    Failed {
        /// Item name.
        item: String,
        /// Human-readable, stage-classified error text.
        error: String,
    },
}

impl ItemOutcome {
    /// Item name this outcome belongs to.
    #[must_use]
    pub fn item(&self) -> &str {
        match self {
            Self::Succeeded { item } | Self::Failed { item, .. } => item,
        }
    }
}

/// One failed item in an [`IngestReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
}

/// Per-batch report: every submitted item appears in exactly one list.
///
/// List order follows completion order, not submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

impl IngestReport {
    /// Number of items covered by the report.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Error text recorded for `item`, if it failed.
    #[must_use]
    pub fn error_for(&self, item: &str) -> Option<&str> {
        self.failed
            .iter()
            .find(|failure| failure.item == item)
            .map(|failure| failure.error.as_str())
    }
}

/// Folds item outcomes into an [`IngestReport`].
///
/// Owned by a single collector; producers reach it through a channel, so no
/// locking is involved. A second outcome for the same item is dropped.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    seen: HashSet<String>,
    report: IngestReport,
}

impl ResultAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome. Returns false if the item already had one.
    pub fn record(&mut self, outcome: ItemOutcome) -> bool {
        if !self.seen.insert(outcome.item().to_string()) {
            warn!(item = outcome.item(), "duplicate outcome ignored");
            return false;
        }
        match outcome {
            ItemOutcome::Succeeded { item } => self.report.succeeded.push(item),
            ItemOutcome::Failed { item, error } => {
                self.report.failed.push(ItemFailure { item, error });
            }
        }
        true
    }

    /// Whether an outcome for `item` has been recorded.
    #[must_use]
    pub fn contains(&self, item: &str) -> bool {
        self.seen.contains(item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Consumes the aggregator and returns the report.
    #[must_use]
    pub fn finish(self) -> IngestReport {
        self.report
    }
}
