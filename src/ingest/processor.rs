//! Per-item pipeline: fetch, parse, then write, with bounded retry.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use super::error::ItemError;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::fetch::ContentSource;
use crate::parser::parse_report;
use crate::store::{ItemWrite, ScanWriter};

/// What a successful item produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedItem {
    /// Scan rows committed.
    pub scans: usize,
    /// Finding rows committed.
    pub findings: usize,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Runs the fetch → parse → write sequence for one item at a time.
///
/// Stages run strictly in order. Only a transient write failure starts a
/// new attempt, and every attempt repeats the whole sequence so the write
/// always sees freshly fetched content.
pub struct ItemProcessor {
    source: Arc<dyn ContentSource>,
    writer: Arc<dyn ScanWriter>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ItemProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemProcessor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ItemProcessor {
    #[must_use]
    pub fn new(
        source: Arc<dyn ContentSource>,
        writer: Arc<dyn ScanWriter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            source,
            writer,
            policy,
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Processes one item to a terminal state.
    ///
    /// # Errors
    ///
    /// - [`ItemError::Fetch`] / [`ItemError::Parse`] on the first such failure
    /// - [`ItemError::Write`] for a permanent write failure
    /// - [`ItemError::Exhausted`] when transient write failures used up the budget
    #[instrument(skip(self), fields(max_attempts = self.policy.max_attempts()))]
    pub async fn process(&self, repository: &str, item: &str) -> Result<ProcessedItem, ItemError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "starting attempt");

            match self.run_attempt(repository, item).await {
                Ok((scans, findings)) => {
                    info!(attempt, scans, findings, "item ingested");
                    return Ok(ProcessedItem {
                        scans,
                        findings,
                        attempts: attempt,
                    });
                }
                Err(error) => match self.policy.should_retry(classify_error(&error), attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next_attempt,
                    } => {
                        info!(
                            next_attempt,
                            delay_ms = delay.as_millis(),
                            error = %error,
                            "retrying item after transient failure"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::DoNotRetry { reason, exhausted } => {
                        debug!(%reason, error = %error, "not retrying item");
                        return Err(if exhausted {
                            ItemError::exhausted(attempt, error)
                        } else {
                            error
                        });
                    }
                },
            }
        }
    }

    async fn run_attempt(&self, repository: &str, item: &str) -> Result<(usize, usize), ItemError> {
        let raw = self.source.fetch(repository, item).await?;
        let records = parse_report(&raw)?;
        drop(raw);

        let summary = self
            .writer
            .write_item(&ItemWrite {
                repository,
                item,
                captured_at: Utc::now(),
                records: &records,
            })
            .await?;

        Ok((summary.scan_keys.len(), summary.findings))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::fetch::{FetchError, TransportError};
    use crate::store::{StoreErrorKind, WriteError, WriteStage, WriteSummary};

    struct StaticSource {
        body: &'static [u8],
        calls: AtomicU32,
    }

    impl StaticSource {
        fn new(body: &'static [u8]) -> Arc<Self> {
            Arc::new(Self {
                body,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ContentSource for StaticSource {
        async fn fetch(&self, _repository: &str, _item: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.to_vec())
        }
    }

    struct NotFoundSource;

    #[async_trait]
    impl ContentSource for NotFoundSource {
        async fn fetch(&self, _repository: &str, _item: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::exhausted(2, TransportError::http_status(404)))
        }
    }

    /// Fails with the queued errors first, then succeeds.
    struct ScriptedWriter {
        failures: Mutex<Vec<WriteError>>,
        calls: AtomicU32,
    }

    impl ScriptedWriter {
        fn new(failures: Vec<WriteError>) -> Arc<Self> {
            Arc::new(Self {
                failures: Mutex::new(failures),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ScanWriter for ScriptedWriter {
        async fn write_item(&self, write: &ItemWrite<'_>) -> Result<WriteSummary, WriteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.failures.lock().unwrap().pop();
            match next {
                Some(error) => Err(error),
                None => Ok(WriteSummary {
                    scan_keys: (1..=write.records.len() as i64).collect(),
                    findings: write.records.iter().map(|r| r.findings.len()).sum(),
                }),
            }
        }
    }

    fn locked() -> WriteError {
        WriteError::new(
            WriteStage::InsertScan,
            StoreErrorKind::BusyOrLocked,
            "database is locked",
        )
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1))
    }

    const ONE_FINDING: &[u8] =
        br#"[{"scanResults":{"scan_id":"S","vulnerabilities":[{"id":"CVE-1","severity":"HIGH"}]}}]"#;

    #[tokio::test]
    async fn test_process_success_first_attempt() {
        let source = StaticSource::new(ONE_FINDING);
        let writer = ScriptedWriter::new(vec![]);
        let processor = ItemProcessor::new(source.clone(), writer.clone(), fast_policy());

        let done = processor.process("repo", "a.json").await.unwrap();
        assert_eq!(
            done,
            ProcessedItem {
                scans: 1,
                findings: 1,
                attempts: 1
            }
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(writer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_process_fetch_failure_is_not_retried() {
        let writer = ScriptedWriter::new(vec![]);
        let processor = ItemProcessor::new(Arc::new(NotFoundSource), writer.clone(), fast_policy());

        let err = processor.process("repo", "a.json").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "fetch failed: failed after 2 attempts: HTTP status 404"
        );
        assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_process_parse_failure_skips_writer() {
        let source = StaticSource::new(b"{not json");
        let writer = ScriptedWriter::new(vec![]);
        let processor = ItemProcessor::new(source.clone(), writer.clone(), fast_policy());

        let err = processor.process("repo", "a.json").await.unwrap_err();
        assert!(matches!(err, ItemError::Parse(_)));
        assert!(err.to_string().starts_with("invalid JSON"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(writer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_process_transient_write_then_success() {
        let source = StaticSource::new(ONE_FINDING);
        let writer = ScriptedWriter::new(vec![locked()]);
        let processor = ItemProcessor::new(source.clone(), writer.clone(), fast_policy());

        let done = processor.process("repo", "a.json").await.unwrap();
        assert_eq!(done.attempts, 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(writer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_process_transient_write_exhausts_budget() {
        let source = StaticSource::new(ONE_FINDING);
        let writer = ScriptedWriter::new(vec![locked(), locked(), locked()]);
        let processor = ItemProcessor::new(source, writer.clone(), fast_policy());

        let err = processor.process("repo", "a.json").await.unwrap_err();
        assert!(matches!(err, ItemError::Exhausted { attempts: 2, .. }));
        assert_eq!(
            err.to_string(),
            "failed after 2 attempts: insert scan failed: database is locked"
        );
        assert_eq!(writer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_process_permanent_write_failure_is_not_retried() {
        let source = StaticSource::new(ONE_FINDING);
        let writer = ScriptedWriter::new(vec![WriteError::new(
            WriteStage::InsertFinding,
            StoreErrorKind::ConstraintViolation,
            "NOT NULL constraint failed",
        )]);
        let processor = ItemProcessor::new(source, writer.clone(), fast_policy());

        let err = processor.process("repo", "a.json").await.unwrap_err();
        assert!(matches!(err, ItemError::Write(_)));
        assert!(err.to_string().starts_with("insert vulnerability failed"));
        assert_eq!(writer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_process_empty_scan_results_succeeds_with_no_findings() {
        let source = StaticSource::new(br#"{"scanResults":{}}"#);
        let writer = ScriptedWriter::new(vec![]);
        let processor = ItemProcessor::new(source, writer, fast_policy());

        let done = processor.process("repo", "empty.json").await.unwrap();
        assert_eq!(done.scans, 1);
        assert_eq!(done.findings, 0);
    }
}
