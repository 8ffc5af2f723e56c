//! Constants for the fetch module (timeouts, retry, URL mapping).

use std::time::Duration;

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout (30 seconds; report files are small).
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Largest report body accepted from the raw host (16 MiB).
pub const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// Attempts made per fetch before giving up, including the first.
pub const FETCH_ATTEMPTS: u32 = 2;

/// Backoff unit between fetch attempts; attempt `n` waits `n` units.
pub const FETCH_RETRY_UNIT: Duration = Duration::from_secs(1);

/// Branch used when resolving raw content URLs.
pub const DEFAULT_BRANCH: &str = "main";

/// Host serving raw file content for GitHub repositories.
pub const RAW_CONTENT_HOST: &str = "raw.githubusercontent.com";
