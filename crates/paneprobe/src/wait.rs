//! Wait mechanisms.
//!
//! Condition-based polling replaces fixed sleeps: a probe is re-run on a
//! fixed interval until it reports success or the timeout elapses.

use crate::result::{ProbeError, ProbeResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (20 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 20_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Outcome of a satisfied wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of probe attempts
    pub attempts: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `probe` until it returns `Ok(true)` or the timeout elapses.
///
/// The probe always runs at least once, even with a zero timeout. Probe
/// errors count as "not yet": pages mid-load routinely reject script
/// evaluation. The last error is carried into the timeout message.
pub async fn wait_for<F, Fut>(
    waited_for: &str,
    options: &WaitOptions,
    mut probe: F,
) -> ProbeResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<bool>>,
{
    let start = Instant::now();
    let deadline = start + options.timeout();
    let mut attempts = 0_u32;
    let mut last_error: Option<ProbeError> = None;

    loop {
        attempts += 1;
        match probe().await {
            Ok(true) => {
                let elapsed = start.elapsed();
                tracing::debug!(waited_for, attempts, ?elapsed, "wait satisfied");
                return Ok(WaitResult {
                    elapsed,
                    attempts,
                    waited_for: waited_for.to_string(),
                });
            }
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(waited_for, attempts, error = %e, "probe failed, retrying");
                last_error = Some(e);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        tokio::time::sleep(options.poll_interval().min(deadline - now)).await;
    }

    Err(ProbeError::Timeout {
        waited_for: waited_for.to_string(),
        ms: options.timeout_ms,
        last_error: last_error.map(|e| e.to_string()),
    })
}

/// Unconditional delay.
///
/// Kept for suites that still need a fixed warm-up; prefer [`wait_for`].
pub async fn settle(duration_ms: u64) {
    if duration_ms == 0 {
        return;
    }
    tracing::warn!(
        duration_ms,
        "fixed settle delay in use; a condition-based wait is usually enough"
    );
    tokio::time::sleep(Duration::from_millis(duration_ms)).await;
}
