//! HTTP reachability check for the app under test.

use crate::result::{ProbeError, ProbeResult};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Outcome of a successful reachability probe
#[derive(Debug, Clone, Serialize)]
pub struct Reachability {
    /// URL that was probed
    pub url: String,
    /// HTTP status code of the response
    pub status: u16,
    /// Time until the response headers arrived
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Issue a GET to `url` and report how it answered.
///
/// Any HTTP response counts as reachable, error statuses included: the
/// server is up even if the page is wrong. Connection failures and
/// timeouts are [`ProbeError::Unreachable`].
pub async fn check_reachable(url: &str, timeout: Duration) -> ProbeResult<Reachability> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProbeError::config(format!("cannot build HTTP client: {e}")))?;

    let start = Instant::now();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ProbeError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    tracing::info!(url, status, ?elapsed, "target answered");

    Ok(Reachability {
        url: url.to_string(),
        status,
        elapsed,
    })
}
