//! Result and error types for Paneprobe.

use thiserror::Error;

/// Result type for Paneprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving a smoke test
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Bounded wait gave up
    #[error("Timed out after {ms}ms waiting for {waited_for}{}", last_error_suffix(.last_error))]
    Timeout {
        /// What was waited for
        waited_for: String,
        /// Timeout in milliseconds
        ms: u64,
        /// Last error the condition raised, if it ever failed outright
        last_error: Option<String>,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Script evaluation in the page failed
    #[error("Evaluation failed: {message}")]
    EvaluationError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Target did not answer an HTTP request
    #[error("{url} is unreachable: {message}")]
    Unreachable {
        /// URL that was probed
        url: String,
        /// Error message
        message: String,
    },

    /// Invalid configuration or suite definition
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(" (last error: {e})"))
        .unwrap_or_default()
}

impl ProbeError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Whether this error came from a failed check rather than broken plumbing
    #[must_use]
    pub const fn is_check_failure(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::AssertionFailed { .. })
    }
}
