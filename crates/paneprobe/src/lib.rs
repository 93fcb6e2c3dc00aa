//! Paneprobe: browser smoke testing for canvas-rendered web apps
//!
//! Drives a headless Chromium over CDP against an app that mounts a
//! rendering surface (Flutter web's `flt-glass-pane`), waits on conditions
//! rather than fixed delays, and asserts on visibility and page content.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────────┐
//! │ SmokeConfig  │───►│ TestSuite    │───►│ TestHarness          │
//! │ (YAML/flags) │    │ before_each  │    │  Step::run ─► Expect │
//! └──────────────┘    │ tests        │    │      │               │
//!                     └──────────────┘    │      ▼               │
//!                                         │  PageDriver          │
//!                                         │  ├─ Page (chromium)  │
//!                                         │  └─ MockPage         │
//!                                         └──────────────────────┘
//! ```

#![warn(missing_docs)]

mod assertion;
mod browser;
mod config;
mod driver;
mod harness;
mod locator;
#[cfg(feature = "reachability")]
mod reachability;
mod result;
mod wait;

pub use assertion::{expect, expect_page_text, Expect};
#[cfg(feature = "browser")]
pub use browser::{Browser, Page};
pub use browser::BrowserConfig;
pub use config::{
    SmokeConfig, DEFAULT_ASSERTION_TIMEOUT_MS, DEFAULT_EXPECTED_TEXT, DEFAULT_SURFACE_SELECTOR,
    DEFAULT_SURFACE_TIMEOUT_MS, DEFAULT_TARGET_URL, DEFAULT_TEXT_SELECTOR, SUITE_NAME, TEST_NAME,
};
pub use driver::{MockElement, MockPage, PageDriver};
pub use harness::{
    Step, SuiteResults, TestCase, TestHarness, TestResult, TestStatus, TestSuite,
    DEFAULT_TEST_TIMEOUT_MS,
};
pub use locator::{Selector, PAGE_TEXT_SCRIPT};
#[cfg(feature = "reachability")]
pub use reachability::{check_reachable, Reachability};
pub use result::{ProbeError, ProbeResult};
pub use wait::{settle, wait_for, WaitOptions, WaitResult, DEFAULT_POLL_INTERVAL_MS};

/// Run a suite in a freshly launched browser and close it afterwards.
///
/// The browser is closed even when tests fail; a close failure is logged
/// rather than masking the results.
#[cfg(feature = "browser")]
pub async fn run_in_browser(
    suite: &TestSuite,
    harness: &TestHarness,
    config: &BrowserConfig,
) -> ProbeResult<SuiteResults> {
    let browser = Browser::launch(config.clone()).await?;
    let outcome = async {
        let mut page = browser.new_page().await?;
        let results = harness.run(suite, &mut page).await;
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "page close failed");
        }
        Ok::<_, ProbeError>(results)
    }
    .await;
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }
    outcome
}
