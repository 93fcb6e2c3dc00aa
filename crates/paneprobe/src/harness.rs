//! Test harness for running suites against a page.
//!
//! A suite mirrors the familiar `describe` / `beforeEach` / `it` shape:
//! setup steps run before every test case, then the case's own steps run.
//! The first failing step aborts that case; other cases still run unless
//! fail-fast is set.

use crate::assertion::{expect, expect_page_text};
use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{settle, WaitOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Default per-test timeout (2 minutes)
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 120_000;

/// Default poll interval for step waits
pub const DEFAULT_STEP_POLL_MS: u64 = 100;

/// One action in a suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Navigate the page
    Visit {
        /// Target URL
        url: String,
    },
    /// Unconditional delay
    Settle {
        /// Delay in milliseconds
        ms: u64,
    },
    /// Bounded existence poll
    ExpectExists {
        /// Element to wait for
        selector: Selector,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },
    /// Retrying visibility assertion
    ExpectVisible {
        /// Element that must be visible
        selector: Selector,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },
    /// Retrying page-content assertion
    ExpectText {
        /// Text the page must contain
        text: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },
}

impl Step {
    /// Short human-readable label for logs and reports
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Visit { url } => format!("visit {url}"),
            Self::Settle { ms } => format!("settle {ms}ms"),
            Self::ExpectExists { selector, .. } => format!("expect {selector} to exist"),
            Self::ExpectVisible { selector, .. } => format!("expect {selector} to be visible"),
            Self::ExpectText { text, .. } => format!("expect page to contain {text:?}"),
        }
    }

    fn validate(&self) -> ProbeResult<()> {
        match self {
            Self::Visit { url } if url.trim().is_empty() => {
                Err(ProbeError::config("visit step needs a url"))
            }
            Self::ExpectExists { selector, .. } | Self::ExpectVisible { selector, .. }
                if selector.is_empty() =>
            {
                Err(ProbeError::config(format!("{}: empty selector", self.label())))
            }
            Self::ExpectText { text, .. } if text.is_empty() => {
                Err(ProbeError::config("expect_text step needs non-empty text"))
            }
            _ => Ok(()),
        }
    }

    /// Execute the step against `driver`
    pub async fn run<D: PageDriver + ?Sized>(
        &self,
        driver: &mut D,
        poll_interval_ms: u64,
    ) -> ProbeResult<()> {
        let wait = |timeout_ms| {
            WaitOptions::new()
                .with_timeout(timeout_ms)
                .with_poll_interval(poll_interval_ms)
        };
        match self {
            Self::Visit { url } => driver.navigate(url).await,
            Self::Settle { ms } => {
                settle(*ms).await;
                Ok(())
            }
            Self::ExpectExists {
                selector,
                timeout_ms,
            } => expect(&*driver, selector.clone())
                .to_exist(&wait(*timeout_ms))
                .await
                .map(drop),
            Self::ExpectVisible {
                selector,
                timeout_ms,
            } => expect(&*driver, selector.clone())
                .to_be_visible(&wait(*timeout_ms))
                .await
                .map(drop),
            Self::ExpectText { text, timeout_ms } => {
                expect_page_text(&*driver, text, &wait(*timeout_ms))
                    .await
                    .map(drop)
            }
        }
    }
}

/// A single test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    /// Test name
    pub name: String,
    /// Steps run after the suite's setup
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Test timeout in milliseconds, setup included
    #[serde(default = "default_test_timeout")]
    pub timeout_ms: u64,
}

const fn default_test_timeout() -> u64 {
    DEFAULT_TEST_TIMEOUT_MS
}

impl TestCase {
    /// Create a new test case
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
        }
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }
}

/// A test suite containing setup steps and test cases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Steps run before every test case
    #[serde(default)]
    pub before_each: Vec<Step>,
    /// Tests in this suite
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    /// Create a new test suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before_each: Vec::new(),
            tests: Vec::new(),
        }
    }

    /// Append a setup step
    #[must_use]
    pub fn before_each(mut self, step: Step) -> Self {
        self.before_each.push(step);
        self
    }

    /// Add a test case
    #[must_use]
    pub fn test(mut self, test: TestCase) -> Self {
        self.tests.push(test);
        self
    }

    /// Get the number of tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// URLs the suite navigates to, in step order, without repeats
    #[must_use]
    pub fn visited_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::new();
        let steps = self
            .before_each
            .iter()
            .chain(self.tests.iter().flat_map(|t| t.steps.iter()));
        for step in steps {
            if let Step::Visit { url } = step {
                if !urls.contains(&url.as_str()) {
                    urls.push(url);
                }
            }
        }
        urls
    }

    /// Point every `visit` step at `url`
    #[must_use]
    pub fn with_target_url(mut self, url: &str) -> Self {
        let steps = self
            .before_each
            .iter_mut()
            .chain(self.tests.iter_mut().flat_map(|t| t.steps.iter_mut()));
        for step in steps {
            if let Step::Visit { url: visit } = step {
                url.clone_into(visit);
            }
        }
        self
    }

    /// Parse a suite from YAML and validate it
    pub fn from_yaml(yaml: &str) -> ProbeResult<Self> {
        let suite: Self = serde_yaml_ng::from_str(yaml)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Load a suite from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Reject suites that cannot run meaningfully
    pub fn validate(&self) -> ProbeResult<()> {
        if self.name.trim().is_empty() {
            return Err(ProbeError::config("suite name must not be empty"));
        }
        if self.tests.is_empty() {
            return Err(ProbeError::config(format!(
                "suite {:?} has no tests",
                self.name
            )));
        }
        for test in &self.tests {
            if test.timeout_ms == 0 {
                return Err(ProbeError::config(format!(
                    "test {:?} has a zero timeout",
                    test.name
                )));
            }
        }
        self.before_each
            .iter()
            .chain(self.tests.iter().flat_map(|t| t.steps.iter()))
            .try_for_each(Step::validate)
    }
}

/// Lifecycle state of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// All steps passed
    Passed,
    /// A step failed
    Failed,
    /// Not run because an earlier test failed under fail-fast
    Skipped,
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Final status
    pub status: TestStatus,
    /// Label of the step that failed
    pub failed_step: Option<String>,
    /// Error message if failed
    pub error: Option<String>,
    /// Test duration
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Failure screenshot, if one was saved
    pub screenshot: Option<PathBuf>,
}

impl TestResult {
    /// Create a passing test result
    #[must_use]
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Passed,
            failed_step: None,
            error: None,
            duration: Duration::ZERO,
            screenshot: None,
        }
    }

    /// Create a failing test result
    #[must_use]
    pub fn fail(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Failed,
            error: Some(error.into()),
            ..Self::pass(name)
        }
    }

    /// Create a skipped test result
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Skipped,
            ..Self::pass(name)
        }
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Whether the test passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// Results from running a test suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Suite name
    pub suite_name: String,
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
    /// Individual test results
    pub results: Vec<TestResult>,
    /// Total duration
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl SuiteResults {
    /// Check if all tests passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(TestResult::passed)
    }

    /// Count passed tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Count failed tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
            .count()
    }

    /// Get total test count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed tests
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
            .collect()
    }

    /// Per-test statuses, ignoring timing. Two runs agree when these match.
    #[must_use]
    pub fn outcome(&self) -> Vec<(String, TestStatus)> {
        self.results
            .iter()
            .map(|r| (r.name.clone(), r.status))
            .collect()
    }

    /// Write the results as pretty JSON
    pub fn write_json(&self, path: impl AsRef<Path>) -> ProbeResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Test harness for running suites
#[derive(Debug)]
pub struct TestHarness {
    /// Whether to stop on first failure
    pub fail_fast: bool,
    /// Poll interval for step waits
    pub poll_interval_ms: u64,
    /// Directory for failure screenshots; `None` disables them
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self {
            fail_fast: false,
            poll_interval_ms: DEFAULT_STEP_POLL_MS,
            screenshot_dir: None,
        }
    }
}

impl TestHarness {
    /// Create a new test harness
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable fail-fast mode
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set poll interval for step waits
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Save a screenshot of the page into `dir` whenever a test fails
    #[must_use]
    pub fn with_screenshots(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = Some(dir.into());
        self
    }

    /// Run a test suite sequentially on one page
    pub async fn run<D: PageDriver + ?Sized>(
        &self,
        suite: &TestSuite,
        driver: &mut D,
    ) -> SuiteResults {
        let span = tracing::info_span!("suite", name = %suite.name);
        async {
            let started_at = Utc::now();
            let start = Instant::now();
            let mut results = Vec::with_capacity(suite.tests.len());
            let mut halted = false;

            for test in &suite.tests {
                if halted {
                    tracing::info!(test = %test.name, "skipped after earlier failure");
                    results.push(TestResult::skipped(&test.name));
                    continue;
                }

                let result = self
                    .run_test(suite, test, driver)
                    .instrument(tracing::info_span!("test", name = %test.name))
                    .await;
                halted = self.fail_fast && !result.passed();
                results.push(result);
            }

            SuiteResults {
                run_id: Uuid::new_v4(),
                suite_name: suite.name.clone(),
                started_at,
                results,
                duration: start.elapsed(),
            }
        }
        .instrument(span)
        .await
    }

    async fn run_test<D: PageDriver + ?Sized>(
        &self,
        suite: &TestSuite,
        test: &TestCase,
        driver: &mut D,
    ) -> TestResult {
        let start = Instant::now();
        tracing::debug!("started");

        let steps = suite.before_each.iter().chain(test.steps.iter());
        let outcome = tokio::time::timeout(Duration::from_millis(test.timeout_ms), async {
            for step in steps {
                tracing::debug!(step = %step.label(), "step");
                step.run(driver, self.poll_interval_ms)
                    .await
                    .map_err(|e| (step.label(), e))?;
            }
            Ok::<(), (String, ProbeError)>(())
        })
        .await;

        let mut result = match outcome {
            Ok(Ok(())) => TestResult::pass(&test.name),
            Ok(Err((step, e))) => TestResult {
                failed_step: Some(step),
                ..TestResult::fail(&test.name, e.to_string())
            },
            Err(_) => TestResult::fail(
                &test.name,
                format!("test exceeded its {}ms timeout", test.timeout_ms),
            ),
        }
        .with_duration(start.elapsed());

        if result.passed() {
            tracing::info!(duration = ?result.duration, "passed");
        } else {
            tracing::warn!(
                step = result.failed_step.as_deref().unwrap_or("-"),
                error = result.error.as_deref().unwrap_or("-"),
                "failed"
            );
            result.screenshot = self.capture_failure(suite, test, driver).await;
        }
        result
    }

    async fn capture_failure<D: PageDriver + ?Sized>(
        &self,
        suite: &TestSuite,
        test: &TestCase,
        driver: &D,
    ) -> Option<PathBuf> {
        let dir = self.screenshot_dir.as_ref()?;
        let path = dir.join(format!(
            "{}--{}.png",
            file_stem(&suite.name),
            file_stem(&test.name)
        ));
        let saved = async {
            let png = driver.screenshot().await?;
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, png).await?;
            Ok::<(), ProbeError>(())
        }
        .await;
        match saved {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(error = %e, "could not save failure screenshot");
                None
            }
        }
    }
}

/// Filesystem-safe rendering of a suite or test name
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockElement, MockPage};

    const URL: &str = "http://127.0.0.1:8080";

    fn suite() -> TestSuite {
        TestSuite::new("demo")
            .before_each(Step::Visit {
                url: URL.to_string(),
            })
            .before_each(Step::ExpectExists {
                selector: Selector::css("flt-glass-pane"),
                timeout_ms: 1000,
            })
            .test(TestCase::new("greets").step(Step::ExpectText {
                text: "Hi".to_string(),
                timeout_ms: 500,
            }))
            .test(TestCase::new("says bye").step(Step::ExpectText {
                text: "Bye".to_string(),
                timeout_ms: 500,
            }))
    }

    #[test]
    fn test_visited_urls_in_order() {
        let suite = suite().test(
            TestCase::new("elsewhere")
                .step(Step::Visit {
                    url: "http://127.0.0.1:9000/about".to_string(),
                })
                .step(Step::Visit {
                    url: URL.to_string(),
                }),
        );
        assert_eq!(
            suite.visited_urls(),
            vec![URL, "http://127.0.0.1:9000/about"]
        );
        assert!(TestSuite::new("empty").visited_urls().is_empty());
    }

    #[test]
    fn test_with_target_url_rewrites_every_visit() {
        let suite = suite()
            .test(TestCase::new("revisits").step(Step::Visit {
                url: "http://127.0.0.1:9000/about".to_string(),
            }))
            .with_target_url("http://staging.local:5000");
        assert_eq!(suite.visited_urls(), vec!["http://staging.local:5000"]);
        assert!(matches!(
            suite.before_each[1],
            Step::ExpectExists { timeout_ms: 1000, .. }
        ));
    }

    fn app() -> MockPage {
        MockPage::new()
            .with_element(MockElement::new("flt-glass-pane"))
            .with_element(MockElement::new("p").with_text("Hi"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_runs_before_each_test() {
        let mut page = app();
        let results = TestHarness::new().run(&suite(), &mut page).await;
        let visits = page
            .call_history
            .iter()
            .filter(|c| c.starts_with("navigate:"))
            .count();
        assert_eq!(visits, 2);
        assert_eq!(results.total(), 2);
        assert_eq!(results.passed_count(), 1);
        assert_eq!(results.failed_count(), 1);
        assert!(!results.all_passed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_records_step_and_message() {
        let mut page = app();
        let results = TestHarness::new().run(&suite(), &mut page).await;
        let failure = results.failures()[0];
        assert_eq!(failure.name, "says bye");
        assert_eq!(
            failure.failed_step.as_deref(),
            Some(r#"expect page to contain "Bye""#)
        );
        assert!(failure.error.as_deref().unwrap().contains("Bye"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fast_skips_remaining() {
        let suite = TestSuite::new("ff")
            .test(TestCase::new("first").step(Step::ExpectText {
                text: "nowhere".to_string(),
                timeout_ms: 100,
            }))
            .test(TestCase::new("second"));
        let mut page = MockPage::new();
        let results = TestHarness::new()
            .with_fail_fast(true)
            .run(&suite, &mut page)
            .await;
        assert_eq!(results.results[0].status, TestStatus::Failed);
        assert_eq!(results.results[1].status, TestStatus::Skipped);
        assert_eq!(results.failed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_failure_aborts_test() {
        let mut page = app().only_reachable("http://127.0.0.1:9000");
        let results = TestHarness::new().run(&suite(), &mut page).await;
        assert_eq!(results.failed_count(), 2);
        let failure = &results.results[0];
        assert_eq!(
            failure.failed_step.as_deref(),
            Some("visit http://127.0.0.1:8080")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_test_timeout_applies_to_whole_case() {
        let suite = TestSuite::new("slow").test(
            TestCase::new("sleeps")
                .step(Step::Settle { ms: 10_000 })
                .with_timeout(1_000),
        );
        let mut page = MockPage::new();
        let results = TestHarness::new().run(&suite, &mut page).await;
        let error = results.results[0].error.as_deref().unwrap();
        assert!(error.contains("1000ms timeout"));
        assert_eq!(results.results[0].duration, Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_screenshot_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut page = app().with_screenshot(vec![1, 2, 3]);
        let results = TestHarness::new()
            .with_screenshots(dir.path())
            .run(&suite(), &mut page)
            .await;
        let shot = results.failures()[0].screenshot.clone().unwrap();
        assert_eq!(shot, dir.path().join("demo--says-bye.png"));
        assert_eq!(std::fs::read(shot).unwrap(), vec![1, 2, 3]);
        assert!(results.results[0].screenshot.is_none());
    }

    #[test]
    fn test_suite_yaml() {
        let yaml = r#"
name: My Bucket List App
before_each:
  - action: visit
    url: http://127.0.0.1:8080
  - action: expect_exists
    selector: { css: flt-glass-pane }
    timeout_ms: 20000
tests:
  - name: checks title
    steps:
      - action: expect_text
        text: Hello Again!
        timeout_ms: 4000
"#;
        let suite = TestSuite::from_yaml(yaml).unwrap();
        assert_eq!(suite.before_each.len(), 2);
        assert_eq!(suite.tests[0].timeout_ms, DEFAULT_TEST_TIMEOUT_MS);
        assert_eq!(
            suite.tests[0].steps[0],
            Step::ExpectText {
                text: "Hello Again!".to_string(),
                timeout_ms: 4000
            }
        );
    }

    #[test]
    fn test_suite_validation() {
        assert!(TestSuite::new("empty").validate().is_err());
        let bad = TestSuite::new("bad").test(TestCase::new("t").step(Step::ExpectVisible {
            selector: Selector::css(""),
            timeout_ms: 10,
        }));
        assert!(matches!(bad.validate(), Err(ProbeError::Config { .. })));
        assert!(TestSuite::from_yaml("name: x\ntests: []\nextra: 1").is_err());
    }

    #[test]
    fn test_results_json_uses_millis() {
        let results = SuiteResults {
            run_id: Uuid::nil(),
            suite_name: "s".to_string(),
            started_at: Utc::now(),
            results: vec![TestResult::pass("t").with_duration(Duration::from_millis(1500))],
            duration: Duration::from_millis(1600),
        };
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["results"][0]["duration"], 1500);
        assert_eq!(json["results"][0]["status"], "passed");
        assert_eq!(json["duration"], 1600);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("My Bucket List App"), "my-bucket-list-app");
        assert_eq!(file_stem("checks title"), "checks-title");
    }
}
