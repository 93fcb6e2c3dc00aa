//! Smoke-test configuration and the built-in bucket-list suite.

use crate::browser::BrowserConfig;
use crate::harness::{Step, TestCase, TestSuite};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Address the app under test is served from
pub const DEFAULT_TARGET_URL: &str = "http://127.0.0.1:8080";

/// Element Flutter web attaches once the engine has mounted
pub const DEFAULT_SURFACE_SELECTOR: &str = "flt-glass-pane";

/// Existence poll bound for the rendering surface.
///
/// Covers the old fixed 20 s warm-up plus the 20 s existence check that
/// followed it, so an app booting within 40 s still passes.
pub const DEFAULT_SURFACE_TIMEOUT_MS: u64 = 40_000;

/// Element carrying the greeting
pub const DEFAULT_TEXT_SELECTOR: &str = r#"[data-key="hello-again-text"]"#;

/// Greeting the app must render
pub const DEFAULT_EXPECTED_TEXT: &str = "Hello Again!";

/// Retry window for visibility and content assertions
pub const DEFAULT_ASSERTION_TIMEOUT_MS: u64 = 4_000;

/// Name of the built-in suite
pub const SUITE_NAME: &str = "My Bucket List App";

/// Name of the built-in test case
pub const TEST_NAME: &str = "checks title";

/// Everything a smoke run needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmokeConfig {
    /// App under test
    pub target_url: String,
    /// Fixed delay after navigation; 0 disables it
    pub settle_delay_ms: u64,
    /// Rendering-surface selector
    pub surface_selector: String,
    /// Existence poll bound for the surface
    pub surface_timeout_ms: u64,
    /// Selector of the greeting element
    pub text_selector: String,
    /// Text the page must contain
    pub expected_text: String,
    /// Retry window for visibility and content assertions
    pub assertion_timeout_ms: u64,
    /// Interval between condition polls
    pub poll_interval_ms: u64,
    /// Overall bound on one test case, setup included
    pub test_timeout_ms: u64,
    /// Browser launch options
    pub browser: BrowserConfig,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            settle_delay_ms: 0,
            surface_selector: DEFAULT_SURFACE_SELECTOR.to_string(),
            surface_timeout_ms: DEFAULT_SURFACE_TIMEOUT_MS,
            text_selector: DEFAULT_TEXT_SELECTOR.to_string(),
            expected_text: DEFAULT_EXPECTED_TEXT.to_string(),
            assertion_timeout_ms: DEFAULT_ASSERTION_TIMEOUT_MS,
            poll_interval_ms: crate::wait::DEFAULT_POLL_INTERVAL_MS,
            test_timeout_ms: crate::harness::DEFAULT_TEST_TIMEOUT_MS,
            browser: BrowserConfig::default(),
        }
    }
}

impl SmokeConfig {
    /// Parse from YAML; missing keys take their defaults
    pub fn from_yaml(yaml: &str) -> ProbeResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject configurations that cannot produce a meaningful run
    pub fn validate(&self) -> ProbeResult<()> {
        let url = self.target_url.trim();
        let rest = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
            .ok_or_else(|| {
                ProbeError::config(format!(
                    "target_url must be an http(s) URL, got {:?}",
                    self.target_url
                ))
            })?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(ProbeError::config(format!(
                "target_url has no host: {:?}",
                self.target_url
            )));
        }

        for (name, value) in [
            ("surface_selector", &self.surface_selector),
            ("text_selector", &self.text_selector),
            ("expected_text", &self.expected_text),
        ] {
            if value.trim().is_empty() {
                return Err(ProbeError::config(format!("{name} must not be empty")));
            }
        }

        for (name, value) in [
            ("surface_timeout_ms", self.surface_timeout_ms),
            ("assertion_timeout_ms", self.assertion_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("test_timeout_ms", self.test_timeout_ms),
        ] {
            if value == 0 {
                return Err(ProbeError::config(format!("{name} must be greater than 0")));
            }
        }

        let setup_budget = self
            .settle_delay_ms
            .saturating_add(self.surface_timeout_ms)
            .saturating_add(self.assertion_timeout_ms.saturating_mul(2));
        if self.test_timeout_ms < setup_budget {
            return Err(ProbeError::config(format!(
                "test_timeout_ms ({}) is shorter than the waits it must cover \
                 (settle + surface + 2 x assertion = {setup_budget}ms)",
                self.test_timeout_ms
            )));
        }

        if self.poll_interval_ms > self.surface_timeout_ms {
            return Err(ProbeError::config(format!(
                "poll_interval_ms ({}) exceeds surface_timeout_ms ({})",
                self.poll_interval_ms, self.surface_timeout_ms
            )));
        }
        Ok(())
    }

    /// The bucket-list smoke suite.
    ///
    /// Setup visits the app, optionally settles, waits for the rendering
    /// surface and checks the greeting element is visible. The single test
    /// then asserts the greeting text is on the page.
    #[must_use]
    pub fn suite(&self) -> TestSuite {
        let mut suite = TestSuite::new(SUITE_NAME).before_each(Step::Visit {
            url: self.target_url.clone(),
        });
        if self.settle_delay_ms > 0 {
            suite = suite.before_each(Step::Settle {
                ms: self.settle_delay_ms,
            });
        }
        suite
            .before_each(Step::ExpectExists {
                selector: Selector::css(&self.surface_selector),
                timeout_ms: self.surface_timeout_ms,
            })
            .before_each(Step::ExpectVisible {
                selector: Selector::css(&self.text_selector),
                timeout_ms: self.assertion_timeout_ms,
            })
            .test(
                TestCase::new(TEST_NAME)
                    .step(Step::ExpectText {
                        text: self.expected_text.clone(),
                        timeout_ms: self.assertion_timeout_ms,
                    })
                    .with_timeout(self.test_timeout_ms),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockElement, MockPage, PageDriver};
    use crate::harness::{TestHarness, TestStatus};
    use proptest::prelude::*;
    use std::time::Duration;

    fn flutter_app(greeting: &str, boot: Duration) -> MockPage {
        MockPage::new()
            .only_reachable(DEFAULT_TARGET_URL)
            .with_element(MockElement::new(DEFAULT_SURFACE_SELECTOR).appearing_after(boot))
            .with_element(
                MockElement::new(DEFAULT_TEXT_SELECTOR)
                    .with_text(greeting)
                    .appearing_after(boot),
            )
    }

    #[test]
    fn test_defaults_target_local_flutter_app() {
        let config = SmokeConfig::default();
        assert_eq!(config.target_url, "http://127.0.0.1:8080");
        assert_eq!(config.surface_selector, "flt-glass-pane");
        assert_eq!(config.surface_timeout_ms, 40_000);
        assert_eq!(config.text_selector, r#"[data-key="hello-again-text"]"#);
        assert_eq!(config.expected_text, "Hello Again!");
        assert_eq!(config.settle_delay_ms, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_suite_shape_without_settle() {
        let suite = SmokeConfig::default().suite();
        assert_eq!(suite.name, "My Bucket List App");
        assert_eq!(suite.before_each.len(), 3);
        assert_eq!(
            suite.before_each[1],
            Step::ExpectExists {
                selector: Selector::css("flt-glass-pane"),
                timeout_ms: 40_000
            }
        );
        assert_eq!(suite.tests.len(), 1);
        assert_eq!(suite.tests[0].name, "checks title");
        assert!(suite.validate().is_ok());
    }

    #[test]
    fn test_suite_with_legacy_settle() {
        let config = SmokeConfig {
            settle_delay_ms: 20_000,
            ..SmokeConfig::default()
        };
        let suite = config.suite();
        assert_eq!(suite.before_each[1], Step::Settle { ms: 20_000 });
        assert_eq!(suite.before_each.len(), 4);
    }

    #[test]
    fn test_bundled_suite_file_matches_builtin() {
        let bundled =
            TestSuite::from_yaml(include_str!("../../../suites/bucket_list.yaml")).unwrap();
        assert_eq!(bundled, SmokeConfig::default().suite());
    }

    #[test]
    fn test_yaml_overrides_and_defaults() {
        let config = SmokeConfig::from_yaml(
            "target_url: http://localhost:5000\nbrowser:\n  sandbox: false\n",
        )
        .unwrap();
        assert_eq!(config.target_url, "http://localhost:5000");
        assert!(!config.browser.sandbox);
        assert_eq!(config.expected_text, "Hello Again!");
        assert!(SmokeConfig::from_yaml("target_ulr: typo").is_err());
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paneprobe.yaml");
        let config = SmokeConfig {
            expected_text: "Bonjour".to_string(),
            ..SmokeConfig::default()
        };
        std::fs::write(&path, config.to_yaml().unwrap()).unwrap();
        assert_eq!(SmokeConfig::load(&path).unwrap(), config);
        assert!(SmokeConfig::load(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            SmokeConfig {
                target_url: "ftp://127.0.0.1".to_string(),
                ..SmokeConfig::default()
            },
            SmokeConfig {
                target_url: "http://".to_string(),
                ..SmokeConfig::default()
            },
            SmokeConfig {
                expected_text: " ".to_string(),
                ..SmokeConfig::default()
            },
            SmokeConfig {
                surface_timeout_ms: 0,
                ..SmokeConfig::default()
            },
            SmokeConfig {
                poll_interval_ms: 50_000,
                ..SmokeConfig::default()
            },
            SmokeConfig {
                surface_timeout_ms: 150_000,
                ..SmokeConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ProbeError::Config { .. })),
                "{config:?} should be rejected"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_checks_title_passes_against_booting_app() {
        let config = SmokeConfig::default();
        let mut page = flutter_app("Hello Again!", Duration::from_secs(12));
        let results = TestHarness::new().run(&config.suite(), &mut page).await;
        assert!(results.all_passed(), "{:?}", results.failures());
        // No fixed delay: the run ends as soon as the app has booted
        assert_eq!(results.duration, Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_app_booting_within_old_warm_up_window_passes() {
        let config = SmokeConfig::default();
        let mut page = flutter_app("Hello Again!", Duration::from_secs(30));
        let results = TestHarness::new().run(&config.suite(), &mut page).await;
        assert!(results.all_passed(), "{:?}", results.failures());
        assert_eq!(results.duration, Duration::from_secs(30));
    }

    #[test]
    fn test_test_timeout_must_cover_setup_waits() {
        let config = SmokeConfig {
            surface_timeout_ms: 150_000,
            ..SmokeConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("test_timeout_ms"));

        let raised = SmokeConfig {
            test_timeout_ms: 160_000,
            ..config
        };
        assert!(raised.validate().is_ok());

        let with_settle = SmokeConfig {
            settle_delay_ms: 80_000,
            ..SmokeConfig::default()
        };
        assert!(with_settle.validate().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_checks_title_fails_when_greeting_truncated() {
        let config = SmokeConfig::default();
        let mut page = flutter_app("Hello", Duration::from_secs(1));
        let results = TestHarness::new().run(&config.suite(), &mut page).await;
        assert_eq!(results.results[0].status, TestStatus::Failed);
        assert_eq!(
            results.results[0].failed_step.as_deref(),
            Some(r#"expect page to contain "Hello Again!""#)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_surface_never_attaches() {
        let config = SmokeConfig::default();
        let mut page = flutter_app("Hello Again!", Duration::from_secs(60));
        let results = TestHarness::new().run(&config.suite(), &mut page).await;
        let error = results.results[0].error.as_deref().unwrap();
        assert!(error.contains("Timed out after 40000ms"));
        assert!(error.contains("flt-glass-pane"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_greeting_fails_setup() {
        let config = SmokeConfig::default();
        let mut page = MockPage::new()
            .with_element(MockElement::new(DEFAULT_SURFACE_SELECTOR))
            .with_element(
                MockElement::new(DEFAULT_TEXT_SELECTOR)
                    .with_text("Hello Again!")
                    .hidden(),
            );
        let results = TestHarness::new().run(&config.suite(), &mut page).await;
        assert!(results.results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("not visible"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_target() {
        let config = SmokeConfig {
            target_url: "http://127.0.0.1:9".to_string(),
            ..SmokeConfig::default()
        };
        let mut page = flutter_app("Hello Again!", Duration::ZERO);
        let results = TestHarness::new().run(&config.suite(), &mut page).await;
        assert!(results.results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("Navigation to http://127.0.0.1:9 failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_runs_agree() {
        let config = SmokeConfig::default();
        let mut page = flutter_app("Hello Again!", Duration::from_secs(2));
        let harness = TestHarness::new();
        let first = harness.run(&config.suite(), &mut page).await;
        let second = harness.run(&config.suite(), &mut page).await;
        assert_eq!(first.outcome(), second.outcome());
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(
            page.current_url().await.unwrap(),
            "http://127.0.0.1:8080"
        );
    }

    proptest! {
        #[test]
        fn prop_any_http_host_validates(host in "[a-z][a-z0-9.-]{0,20}", port in 1u16..=u16::MAX) {
            let config = SmokeConfig {
                target_url: format!("http://{host}:{port}"),
                ..SmokeConfig::default()
            };
            prop_assert!(config.validate().is_ok());
        }

        #[test]
        fn prop_poll_interval_bounded_by_surface_timeout(
            timeout in 1u64..100_000,
            poll in 1u64..100_000,
        ) {
            let config = SmokeConfig {
                surface_timeout_ms: timeout,
                poll_interval_ms: poll,
                ..SmokeConfig::default()
            };
            prop_assert_eq!(config.validate().is_ok(), poll <= timeout);
        }
    }
}
