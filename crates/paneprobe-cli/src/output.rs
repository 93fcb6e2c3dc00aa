//! Output formatting and progress reporting

use crate::commands::OutputFormatArg;
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use paneprobe::{SuiteResults, TestResult, TestStatus};
use std::time::Duration;

/// Output format for suite results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable lines on stderr
    #[default]
    Text,
    /// The full results document on stdout
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => Self::Text,
            OutputFormatArg::Json => Self::Json,
        }
    }
}

/// Progress reporter for suite execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    /// Show a spinner while a suite runs
    pub fn start_spinner(&mut self, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        self.spinner = Some(pb);
    }

    /// Clear the spinner
    pub fn finish(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // printed even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a skipped-test line
    pub fn skipped(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("-").yellow().to_string()
        } else {
            "SKIP".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print one line per test, then the summary
    pub fn report(&self, results: &SuiteResults) {
        self.header(&results.suite_name);
        for result in &results.results {
            self.test_line(result);
        }
        let skipped = results.total() - results.passed_count() - results.failed_count();
        self.summary(
            results.passed_count(),
            results.failed_count(),
            skipped,
            results.duration,
        );
    }

    fn test_line(&self, result: &TestResult) {
        let timing = format!("({}ms)", result.duration.as_millis());
        match result.status {
            TestStatus::Passed => self.success(&format!("{} {timing}", result.name)),
            TestStatus::Failed => {
                self.failure(&format!("{} {timing}", result.name));
                if let Some(ref step) = result.failed_step {
                    let _ = self.term.write_line(&format!("    at step: {step}"));
                }
                if let Some(ref error) = result.error {
                    let _ = self.term.write_line(&format!("    {error}"));
                }
                if let Some(ref shot) = result.screenshot {
                    let _ = self
                        .term
                        .write_line(&format!("    screenshot: {}", shot.display()));
                }
            }
            TestStatus::Skipped => self.skipped(&result.name),
        }
    }

    /// Print test summary
    pub fn summary(&self, passed: usize, failed: usize, skipped: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");

        let total = passed + failed + skipped;
        let duration_secs = duration.as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            let _ = self.term.write_line(&format!(
                "{} {} tests in {:.2}s ({} passed, {} failed, {} skipped)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                skipped_style.apply_to(skipped)
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} tests in {duration_secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            ));
        }
    }
}

/// Render results as the JSON document printed by `--format json`
pub fn results_json(results: &[SuiteResults]) -> serde_json::Result<String> {
    match results {
        [single] => serde_json::to_string_pretty(single),
        many => serde_json::to_string_pretty(many),
    }
}
