//! Command handlers

use crate::commands::{CheckArgs, RunArgs, TargetArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{results_json, OutputFormat, ProgressReporter};
use paneprobe::{SmokeConfig, SuiteResults, TestHarness, TestSuite};
use std::path::Path;
use std::time::Duration;

/// File name of the JSON report inside `--output`
pub const REPORT_FILE: &str = "report.json";

/// Load the config file (if any), layer the flags over it and validate
pub fn resolve_config(target: &TargetArgs) -> CliResult<SmokeConfig> {
    let mut config = match target.config {
        Some(ref path) => SmokeConfig::load(path).map_err(|e| {
            CliError::config(format!("failed to load {}: {e}", path.display()))
        })?,
        None => SmokeConfig::default(),
    };
    target.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Build the suite to run: the YAML file when given, the built-in one otherwise.
///
/// `--url` points a loaded suite's visit steps at the given URL. Flags that
/// only shape the built-in suite cannot be combined with a suite file.
pub fn resolve_suite(
    suite: Option<&Path>,
    target: &TargetArgs,
    smoke: &SmokeConfig,
) -> CliResult<TestSuite> {
    let Some(path) = suite else {
        return Ok(smoke.suite());
    };
    let shape = target.suite_shape_flags();
    if !shape.is_empty() {
        return Err(CliError::config(format!(
            "{} cannot be combined with --suite; set them in {}",
            shape.join(", "),
            path.display()
        )));
    }
    let loaded = TestSuite::load(path)?;
    Ok(match target.url {
        Some(ref url) => loaded.with_target_url(url),
        None => loaded,
    })
}

/// Fail when repeated runs disagree on any test's outcome
pub fn check_consistent(runs: &[SuiteResults]) -> CliResult<()> {
    if let Some(pair) = runs.windows(2).find(|w| w[0].outcome() != w[1].outcome()) {
        return Err(CliError::test_execution(format!(
            "outcomes differed between runs {} and {}",
            pair[0].run_id, pair[1].run_id
        )));
    }
    Ok(())
}

/// Executes CLI commands
#[derive(Debug)]
pub struct SmokeRunner {
    reporter: ProgressReporter,
}

impl SmokeRunner {
    /// Create a runner reporting according to `config`
    #[must_use]
    pub fn new(config: &CliConfig) -> Self {
        Self {
            reporter: ProgressReporter::new(
                config.color.should_color(),
                config.verbosity.is_quiet(),
            ),
        }
    }

    /// `paneprobe run`
    pub async fn run(&mut self, args: &RunArgs) -> CliResult<()> {
        let smoke = resolve_config(&args.target)?;
        let suite = resolve_suite(args.suite.as_deref(), &args.target, &smoke)?;
        if let (Some(path), Some(url)) = (&args.suite, &args.target.url) {
            self.reporter.warning(&format!(
                "visiting {url} instead of the URLs in {}",
                path.display()
            ));
        }
        let urls = suite.visited_urls().join(", ");

        let mut harness = TestHarness::new()
            .with_fail_fast(args.fail_fast)
            .with_poll_interval(smoke.poll_interval_ms);
        if args.screenshot_on_failure {
            if let Some(ref dir) = args.output {
                harness = harness.with_screenshots(dir);
            }
        }

        tracing::info!(
            url = %urls,
            suite = %suite.name,
            tests = suite.test_count(),
            repeat = args.repeat,
            "starting run"
        );

        let format = OutputFormat::from(args.format);
        let mut runs = Vec::with_capacity(args.repeat as usize);
        for attempt in 1..=args.repeat {
            self.reporter.start_spinner(&format!(
                "{} (run {attempt}/{})",
                suite.name, args.repeat
            ));
            let results = self.execute(&suite, &harness, &smoke).await;
            self.reporter.finish();
            let results = results?;
            if format == OutputFormat::Text {
                self.reporter.report(&results);
            }
            runs.push(results);
        }

        if format == OutputFormat::Json {
            println!("{}", results_json(&runs)?);
        }
        if let Some(ref dir) = args.output {
            write_report(dir, &runs)?;
            self.reporter
                .info(&format!("report written to {}", dir.join(REPORT_FILE).display()));
        }

        check_consistent(&runs)?;
        let failed: usize = runs.iter().map(SuiteResults::failed_count).sum();
        if failed > 0 {
            return Err(CliError::test_execution(format!("{failed} test(s) failed")));
        }
        Ok(())
    }

    #[cfg(feature = "browser")]
    async fn execute(
        &self,
        suite: &TestSuite,
        harness: &TestHarness,
        smoke: &SmokeConfig,
    ) -> CliResult<SuiteResults> {
        Ok(paneprobe::run_in_browser(suite, harness, &smoke.browser).await?)
    }

    #[cfg(not(feature = "browser"))]
    async fn execute(
        &self,
        _suite: &TestSuite,
        _harness: &TestHarness,
        _smoke: &SmokeConfig,
    ) -> CliResult<SuiteResults> {
        Err(CliError::config(
            "built without browser support; rebuild with --features browser",
        ))
    }

    /// `paneprobe check`
    pub async fn check(&self, args: &CheckArgs) -> CliResult<()> {
        let smoke = resolve_config(&args.target)?;
        let reach =
            paneprobe::check_reachable(&smoke.target_url, Duration::from_millis(args.timeout_ms))
                .await?;
        self.reporter.success(&format!(
            "{} answered HTTP {} in {}ms",
            reach.url,
            reach.status,
            reach.elapsed.as_millis()
        ));
        Ok(())
    }
}

/// `paneprobe config`: the effective configuration as YAML
pub fn render_config(target: &TargetArgs) -> CliResult<String> {
    Ok(resolve_config(target)?.to_yaml()?)
}

fn write_report(dir: &Path, runs: &[SuiteResults]) -> CliResult<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(REPORT_FILE), results_json(runs)?)?;
    Ok(())
}
