//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use paneprobe::SmokeConfig;
use std::path::PathBuf;

/// Paneprobe: browser smoke tests for canvas-rendered (Flutter web) apps
#[derive(Parser, Debug)]
#[command(name = "paneprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the smoke suite in a browser
    Run(RunArgs),

    /// Check that the target URL answers HTTP requests
    Check(CheckArgs),

    /// Print the effective configuration as YAML
    Config(ConfigArgs),
}

/// Target and timing options shared by every command
#[derive(Args, Debug, Default, Clone)]
pub struct TargetArgs {
    /// YAML configuration file
    #[arg(short, long, env = "PANEPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// URL of the app under test
    #[arg(long, env = "PANEPROBE_URL")]
    pub url: Option<String>,

    /// Fixed delay after navigation in milliseconds (0 disables it)
    #[arg(long, env = "PANEPROBE_SETTLE_MS")]
    pub settle_ms: Option<u64>,

    /// Selector of the rendering surface to wait for
    #[arg(long, env = "PANEPROBE_SURFACE_SELECTOR")]
    pub surface_selector: Option<String>,

    /// How long to wait for the rendering surface, in milliseconds
    #[arg(long, env = "PANEPROBE_SURFACE_TIMEOUT_MS")]
    pub surface_timeout_ms: Option<u64>,

    /// Selector of the element that must be visible
    #[arg(long, env = "PANEPROBE_TEXT_SELECTOR")]
    pub text_selector: Option<String>,

    /// Text the page must contain
    #[arg(long, env = "PANEPROBE_EXPECTED_TEXT")]
    pub expected_text: Option<String>,

    /// Retry window for visibility and content assertions, in milliseconds
    #[arg(long, env = "PANEPROBE_ASSERTION_TIMEOUT_MS")]
    pub assertion_timeout_ms: Option<u64>,

    /// Interval between condition polls, in milliseconds
    #[arg(long, env = "PANEPROBE_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Path to the chromium binary
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<String>,

    /// Disable the chromium sandbox (containers/CI)
    #[arg(long, env = "PANEPROBE_NO_SANDBOX")]
    pub no_sandbox: bool,
}

impl TargetArgs {
    /// Flags describing the built-in suite's shape, by name, that are set
    #[must_use]
    pub fn suite_shape_flags(&self) -> Vec<&'static str> {
        [
            ("--settle-ms", self.settle_ms.is_some()),
            ("--surface-selector", self.surface_selector.is_some()),
            ("--surface-timeout-ms", self.surface_timeout_ms.is_some()),
            ("--text-selector", self.text_selector.is_some()),
            ("--expected-text", self.expected_text.is_some()),
            ("--assertion-timeout-ms", self.assertion_timeout_ms.is_some()),
        ]
        .into_iter()
        .filter_map(|(flag, set)| set.then_some(flag))
        .collect()
    }

    /// Layer these flags over `config`
    pub fn apply(&self, config: &mut SmokeConfig) {
        if let Some(ref url) = self.url {
            config.target_url.clone_from(url);
        }
        if let Some(ms) = self.settle_ms {
            config.settle_delay_ms = ms;
        }
        if let Some(ref selector) = self.surface_selector {
            config.surface_selector.clone_from(selector);
        }
        if let Some(ms) = self.surface_timeout_ms {
            config.surface_timeout_ms = ms;
        }
        if let Some(ref selector) = self.text_selector {
            config.text_selector.clone_from(selector);
        }
        if let Some(ref text) = self.expected_text {
            config.expected_text.clone_from(text);
        }
        if let Some(ms) = self.assertion_timeout_ms {
            config.assertion_timeout_ms = ms;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(ref path) = self.chromium_path {
            config.browser.chromium_path = Some(path.clone());
        }
        if self.no_sandbox {
            config.browser.sandbox = false;
        }
    }
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Target and timing options
    #[command(flatten)]
    pub target: TargetArgs,

    /// Run a YAML suite instead of the built-in one.
    ///
    /// `--url` redirects the suite's visit steps; flags that shape the
    /// built-in suite are rejected.
    #[arg(long)]
    pub suite: Option<PathBuf>,

    /// Stop after the first failing test
    #[arg(long)]
    pub fail_fast: bool,

    /// Run the suite N times and fail if outcomes differ
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,

    /// Result format on stdout
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormatArg,

    /// Directory for report.json and failure screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Save a screenshot when a test fails (requires --output)
    #[arg(long, requires = "output")]
    pub screenshot_on_failure: bool,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Target and timing options
    #[command(flatten)]
    pub target: TargetArgs,

    /// Request timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub timeout_ms: u64,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Target and timing options
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Result format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Log line format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
