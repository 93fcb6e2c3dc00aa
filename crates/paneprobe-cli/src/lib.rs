//! Paneprobe CLI library
//!
//! Argument parsing, configuration layering and reporting for the
//! `paneprobe` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{
    CheckArgs, Cli, ColorArg, Commands, ConfigArgs, LogFormatArg, OutputFormatArg, RunArgs,
    TargetArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{results_json, OutputFormat, ProgressReporter};
pub use runner::{check_consistent, render_config, resolve_config, SmokeRunner, REPORT_FILE};
