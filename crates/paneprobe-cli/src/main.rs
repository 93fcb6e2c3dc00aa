//! Paneprobe CLI: browser smoke tests for canvas-rendered web apps
//!
//! ## Usage
//!
//! ```bash
//! paneprobe run                                  # Run the built-in smoke suite
//! paneprobe run --url http://localhost:5000      # Against another host
//! paneprobe run --suite smoke.yaml --output out  # Custom suite, JSON report
//! paneprobe check                                # Is the app being served?
//! paneprobe config                               # Print effective config
//! ```

use clap::Parser;
use paneprobe_cli::{
    logging, render_config, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands,
    SmokeRunner, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(&config, cli.log_format);

    match cli.command {
        Commands::Config(args) => {
            print!("{}", render_config(&args.target)?);
            Ok(())
        }
        Commands::Run(args) => {
            let rt = runtime()?;
            let mut runner = SmokeRunner::new(&config);
            rt.block_on(runner.run(&args))
        }
        Commands::Check(args) => {
            let rt = runtime()?;
            let runner = SmokeRunner::new(&config);
            rt.block_on(runner.check(&args))
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(ColorChoice::from(cli.color.clone()))
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::test_execution(format!("Failed to create runtime: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_from_flags() {
        let cli = Cli::parse_from(["paneprobe", "-v", "--color", "never", "config"]);
        let config = build_config(&cli);
        assert_eq!(config.verbosity, Verbosity::Verbose);
        assert_eq!(config.color, ColorChoice::Never);
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let cli = Cli::parse_from(["paneprobe", "-q", "-vv", "config"]);
        assert!(build_config(&cli).verbosity.is_quiet());
    }
}
