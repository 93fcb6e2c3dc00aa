//! Tracing subscriber setup

use crate::commands::LogFormatArg;
use crate::config::{CliConfig, Verbosity};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the event filter: `RUST_LOG` wins, otherwise the verbosity default
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()))
}

/// Install the global subscriber, writing to stderr.
///
/// A second call is a no-op.
pub fn init(config: &CliConfig, format: LogFormatArg) {
    let filter = env_filter(config.verbosity);
    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormatArg::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormatArg::Text => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(config.color.should_color())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let config = CliConfig::new();
        init(&config, LogFormatArg::Text);
        init(&config, LogFormatArg::Json);
    }

    #[test]
    fn test_filter_follows_verbosity() {
        if std::env::var_os("RUST_LOG").is_none() {
            let filter = env_filter(Verbosity::Quiet);
            assert_eq!(
                filter.max_level_hint(),
                Some(tracing::level_filters::LevelFilter::ERROR)
            );
        }
    }
}
