//! Structured logging initialisation for the CLI.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use tcf_config::{Config, LogFormat};

/// Filter forced by `--debug`.
pub(crate) const DEBUG_FILTER: &str = "debug";

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first use.
///
/// Later calls are no-ops, so tests driving the runtime repeatedly keep the
/// first subscriber.
pub(crate) fn initialise(config: &Config, debug: bool) -> Result<(), TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config, debug))
        .map(|_| ())
}

fn filter_expression(config: &Config, debug: bool) -> &str {
    if debug {
        DEBUG_FILTER
    } else {
        config.log_filter()
    }
}

fn install_subscriber(config: &Config, debug: bool) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(filter_expression(config, debug))
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(debug)
            .with_level(true)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .without_time()
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
