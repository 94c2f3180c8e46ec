//! Error types for the CLI runtime.

use std::sync::Arc;

use thiserror::Error;

use crate::environment::EnvironmentError;
use crate::jobserver::HandoffError;
use crate::telemetry::TelemetryError;

/// Failures that stop an invocation before or around dispatch.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Handoff(#[from] HandoffError),
}
