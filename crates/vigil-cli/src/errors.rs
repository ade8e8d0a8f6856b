//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use vigil_config::ConfigError;
use vigil_monit::{InvalidHost, MonitError, TransportError};

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to install signal handlers: {0}")]
    Signals(io::Error),
    #[error("failed to build HTTP transport: {0}")]
    Transport(#[source] TransportError),
    #[error(transparent)]
    Host(#[from] InvalidHost),
    #[error(transparent)]
    Monit(#[from] MonitError),
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}
