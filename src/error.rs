//! Error types for the telemetry engine.

use thiserror::Error;

use crate::data::ProviderId;

/// Errors raised by the polling, buffering and configuration layers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The status fetch could not complete.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The status response is missing data or has the wrong shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// A series was addressed before its chart was registered.
    #[error("No series registered for provider {0}")]
    UnknownProvider(ProviderId),

    /// Configuration could not be loaded or failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Writing an export file failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl TelemetryError {
    /// Whether this error ends the current poll chain.
    ///
    /// Only fetch-level failures stop polling; the other variants never
    /// come out of a tick.
    pub fn is_tick_failure(&self) -> bool {
        matches!(self, TelemetryError::Transport(_) | TelemetryError::Malformed(_))
    }
}

impl From<reqwest::Error> for TelemetryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TelemetryError::Malformed(err.to_string())
        } else {
            TelemetryError::Transport(err.to_string())
        }
    }
}

impl From<config::ConfigError> for TelemetryError {
    fn from(err: config::ConfigError) -> Self {
        TelemetryError::Config(err.to_string())
    }
}
