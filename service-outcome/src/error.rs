//! Error types for the response pipeline

use thiserror::Error;

use crate::metrics::MetricsError;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the orchestrator and its supporting modules
///
/// The response pipeline defines no failure of its own. Everything here is
/// either a configuration problem found at startup or a collaborator failure
/// passed through untouched while a response was being built.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Response content could not be serialized for size measurement
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The metrics emitter rejected a metric
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// Tracing subscriber could not be installed
    #[error("Tracing error: {0}")]
    Tracing(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}
