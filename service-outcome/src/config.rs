//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `SERVICE_OUTCOME_`, nested keys split on `__`)
//! 2. TOML file (`./config.toml`, or the path given to [`Config::load_from`])
//! 3. Default values
//!
//! ```toml
//! [service]
//! name = "orders"
//! log_level = "info"
//! environment = "dev"
//!
//! [correlation]
//! header = "x-correlation-id"
//! id_format = "typed"
//!
//! [metrics]
//! enabled = true
//! backend = "tracing"
//! ```

use std::path::Path;
use std::sync::Arc;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::{IdGenerator, TypedIdGenerator, UuidGenerator, CORRELATION_ID_HEADER};

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "SERVICE_OUTCOME_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Correlation id handling
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Metrics backend selection
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Service identity and logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name, used as the `service` tag on every metric
    #[serde(default = "default_service_name")]
    pub name: String,

    /// `EnvFilter` directive for the tracing subscriber
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Deployment environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            environment: default_environment(),
        }
    }
}

/// Correlation id handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Header carrying the correlation id between services
    #[serde(default = "default_correlation_header")]
    pub header: String,

    /// Format of generated ids
    #[serde(default)]
    pub id_format: IdFormat,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            header: default_correlation_header(),
            id_format: IdFormat::default(),
        }
    }
}

/// Format of generated correlation ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdFormat {
    /// TypeID with a UUIDv7 suffix (`corr_01h455vb4pex5vsknk084sn02q`)
    #[default]
    Typed,
    /// Hyphenated random UUIDv4
    Uuid,
}

impl IdFormat {
    /// Generator producing ids in this format
    #[must_use]
    pub fn generator(&self) -> Arc<dyn IdGenerator> {
        match self {
            Self::Typed => Arc::new(TypedIdGenerator::default()),
            Self::Uuid => Arc::new(UuidGenerator),
        }
    }
}

/// Metrics backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics are recorded at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Where metrics are sent
    #[serde(default)]
    pub backend: MetricsBackend,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: MetricsBackend::default(),
        }
    }
}

/// Metrics destinations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsBackend {
    /// Structured tracing events
    #[default]
    Tracing,
    /// OpenTelemetry instruments (requires the `otel-metrics` feature)
    Otel,
}

fn default_service_name() -> String {
    "service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_correlation_header() -> String {
    CORRELATION_ID_HEADER.to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from defaults, `./config.toml` if present, then the environment
    pub fn load() -> Result<Self> {
        let path = Path::new("config.toml");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }
}
