//! # service-outcome
//!
//! Uniform request outcomes for HTTP services: every handler ends in one of a
//! fixed set of responses, and every response is logged, counted and timed
//! the same way.
//!
//! ## Features
//!
//! - **Outcome orchestration**: ok, created, no content, not found, bad request,
//!   unauthorized, forbidden and internal exception, each with a fixed status,
//!   counter and log severity
//! - **Error envelopes**: structured `{"errors": [...]}` bodies; internal
//!   exceptions never leak error text to clients
//! - **Correlation ids**: forwarded from upstream or generated as TypeIDs
//! - **Metrics**: pluggable emitters (tracing events, in-memory, OpenTelemetry)
//! - **Pagination links**: `self`/`first`/`previous`/`next`/`last` for
//!   offset-paged collections
//! - **axum integration**: `ServiceResponse` implements `IntoResponse`
//!
//! ## Example
//!
//! ```rust,no_run
//! use service_outcome::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let orchestrator = ResponseOrchestrator::from_config(&config);
//!
//!     let ctx = orchestrator.begin("getOrder", None, "GET /orders/42")?;
//!     let response: ServiceResponse<serde_json::Value> = orchestrator.bad_request(
//!         &ctx,
//!         vec![ApiError::validation("IdInvalid", "Order ids are numeric.")],
//!     )?;
//!     assert_eq!(response.status.as_u16(), 400);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod contracts;
pub mod error;
pub mod ids;
pub mod links;
pub mod metrics;
pub mod observability;
pub mod orchestrator;
pub mod outcome;
pub mod response;

mod messages;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, IdFormat, MetricsBackend};
    pub use crate::contracts::{ApiError, EnvelopeKind, ErrorType, ResponseEnvelope};
    pub use crate::error::{Error, Result};
    pub use crate::ids::{CorrelationId, IdGenerator, CORRELATION_ID_HEADER};
    pub use crate::links::{
        ItemLinks, Link, LinkBuilder, LinkRelation, Links, PageOptions, QueryParam,
    };
    pub use crate::metrics::{
        InMemoryMetricsEmitter, MetricsEmitter, MetricsError, ServiceMetricName,
        TracingMetricsEmitter,
    };
    pub use crate::observability::init_tracing;
    pub use crate::orchestrator::{RequestContext, ResponseOrchestrator};
    pub use crate::outcome::Outcome;
    pub use crate::response::{ResponseContent, ServiceResponse};

    #[cfg(feature = "otel-metrics")]
    pub use crate::metrics::OtelMetricsEmitter;
}
