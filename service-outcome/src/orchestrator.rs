//! Request lifecycle orchestration
//!
//! [`ResponseOrchestrator`] is built once per service and shared by every
//! request. The transport calls it once when a request arrives and once when
//! the outcome is known:
//!
//! 1. [`begin`](ResponseOrchestrator::begin) (or
//!    [`correlation_id`](ResponseOrchestrator::correlation_id) followed by
//!    [`request_received`](ResponseOrchestrator::request_received)) resolves
//!    the correlation id, logs the request and counts it.
//! 2. One outcome method ([`ok`](ResponseOrchestrator::ok),
//!    [`not_found`](ResponseOrchestrator::not_found),
//!    [`bad_request`](ResponseOrchestrator::bad_request), ...) builds the body,
//!    logs at the outcome's severity, counts the outcome and records response
//!    time and size.
//!
//! Per-request values travel in a [`RequestContext`] so the orchestrator
//! itself holds no request state.
//!
//! ```rust
//! use std::sync::Arc;
//! use service_outcome::metrics::InMemoryMetricsEmitter;
//! use service_outcome::orchestrator::ResponseOrchestrator;
//!
//! # fn main() -> service_outcome::Result<()> {
//! let orchestrator = ResponseOrchestrator::new("orders", Arc::new(InMemoryMetricsEmitter::new()));
//!
//! let ctx = orchestrator.begin("getOrder", Some("upstream-7"), &42_u64)?;
//! let response = orchestrator.ok(&ctx, serde_json::json!({"id": 42}))?;
//!
//! assert_eq!(response.status.as_u16(), 200);
//! assert_eq!(response.correlation_id.as_str(), "upstream-7");
//! # Ok(())
//! # }
//! ```
//!
//! Metrics failures are never swallowed: the call returns
//! [`Error::Metrics`](crate::Error::Metrics) and no response is produced.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use tracing::{debug, error, info, trace, warn, Level};

use crate::config::Config;
use crate::contracts::{ApiError, ResponseEnvelope};
use crate::error::Result;
use crate::ids::{CorrelationId, IdGenerator, TypedIdGenerator, CORRELATION_ID_HEADER};
use crate::messages;
use crate::metrics::{emitter_from_config, MetricsEmitter, ServiceMetricName};
use crate::outcome::Outcome;
use crate::response::{ResponseContent, ServiceResponse};

/// Emit an event at a level chosen at runtime
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            level if level == Level::ERROR => error!($($arg)+),
            level if level == Level::WARN => warn!($($arg)+),
            level if level == Level::INFO => info!($($arg)+),
            level if level == Level::DEBUG => debug!($($arg)+),
            _ => trace!($($arg)+),
        }
    };
}

/// Values belonging to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Logical operation name, used as the `method` metric tag
    pub method: String,
    /// Correlation id of the request
    pub correlation_id: CorrelationId,
    /// When the request arrived
    pub request_start: DateTime<Utc>,
}

impl RequestContext {
    /// Create a context for a request
    pub fn new(
        method: impl Into<String>,
        correlation_id: CorrelationId,
        request_start: DateTime<Utc>,
    ) -> Self {
        Self {
            method: method.into(),
            correlation_id,
            request_start,
        }
    }
}

/// Turns request outcomes into uniform responses with logs and metrics
#[derive(Clone)]
pub struct ResponseOrchestrator {
    service_name: Arc<str>,
    metrics: Arc<dyn MetricsEmitter>,
    ids: Arc<dyn IdGenerator>,
    correlation_header: Option<Arc<str>>,
}

impl ResponseOrchestrator {
    /// Create an orchestrator for a service
    ///
    /// Fresh correlation ids are TypeIDs until
    /// [`with_id_generator`](Self::with_id_generator) says otherwise.
    pub fn new(service_name: impl Into<String>, metrics: Arc<dyn MetricsEmitter>) -> Self {
        Self {
            service_name: Arc::from(service_name.into()),
            metrics,
            ids: Arc::new(TypedIdGenerator::default()),
            correlation_header: None,
        }
    }

    /// Create an orchestrator from loaded configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.service.name.clone(), emitter_from_config(&config.metrics))
            .with_id_generator(config.correlation.id_format.generator())
            .with_correlation_header(config.correlation.header.as_str())
    }

    /// Read and write correlation ids under `header` instead of
    /// `x-correlation-id`
    #[must_use]
    pub fn with_correlation_header(mut self, header: impl Into<Arc<str>>) -> Self {
        self.correlation_header = Some(header.into());
        self
    }

    /// Header correlation ids are read from and sent under
    #[must_use]
    pub fn correlation_header(&self) -> &str {
        self.correlation_header
            .as_deref()
            .unwrap_or(CORRELATION_ID_HEADER)
    }

    /// Replace the correlation id generator
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Name used as the `service` tag on every metric
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Resolve the correlation id for a request
    ///
    /// A supplied non-blank id is returned unchanged. Otherwise a fresh id is
    /// generated and logged.
    pub fn correlation_id(&self, requested: Option<&str>) -> CorrelationId {
        if let Some(id) = requested.and_then(|value| CorrelationId::new(value).ok()) {
            return id;
        }

        let id = self.ids.generate();
        info!(
            correlation_id = %id,
            service = %self.service_name,
            "{}",
            messages::correlation_set(&id)
        );
        id
    }

    /// Resolve the correlation id from incoming request headers
    ///
    /// Uses the configured correlation header; falls back to a generated id
    /// like [`correlation_id`](Self::correlation_id).
    pub fn correlation_id_from_headers(&self, headers: &HeaderMap) -> CorrelationId {
        match CorrelationId::from_headers(headers, self.correlation_header()) {
            Some(id) => id,
            None => self.correlation_id(None),
        }
    }

    /// Record that a request arrived
    ///
    /// Returns `ctx.request_start` unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`](crate::Error::Metrics) if the emitter rejects
    /// either request counter.
    pub fn request_received<R: fmt::Debug + ?Sized>(
        &self,
        ctx: &RequestContext,
        request: &R,
    ) -> Result<DateTime<Utc>> {
        debug!(
            correlation_id = %ctx.correlation_id,
            service = %self.service_name,
            method = %ctx.method,
            "{}",
            messages::request_start(&ctx.correlation_id, ctx.request_start.to_rfc3339())
        );
        debug!(
            correlation_id = %ctx.correlation_id,
            service = %self.service_name,
            method = %ctx.method,
            request = ?request,
            "{}",
            messages::request_received(&ctx.correlation_id)
        );

        self.metrics.add_service_method_count_metric(
            &self.service_name,
            &ctx.method,
            ServiceMetricName::Requests,
        )?;
        self.metrics.add_request_count_metric(&self.service_name)?;

        Ok(ctx.request_start)
    }

    /// Start handling a request: stamp the start time, resolve the
    /// correlation id and record the request
    ///
    /// # Errors
    ///
    /// Fails like [`request_received`](Self::request_received).
    pub fn begin<R: fmt::Debug + ?Sized>(
        &self,
        method: impl Into<String>,
        requested_correlation_id: Option<&str>,
        request: &R,
    ) -> Result<RequestContext> {
        let request_start = Utc::now();
        let correlation_id = self.correlation_id(requested_correlation_id);
        let ctx = RequestContext::new(method, correlation_id, request_start);
        self.request_received(&ctx, request)?;
        Ok(ctx)
    }

    /// Log a resource loaded while handling a request
    pub fn resource_retrieved<R: fmt::Debug + ?Sized>(&self, resource: &R) {
        trace!(
            service = %self.service_name,
            resource = ?resource,
            "{}",
            messages::resource_retrieved()
        );
    }

    /// 200 with the payload as body
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`](crate::Error::Metrics) if the emitter fails,
    /// or [`Error::Serialization`](crate::Error::Serialization) if the payload
    /// cannot be serialized for the size metric.
    pub fn ok<T: Serialize>(&self, ctx: &RequestContext, payload: T) -> Result<ServiceResponse<T>> {
        self.respond(ctx, Outcome::Ok, ResponseContent::Payload(payload))
    }

    /// 201 with the created resource as body
    ///
    /// # Errors
    ///
    /// Same as [`ok`](Self::ok).
    pub fn created<T: Serialize>(
        &self,
        ctx: &RequestContext,
        payload: T,
    ) -> Result<ServiceResponse<T>> {
        self.respond(ctx, Outcome::Created, ResponseContent::Payload(payload))
    }

    /// 204 with no body
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`](crate::Error::Metrics) if the emitter fails.
    pub fn no_content<T: Serialize>(&self, ctx: &RequestContext) -> Result<ServiceResponse<T>> {
        self.respond(ctx, Outcome::NoContent, ResponseContent::Empty)
    }

    /// 404 with no body
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`](crate::Error::Metrics) if the emitter fails.
    pub fn not_found<T: Serialize>(&self, ctx: &RequestContext) -> Result<ServiceResponse<T>> {
        self.respond(ctx, Outcome::NotFound, ResponseContent::Empty)
    }

    /// 400 carrying validation errors
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`](crate::Error::Metrics) if the emitter fails.
    pub fn bad_request<T: Serialize>(
        &self,
        ctx: &RequestContext,
        errors: Vec<ApiError>,
    ) -> Result<ServiceResponse<T>> {
        self.respond(
            ctx,
            Outcome::BadRequest,
            ResponseEnvelope::bad_request(errors).into(),
        )
    }

    /// 401 carrying authorization errors
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`](crate::Error::Metrics) if the emitter fails.
    pub fn unauthorized<T: Serialize>(
        &self,
        ctx: &RequestContext,
        errors: Vec<ApiError>,
    ) -> Result<ServiceResponse<T>> {
        self.respond(
            ctx,
            Outcome::Unauthorized,
            ResponseEnvelope::unauthorized(errors).into(),
        )
    }

    /// 403 carrying authentication errors
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`](crate::Error::Metrics) if the emitter fails.
    pub fn forbidden<T: Serialize>(
        &self,
        ctx: &RequestContext,
        errors: Vec<ApiError>,
    ) -> Result<ServiceResponse<T>> {
        self.respond(
            ctx,
            Outcome::Forbidden,
            ResponseEnvelope::forbidden(errors).into(),
        )
    }

    /// 500 with the generic internal error body
    ///
    /// `error` is logged but never placed in the response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`](crate::Error::Metrics) if the emitter fails.
    pub fn internal_server_exception<T: Serialize, E: fmt::Display + ?Sized>(
        &self,
        ctx: &RequestContext,
        error: &E,
    ) -> Result<ServiceResponse<T>> {
        let detail = error.to_string();
        self.finish(
            ctx,
            Outcome::InternalServerException,
            ResponseEnvelope::internal_error().into(),
            Some(&detail),
        )
    }

    /// Finish a request with arbitrary content and status
    ///
    /// Every outcome method ends here. The correlation id, content and status
    /// are moved into the response untouched; response time and size are
    /// recorded for the request's method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) if the
    /// content cannot be serialized, or [`Error::Metrics`](crate::Error::Metrics)
    /// if the emitter fails.
    pub fn content<T: Serialize>(
        &self,
        ctx: &RequestContext,
        content: ResponseContent<T>,
        status: StatusCode,
    ) -> Result<ServiceResponse<T>> {
        let mut response = ServiceResponse::new(ctx.correlation_id.clone(), status, content);
        if let Some(header) = &self.correlation_header {
            response = response.with_correlation_header(Arc::clone(header));
        }

        let body = serde_json::to_vec(&response.content)?;
        trace!(
            correlation_id = %ctx.correlation_id,
            service = %self.service_name,
            method = %ctx.method,
            status = response.status.as_u16(),
            content = %String::from_utf8_lossy(&body),
            "{}",
            messages::service_response_returned(&ctx.correlation_id)
        );

        let request_end = Utc::now();
        // a start stamped by a clock ahead of ours counts as zero
        let response_time =
            u64::try_from((request_end - ctx.request_start).num_milliseconds()).unwrap_or(0);
        let response_size = u64::try_from(body.len()).unwrap_or(u64::MAX);

        debug!(
            correlation_id = %ctx.correlation_id,
            service = %self.service_name,
            method = %ctx.method,
            "{}",
            messages::request_end(&ctx.correlation_id, request_end.to_rfc3339())
        );
        info!(
            correlation_id = %ctx.correlation_id,
            service = %self.service_name,
            method = %ctx.method,
            duration_ms = response_time,
            "{}",
            messages::request_duration(&ctx.correlation_id, response_time)
        );

        self.metrics
            .add_service_response_time_metric(&self.service_name, &ctx.method, response_time)?;
        self.metrics
            .add_service_response_size_metric(&self.service_name, &ctx.method, response_size)?;

        Ok(response)
    }

    fn respond<T: Serialize>(
        &self,
        ctx: &RequestContext,
        outcome: Outcome,
        content: ResponseContent<T>,
    ) -> Result<ServiceResponse<T>> {
        self.finish(ctx, outcome, content, None)
    }

    /// One "response returned" event per outcome; `error` is the raw failure
    /// of a 500 and only ever reaches the logs.
    fn finish<T: Serialize>(
        &self,
        ctx: &RequestContext,
        outcome: Outcome,
        content: ResponseContent<T>,
        error: Option<&str>,
    ) -> Result<ServiceResponse<T>> {
        let envelope = content.envelope();
        let error_count = envelope.map_or(0, ResponseEnvelope::error_count);
        event_at!(
            outcome.log_level(),
            correlation_id = %ctx.correlation_id,
            service = %self.service_name,
            method = %ctx.method,
            outcome = %outcome,
            envelope = envelope.map(tracing::field::debug),
            error = error,
            "{}",
            messages::response_returned(outcome, &ctx.correlation_id, error_count)
        );

        self.metrics
            .add_service_method_count_metric(&self.service_name, &ctx.method, outcome.metric())?;

        self.content(ctx, content, outcome.status_code())
    }
}

impl fmt::Debug for ResponseOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseOrchestrator")
            .field("service_name", &self.service_name)
            .field("ids", &self.ids)
            .field("correlation_header", &self.correlation_header())
            .finish_non_exhaustive()
    }
}
