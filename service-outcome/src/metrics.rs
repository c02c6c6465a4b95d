//! Service metrics
//!
//! The orchestrator reports four kinds of metric through a [`MetricsEmitter`]:
//! per-method outcome counts, per-service request counts, response times and
//! response sizes. Which backend receives them is up to the caller:
//!
//! - [`TracingMetricsEmitter`] writes each sample as a structured `tracing`
//!   event on the `service_outcome::metrics` target
//! - [`InMemoryMetricsEmitter`] keeps every sample in process and can be
//!   queried; it is built directly (tests, local tooling) and is not a
//!   configurable backend because its sample lists are unbounded
//! - [`OtelMetricsEmitter`] (feature `otel-metrics`) records OpenTelemetry
//!   counters and histograms
//! - [`NoopMetricsEmitter`] discards everything
//!
//! Emitter failures are returned to the orchestrator, which passes them on to
//! its caller instead of building a response.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::config::{MetricsBackend, MetricsConfig};

/// Tracing target used by [`TracingMetricsEmitter`]
pub const METRICS_TARGET: &str = "service_outcome::metrics";

/// Closed set of per-method counter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceMetricName {
    /// Requests received
    Requests,
    /// 200 responses
    OkResponses,
    /// 201 responses
    CreatedResponses,
    /// 204 responses
    NoContentResponses,
    /// 404 responses
    NotFoundResponses,
    /// 400 responses
    BadRequestResponses,
    /// 401 responses
    UnauthorizedResponses,
    /// 403 responses
    ForbiddenResponses,
    /// 500 responses
    InternalServerExceptionResponses,
}

impl ServiceMetricName {
    /// Every metric name, in declaration order
    pub const ALL: [Self; 9] = [
        Self::Requests,
        Self::OkResponses,
        Self::CreatedResponses,
        Self::NoContentResponses,
        Self::NotFoundResponses,
        Self::BadRequestResponses,
        Self::UnauthorizedResponses,
        Self::ForbiddenResponses,
        Self::InternalServerExceptionResponses,
    ];

    /// Wire name of the metric
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Requests => "REQUESTS",
            Self::OkResponses => "OK_RESPONSES",
            Self::CreatedResponses => "CREATED_RESPONSES",
            Self::NoContentResponses => "NO_CONTENT_RESPONSES",
            Self::NotFoundResponses => "NOT_FOUND_RESPONSES",
            Self::BadRequestResponses => "BAD_REQUEST_RESPONSES",
            Self::UnauthorizedResponses => "UNAUTHORIZED_RESPONSES",
            Self::ForbiddenResponses => "FORBIDDEN_RESPONSES",
            Self::InternalServerExceptionResponses => "INTERNAL_SERVER_EXCEPTION_RESPONSES",
        }
    }
}

impl fmt::Display for ServiceMetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instrument names following OpenTelemetry conventions
pub mod metric_names {
    /// Per-method outcome counter
    pub const SERVICE_METHOD_COUNT: &str = "service.method.count";
    /// Per-service request counter
    pub const SERVICE_REQUEST_COUNT: &str = "service.request.count";
    /// Response time histogram (milliseconds)
    pub const SERVICE_RESPONSE_TIME: &str = "service.response.time";
    /// Response size histogram (bytes)
    pub const SERVICE_RESPONSE_SIZE: &str = "service.response.size";
}

/// Attribute keys attached to every sample
pub mod metric_labels {
    /// Service name
    pub const SERVICE_NAME: &str = "service.name";
    /// Service method
    pub const SERVICE_METHOD: &str = "service.method";
    /// Outcome counter name
    pub const METRIC_NAME: &str = "metric.name";
}

/// Failure reported by a metrics backend
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct MetricsError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MetricsError {
    /// Create an error with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping the backend's own error
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Destination for service metrics
///
/// Implementations must be safe to share between concurrent requests.
pub trait MetricsEmitter: Send + Sync {
    /// Increment a per-method counter
    fn add_service_method_count_metric(
        &self,
        service_name: &str,
        method: &str,
        metric: ServiceMetricName,
    ) -> Result<(), MetricsError>;

    /// Increment the per-service request counter
    fn add_request_count_metric(&self, service_name: &str) -> Result<(), MetricsError>;

    /// Record how long a request took, in milliseconds
    fn add_service_response_time_metric(
        &self,
        service_name: &str,
        method: &str,
        milliseconds: u64,
    ) -> Result<(), MetricsError>;

    /// Record the serialized size of a response body, in bytes
    fn add_service_response_size_metric(
        &self,
        service_name: &str,
        method: &str,
        bytes: u64,
    ) -> Result<(), MetricsError>;
}

/// Build the emitter selected by configuration
#[must_use]
pub fn emitter_from_config(config: &MetricsConfig) -> Arc<dyn MetricsEmitter> {
    if !config.enabled {
        tracing::info!("Service metrics disabled in configuration");
        return Arc::new(NoopMetricsEmitter);
    }

    match config.backend {
        MetricsBackend::Tracing => Arc::new(TracingMetricsEmitter),
        #[cfg(feature = "otel-metrics")]
        MetricsBackend::Otel => Arc::new(OtelMetricsEmitter::global()),
        #[cfg(not(feature = "otel-metrics"))]
        MetricsBackend::Otel => {
            tracing::warn!(
                "OpenTelemetry metrics requested but the otel-metrics feature is disabled; falling back to tracing"
            );
            Arc::new(TracingMetricsEmitter)
        }
    }
}

/// Discards every metric
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsEmitter;

impl MetricsEmitter for NoopMetricsEmitter {
    fn add_service_method_count_metric(
        &self,
        _service_name: &str,
        _method: &str,
        _metric: ServiceMetricName,
    ) -> Result<(), MetricsError> {
        Ok(())
    }

    fn add_request_count_metric(&self, _service_name: &str) -> Result<(), MetricsError> {
        Ok(())
    }

    fn add_service_response_time_metric(
        &self,
        _service_name: &str,
        _method: &str,
        _milliseconds: u64,
    ) -> Result<(), MetricsError> {
        Ok(())
    }

    fn add_service_response_size_metric(
        &self,
        _service_name: &str,
        _method: &str,
        _bytes: u64,
    ) -> Result<(), MetricsError> {
        Ok(())
    }
}

/// Writes metrics as structured tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetricsEmitter;

impl MetricsEmitter for TracingMetricsEmitter {
    fn add_service_method_count_metric(
        &self,
        service_name: &str,
        method: &str,
        metric: ServiceMetricName,
    ) -> Result<(), MetricsError> {
        tracing::info!(
            target: METRICS_TARGET,
            instrument = metric_names::SERVICE_METHOD_COUNT,
            service = service_name,
            method = method,
            metric = metric.as_str(),
            value = 1_u64,
            "metric recorded"
        );
        Ok(())
    }

    fn add_request_count_metric(&self, service_name: &str) -> Result<(), MetricsError> {
        tracing::info!(
            target: METRICS_TARGET,
            instrument = metric_names::SERVICE_REQUEST_COUNT,
            service = service_name,
            value = 1_u64,
            "metric recorded"
        );
        Ok(())
    }

    fn add_service_response_time_metric(
        &self,
        service_name: &str,
        method: &str,
        milliseconds: u64,
    ) -> Result<(), MetricsError> {
        tracing::info!(
            target: METRICS_TARGET,
            instrument = metric_names::SERVICE_RESPONSE_TIME,
            service = service_name,
            method = method,
            value = milliseconds,
            "metric recorded"
        );
        Ok(())
    }

    fn add_service_response_size_metric(
        &self,
        service_name: &str,
        method: &str,
        bytes: u64,
    ) -> Result<(), MetricsError> {
        tracing::info!(
            target: METRICS_TARGET,
            instrument = metric_names::SERVICE_RESPONSE_SIZE,
            service = service_name,
            method = method,
            value = bytes,
            "metric recorded"
        );
        Ok(())
    }
}

type MethodKey = (String, String);

/// Records metrics in process for inspection
///
/// Counters are lock-free per key; samples are appended in arrival order and
/// kept until [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct InMemoryMetricsEmitter {
    method_counts: DashMap<(String, String, ServiceMetricName), AtomicU64>,
    request_counts: DashMap<String, AtomicU64>,
    response_times: DashMap<MethodKey, Vec<u64>>,
    response_sizes: DashMap<MethodKey, Vec<u64>>,
}

impl InMemoryMetricsEmitter {
    /// Create an empty emitter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a per-method counter
    #[must_use]
    pub fn method_count(&self, service_name: &str, method: &str, metric: ServiceMetricName) -> u64 {
        self.method_counts
            .get(&(service_name.to_string(), method.to_string(), metric))
            .map_or(0, |count| count.load(Ordering::Relaxed))
    }

    /// Current value of the per-service request counter
    #[must_use]
    pub fn request_count(&self, service_name: &str) -> u64 {
        self.request_counts
            .get(service_name)
            .map_or(0, |count| count.load(Ordering::Relaxed))
    }

    /// Response time samples recorded for a method, in milliseconds
    #[must_use]
    pub fn response_times(&self, service_name: &str, method: &str) -> Vec<u64> {
        Self::samples(&self.response_times, service_name, method)
    }

    /// Response size samples recorded for a method, in bytes
    #[must_use]
    pub fn response_sizes(&self, service_name: &str, method: &str) -> Vec<u64> {
        Self::samples(&self.response_sizes, service_name, method)
    }

    /// Forget everything recorded so far
    pub fn reset(&self) {
        self.method_counts.clear();
        self.request_counts.clear();
        self.response_times.clear();
        self.response_sizes.clear();
    }

    fn samples(map: &DashMap<MethodKey, Vec<u64>>, service_name: &str, method: &str) -> Vec<u64> {
        map.get(&(service_name.to_string(), method.to_string()))
            .map(|samples| samples.clone())
            .unwrap_or_default()
    }
}

impl MetricsEmitter for InMemoryMetricsEmitter {
    fn add_service_method_count_metric(
        &self,
        service_name: &str,
        method: &str,
        metric: ServiceMetricName,
    ) -> Result<(), MetricsError> {
        self.method_counts
            .entry((service_name.to_string(), method.to_string(), metric))
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn add_request_count_metric(&self, service_name: &str) -> Result<(), MetricsError> {
        self.request_counts
            .entry(service_name.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn add_service_response_time_metric(
        &self,
        service_name: &str,
        method: &str,
        milliseconds: u64,
    ) -> Result<(), MetricsError> {
        self.response_times
            .entry((service_name.to_string(), method.to_string()))
            .or_default()
            .push(milliseconds);
        Ok(())
    }

    fn add_service_response_size_metric(
        &self,
        service_name: &str,
        method: &str,
        bytes: u64,
    ) -> Result<(), MetricsError> {
        self.response_sizes
            .entry((service_name.to_string(), method.to_string()))
            .or_default()
            .push(bytes);
        Ok(())
    }
}

#[cfg(feature = "otel-metrics")]
pub use otel::OtelMetricsEmitter;

#[cfg(feature = "otel-metrics")]
mod otel {
    use std::fmt;

    use opentelemetry::metrics::{Counter, Histogram, Meter};
    use opentelemetry::{global, KeyValue};

    use super::{metric_labels, metric_names, MetricsEmitter, MetricsError, ServiceMetricName};

    /// Records metrics through the OpenTelemetry metrics API
    pub struct OtelMetricsEmitter {
        method_counts: Counter<u64>,
        request_counts: Counter<u64>,
        response_time: Histogram<u64>,
        response_size: Histogram<u64>,
    }

    impl OtelMetricsEmitter {
        /// Create instruments on the given meter
        #[must_use]
        pub fn new(meter: &Meter) -> Self {
            Self {
                method_counts: meter
                    .u64_counter(metric_names::SERVICE_METHOD_COUNT)
                    .with_description("Service method outcomes")
                    .build(),
                request_counts: meter
                    .u64_counter(metric_names::SERVICE_REQUEST_COUNT)
                    .with_description("Requests received by the service")
                    .build(),
                response_time: meter
                    .u64_histogram(metric_names::SERVICE_RESPONSE_TIME)
                    .with_unit("ms")
                    .build(),
                response_size: meter
                    .u64_histogram(metric_names::SERVICE_RESPONSE_SIZE)
                    .with_unit("By")
                    .build(),
            }
        }

        /// Create instruments on the global meter provider
        #[must_use]
        pub fn global() -> Self {
            Self::new(&global::meter("service-outcome"))
        }
    }

    impl fmt::Debug for OtelMetricsEmitter {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("OtelMetricsEmitter").finish_non_exhaustive()
        }
    }

    fn method_attributes(service_name: &str, method: &str) -> [KeyValue; 2] {
        [
            KeyValue::new(metric_labels::SERVICE_NAME, service_name.to_string()),
            KeyValue::new(metric_labels::SERVICE_METHOD, method.to_string()),
        ]
    }

    impl MetricsEmitter for OtelMetricsEmitter {
        fn add_service_method_count_metric(
            &self,
            service_name: &str,
            method: &str,
            metric: ServiceMetricName,
        ) -> Result<(), MetricsError> {
            let [service, method] = method_attributes(service_name, method);
            self.method_counts.add(
                1,
                &[service, method, KeyValue::new(metric_labels::METRIC_NAME, metric.as_str())],
            );
            Ok(())
        }

        fn add_request_count_metric(&self, service_name: &str) -> Result<(), MetricsError> {
            self.request_counts.add(
                1,
                &[KeyValue::new(metric_labels::SERVICE_NAME, service_name.to_string())],
            );
            Ok(())
        }

        fn add_service_response_time_metric(
            &self,
            service_name: &str,
            method: &str,
            milliseconds: u64,
        ) -> Result<(), MetricsError> {
            self.response_time
                .record(milliseconds, &method_attributes(service_name, method));
            Ok(())
        }

        fn add_service_response_size_metric(
            &self,
            service_name: &str,
            method: &str,
            bytes: u64,
        ) -> Result<(), MetricsError> {
            self.response_size
                .record(bytes, &method_attributes(service_name, method));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_wire_format() {
        assert_eq!(ServiceMetricName::Requests.as_str(), "REQUESTS");
        assert_eq!(
            ServiceMetricName::InternalServerExceptionResponses.to_string(),
            "INTERNAL_SERVER_EXCEPTION_RESPONSES"
        );
        assert_eq!(
            serde_json::to_string(&ServiceMetricName::NoContentResponses).unwrap(),
            r#""NO_CONTENT_RESPONSES""#
        );
    }

    #[test]
    fn test_all_metric_names_distinct() {
        let mut names: Vec<_> = ServiceMetricName::ALL.iter().map(|m| m.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ServiceMetricName::ALL.len());
    }

    #[test]
    fn test_in_memory_counts() {
        let emitter = InMemoryMetricsEmitter::new();
        emitter
            .add_service_method_count_metric("orders", "get", ServiceMetricName::OkResponses)
            .unwrap();
        emitter
            .add_service_method_count_metric("orders", "get", ServiceMetricName::OkResponses)
            .unwrap();
        emitter.add_request_count_metric("orders").unwrap();

        assert_eq!(
            emitter.method_count("orders", "get", ServiceMetricName::OkResponses),
            2
        );
        assert_eq!(
            emitter.method_count("orders", "get", ServiceMetricName::NotFoundResponses),
            0
        );
        assert_eq!(emitter.request_count("orders"), 1);
        assert_eq!(emitter.request_count("billing"), 0);
    }

    #[test]
    fn test_in_memory_samples() {
        let emitter = InMemoryMetricsEmitter::new();
        emitter.add_service_response_time_metric("orders", "list", 12).unwrap();
        emitter.add_service_response_time_metric("orders", "list", 7).unwrap();
        emitter.add_service_response_size_metric("orders", "list", 4).unwrap();

        assert_eq!(emitter.response_times("orders", "list"), vec![12, 7]);
        assert_eq!(emitter.response_sizes("orders", "list"), vec![4]);
        assert!(emitter.response_times("orders", "get").is_empty());
    }

    #[test]
    fn test_in_memory_reset() {
        let emitter = InMemoryMetricsEmitter::new();
        emitter.add_request_count_metric("orders").unwrap();
        emitter.reset();
        assert_eq!(emitter.request_count("orders"), 0);
    }

    #[test]
    fn test_in_memory_concurrent_increments() {
        let emitter = Arc::new(InMemoryMetricsEmitter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let emitter = Arc::clone(&emitter);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        emitter.add_request_count_metric("orders").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(emitter.request_count("orders"), 800);
    }

    #[test]
    fn test_tracing_and_noop_emitters_succeed() {
        let emitters: [&dyn MetricsEmitter; 2] = [&TracingMetricsEmitter, &NoopMetricsEmitter];
        for emitter in emitters {
            assert!(emitter
                .add_service_method_count_metric("orders", "get", ServiceMetricName::Requests)
                .is_ok());
            assert!(emitter.add_request_count_metric("orders").is_ok());
            assert!(emitter.add_service_response_time_metric("orders", "get", 3).is_ok());
            assert!(emitter.add_service_response_size_metric("orders", "get", 4).is_ok());
        }
    }

    #[test]
    fn test_metrics_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        let err = MetricsError::with_source("exporter failed", io);
        assert_eq!(err.to_string(), "exporter failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_emitter_from_config_disabled() {
        let config = MetricsConfig {
            enabled: false,
            backend: MetricsBackend::Tracing,
        };
        let emitter = emitter_from_config(&config);
        assert!(emitter.add_request_count_metric("orders").is_ok());
    }
}
