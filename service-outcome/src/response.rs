//! The value handed back to the transport for every request
//!
//! A [`ServiceResponse`] carries the correlation id, the HTTP status and the
//! body. The body is a [`ResponseContent`]: nothing, the success payload, or
//! a failure [`ResponseEnvelope`].
//!
//! With the `axum` feature (on by default) a `ServiceResponse` can be
//! returned straight from a handler:
//!
//! ```rust,ignore
//! async fn get_order(State(svc): State<ResponseOrchestrator>) -> Result<ServiceResponse<Order>> {
//!     let ctx = svc.begin("getOrder", None, &"order 42")?;
//!     svc.ok(&ctx, load_order(42))
//! }
//! ```

use std::sync::Arc;

use http::StatusCode;
use serde::{Serialize, Serializer};

use crate::contracts::ResponseEnvelope;
use crate::ids::{CorrelationId, CORRELATION_ID_HEADER};

/// Body of a service response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseContent<T> {
    /// No body; serializes to `null`
    Empty,
    /// Success payload
    Payload(T),
    /// Failure envelope
    Envelope(ResponseEnvelope),
}

impl<T> ResponseContent<T> {
    /// Whether there is no body
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The success payload, if any
    #[must_use]
    pub const fn payload(&self) -> Option<&T> {
        match self {
            Self::Payload(payload) => Some(payload),
            _ => None,
        }
    }

    /// The failure envelope, if any
    #[must_use]
    pub const fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }
}

impl<T: Serialize> ResponseContent<T> {
    /// Size in bytes of the JSON encoding of this content
    ///
    /// `Empty` encodes as `null`, so it measures 4 bytes.
    ///
    /// # Errors
    ///
    /// Fails if the payload cannot be serialized.
    pub fn serialized_size(&self) -> Result<usize, serde_json::Error> {
        Ok(serde_json::to_vec(self)?.len())
    }
}

impl<T> From<ResponseEnvelope> for ResponseContent<T> {
    fn from(envelope: ResponseEnvelope) -> Self {
        Self::Envelope(envelope)
    }
}

impl<T: Serialize> Serialize for ResponseContent<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_unit(),
            Self::Payload(payload) => payload.serialize(serializer),
            Self::Envelope(envelope) => envelope.serialize(serializer),
        }
    }
}

/// Outcome of one request, ready for the transport
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse<T> {
    /// Correlation id of the request
    pub correlation_id: CorrelationId,
    /// HTTP status
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    /// Response body
    pub content: ResponseContent<T>,
    #[serde(skip)]
    correlation_header: Option<Arc<str>>,
}

impl<T> ServiceResponse<T> {
    /// Assemble a response
    pub fn new(correlation_id: CorrelationId, status: StatusCode, content: ResponseContent<T>) -> Self {
        Self {
            correlation_id,
            status,
            content,
            correlation_header: None,
        }
    }

    /// Send the correlation id under a header other than `x-correlation-id`
    #[must_use]
    pub fn with_correlation_header(mut self, header: impl Into<Arc<str>>) -> Self {
        self.correlation_header = Some(header.into());
        self
    }

    /// Header the correlation id is sent under
    #[must_use]
    pub fn correlation_header(&self) -> &str {
        self.correlation_header
            .as_deref()
            .unwrap_or(CORRELATION_ID_HEADER)
    }

    /// Split into correlation id, status and content
    pub fn into_parts(self) -> (CorrelationId, StatusCode, ResponseContent<T>) {
        (self.correlation_id, self.status, self.content)
    }
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

#[cfg(feature = "axum")]
mod into_response {
    use axum::{
        http::{HeaderName, HeaderValue},
        response::{IntoResponse, Response},
        Json,
    };
    use serde::Serialize;

    use super::{ResponseContent, ServiceResponse};

    impl<T: Serialize> IntoResponse for ServiceResponse<T> {
        fn into_response(self) -> Response {
            let mut response = match &self.content {
                ResponseContent::Empty => self.status.into_response(),
                content => (self.status, Json(content)).into_response(),
            };

            let header_name = HeaderName::from_bytes(self.correlation_header().as_bytes());
            let header_value = HeaderValue::from_str(self.correlation_id.as_str());
            match (header_name, header_value) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(
                    correlation_id = %self.correlation_id,
                    header = self.correlation_header(),
                    "Correlation id not representable as a response header"
                ),
            }

            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::ApiError;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Order {
        id: u64,
    }

    fn correlation_id() -> CorrelationId {
        CorrelationId::new("corr-1").unwrap()
    }

    #[test]
    fn test_empty_content_is_null() {
        let content: ResponseContent<Order> = ResponseContent::Empty;
        assert_eq!(serde_json::to_string(&content).unwrap(), "null");
        assert_eq!(content.serialized_size().unwrap(), 4);
    }

    #[test]
    fn test_payload_serializes_inline() {
        let content = ResponseContent::Payload(Order { id: 7 });
        assert_eq!(serde_json::to_value(&content).unwrap(), json!({"id": 7}));
        assert_eq!(content.payload(), Some(&Order { id: 7 }));
        assert!(content.envelope().is_none());
    }

    #[test]
    fn test_envelope_content() {
        let content: ResponseContent<Order> = ResponseEnvelope::internal_error().into();
        assert!(content.envelope().is_some());
        assert_eq!(
            serde_json::to_value(&content).unwrap()["errors"][0]["code"],
            "InternalError"
        );
    }

    #[test]
    fn test_service_response_shape() {
        let response = ServiceResponse::new(
            correlation_id(),
            StatusCode::BAD_REQUEST,
            ResponseContent::<Order>::Envelope(ResponseEnvelope::bad_request(vec![
                ApiError::validation("IdRequired", "An id is required."),
            ])),
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["correlationId"], "corr-1");
        assert_eq!(value["status"], 400);
        assert_eq!(value["content"]["errors"][0]["type"], "Validation");
    }

    #[test]
    fn test_correlation_header_defaults() {
        let response = ServiceResponse::new(correlation_id(), StatusCode::OK, ResponseContent::<Order>::Empty);
        assert_eq!(response.correlation_header(), "x-correlation-id");
        let response = response.with_correlation_header("x-request-id");
        assert_eq!(response.correlation_header(), "x-request-id");
        assert!(!serde_json::to_string(&response).unwrap().contains("x-request-id"));
    }

    #[test]
    fn test_into_parts() {
        let response = ServiceResponse::new(
            correlation_id(),
            StatusCode::OK,
            ResponseContent::Payload(Order { id: 1 }),
        );
        let (id, status, content) = response.into_parts();
        assert_eq!(id, correlation_id());
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content, ResponseContent::Payload(Order { id: 1 }));
    }

    #[cfg(feature = "axum")]
    mod axum_adapter {
        use super::*;
        use axum::http::header::CONTENT_TYPE;
        use axum::response::IntoResponse;

        #[test]
        fn test_payload_response() {
            let response = ServiceResponse::new(
                correlation_id(),
                StatusCode::CREATED,
                ResponseContent::Payload(Order { id: 3 }),
            )
            .into_response();
            assert_eq!(response.status(), StatusCode::CREATED);
            assert_eq!(response.headers()["x-correlation-id"], "corr-1");
            assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        }

        #[test]
        fn test_empty_response_has_no_json_body() {
            let response =
                ServiceResponse::<Order>::new(correlation_id(), StatusCode::NO_CONTENT, ResponseContent::Empty)
                    .into_response();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
            assert!(response.headers().get(CONTENT_TYPE).is_none());
            assert_eq!(response.headers()["x-correlation-id"], "corr-1");
        }

        #[test]
        fn test_custom_correlation_header() {
            let response = ServiceResponse::new(
                correlation_id(),
                StatusCode::OK,
                ResponseContent::Payload(Order { id: 5 }),
            )
            .with_correlation_header("X-Request-Id")
            .into_response();
            assert_eq!(response.headers()["x-request-id"], "corr-1");
            assert!(response.headers().get("x-correlation-id").is_none());
        }

        #[test]
        fn test_envelope_response() {
            let response = ServiceResponse::<Order>::new(
                correlation_id(),
                StatusCode::FORBIDDEN,
                ResponseEnvelope::forbidden(vec![ApiError::authn("NoSession", "Please sign in.")]).into(),
            )
            .into_response();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        }
    }
}
