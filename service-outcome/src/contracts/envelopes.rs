//! Failure envelopes
//!
//! An envelope groups the errors that explain a failed request under a named
//! outcome. On the wire every envelope is `{"errors": [...]}`; the outcome is
//! conveyed by the HTTP status.

use http::StatusCode;
use serde::{Serialize, Serializer};

use super::errors::ApiError;

/// The four failure outcomes that carry a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 500
    InternalError,
}

impl EnvelopeKind {
    /// HTTP status for the outcome
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Response body for a failure outcome
///
/// Envelopes do not validate their contents. An empty `errors` list is
/// representable, but clients assume at least one error, so callers should
/// always supply one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    kind: EnvelopeKind,
    errors: Vec<ApiError>,
}

impl ResponseEnvelope {
    /// 400 envelope holding validation errors
    #[must_use]
    pub fn bad_request(errors: Vec<ApiError>) -> Self {
        Self {
            kind: EnvelopeKind::BadRequest,
            errors,
        }
    }

    /// 401 envelope holding authorization errors
    #[must_use]
    pub fn unauthorized(errors: Vec<ApiError>) -> Self {
        Self {
            kind: EnvelopeKind::Unauthorized,
            errors,
        }
    }

    /// 403 envelope holding authentication errors
    #[must_use]
    pub fn forbidden(errors: Vec<ApiError>) -> Self {
        Self {
            kind: EnvelopeKind::Forbidden,
            errors,
        }
    }

    /// 500 envelope holding exactly one generic exception error
    #[must_use]
    pub fn internal_error() -> Self {
        Self {
            kind: EnvelopeKind::InternalError,
            errors: vec![ApiError::exception()],
        }
    }

    /// Which outcome this envelope describes
    #[must_use]
    pub const fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    /// The errors describing the failure
    #[must_use]
    pub fn errors(&self) -> &[ApiError] {
        &self.errors
    }

    /// Number of errors in the envelope
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// HTTP status for this envelope
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    /// Consume the envelope, returning its errors
    #[must_use]
    pub fn into_errors(self) -> Vec<ApiError> {
        self.errors
    }
}

#[derive(Serialize)]
struct EnvelopeBody<'a> {
    errors: &'a [ApiError],
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EnvelopeBody {
            errors: &self.errors,
        }
        .serialize(serializer)
    }
}
