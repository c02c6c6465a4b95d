//! The fixed table of terminal outcomes
//!
//! Each outcome maps to exactly one HTTP status, one counter and one log
//! severity. The mappings are exhaustive matches so adding an outcome forces
//! every table to be extended.

use std::fmt;

use http::StatusCode;
use tracing::Level;

use crate::metrics::ServiceMetricName;

/// Terminal result of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// 200
    Ok,
    /// 201
    Created,
    /// 204
    NoContent,
    /// 404
    NotFound,
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 500
    InternalServerException,
}

impl Outcome {
    /// Every outcome
    pub const ALL: [Self; 8] = [
        Self::Ok,
        Self::Created,
        Self::NoContent,
        Self::NotFound,
        Self::BadRequest,
        Self::Unauthorized,
        Self::Forbidden,
        Self::InternalServerException,
    ];

    /// HTTP status for the outcome
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Ok => StatusCode::OK,
            Self::Created => StatusCode::CREATED,
            Self::NoContent => StatusCode::NO_CONTENT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InternalServerException => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Counter incremented when the outcome is returned
    #[must_use]
    pub const fn metric(&self) -> ServiceMetricName {
        match self {
            Self::Ok => ServiceMetricName::OkResponses,
            Self::Created => ServiceMetricName::CreatedResponses,
            Self::NoContent => ServiceMetricName::NoContentResponses,
            Self::NotFound => ServiceMetricName::NotFoundResponses,
            Self::BadRequest => ServiceMetricName::BadRequestResponses,
            Self::Unauthorized => ServiceMetricName::UnauthorizedResponses,
            Self::Forbidden => ServiceMetricName::ForbiddenResponses,
            Self::InternalServerException => ServiceMetricName::InternalServerExceptionResponses,
        }
    }

    /// Severity of the "response returned" log event
    #[must_use]
    pub const fn log_level(&self) -> Level {
        match self {
            Self::InternalServerException => Level::ERROR,
            Self::NotFound => Level::TRACE,
            Self::Ok
            | Self::Created
            | Self::NoContent
            | Self::BadRequest
            | Self::Unauthorized
            | Self::Forbidden => Level::DEBUG,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::Created => "created",
            Self::NoContent => "no_content",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::InternalServerException => "internal_server_exception",
        };
        f.write_str(name)
    }
}
