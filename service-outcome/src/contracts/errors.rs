//! Error contracts carried inside failure envelopes
//!
//! Every error a service reports belongs to one of four [`ErrorType`]s. The
//! type is fixed by the variant used to build the error, so a client can
//! branch on `type` without interpreting `code` strings.
//!
//! ```rust
//! use service_outcome::contracts::{ApiError, ErrorType};
//!
//! let error = ApiError::validation("EmailRequired", "An email address is required.");
//! assert_eq!(error.error_type(), ErrorType::Validation);
//!
//! // Unexpected exceptions never carry caller text.
//! let error = ApiError::exception();
//! assert_eq!(error.code(), "InternalError");
//! ```

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Code reported for every unexpected exception
pub const INTERNAL_ERROR_CODE: &str = "InternalError";

/// Message reported for every unexpected exception
pub const INTERNAL_ERROR_MESSAGE: &str = "We encountered an internal error. Please try again.";

/// Closed set of failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// The request was malformed or failed validation
    Validation,
    /// The caller's identity could not be established for this resource
    AuthN,
    /// The caller is not permitted to perform the operation
    AuthZ,
    /// Something unexpected went wrong inside the service
    Exception,
}

impl ErrorType {
    /// Wire name of the type
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "Validation",
            Self::AuthN => "AuthN",
            Self::AuthZ => "AuthZ",
            Self::Exception => "Exception",
        }
    }

    /// HTTP status used when an envelope of this error type is returned
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::AuthZ => StatusCode::UNAUTHORIZED,
            Self::AuthN => StatusCode::FORBIDDEN,
            Self::Exception => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured error
///
/// `code` should be a short PascalCase identifier, unique per failure reason
/// within a service. `message` must be safe to show to end users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request validation failure
    Validation {
        /// Stable failure identifier
        code: String,
        /// User-facing description
        message: String,
    },
    /// Authentication failure
    AuthN {
        /// Stable failure identifier
        code: String,
        /// User-facing description
        message: String,
    },
    /// Authorization failure
    AuthZ {
        /// Stable failure identifier
        code: String,
        /// User-facing description
        message: String,
    },
    /// Unexpected internal failure with fixed, detail-free text
    Exception,
}

impl ApiError {
    /// Create a validation error
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authn(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthN {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an authorization error
    pub fn authz(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthZ {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create the generic internal error
    ///
    /// Takes no input so that exception details cannot reach a response body.
    #[must_use]
    pub const fn exception() -> Self {
        Self::Exception
    }

    /// The failure code
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Validation { code, .. } | Self::AuthN { code, .. } | Self::AuthZ { code, .. } => {
                code
            }
            Self::Exception => INTERNAL_ERROR_CODE,
        }
    }

    /// The user-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message, .. }
            | Self::AuthN { message, .. }
            | Self::AuthZ { message, .. } => message,
            Self::Exception => INTERNAL_ERROR_MESSAGE,
        }
    }

    /// The error category, fixed by the variant
    #[must_use]
    pub const fn error_type(&self) -> ErrorType {
        match self {
            Self::Validation { .. } => ErrorType::Validation,
            Self::AuthN { .. } => ErrorType::AuthN,
            Self::AuthZ { .. } => ErrorType::AuthZ,
            Self::Exception => ErrorType::Exception,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error {}: {}", self.error_type(), self.code(), self.message())
    }
}

/// Wire shape shared by every variant
#[derive(Serialize)]
struct ApiErrorRef<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(rename = "type")]
    error_type: ErrorType,
}

#[derive(Deserialize)]
struct ApiErrorOwned {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(rename = "type")]
    error_type: ErrorType,
}

impl Serialize for ApiError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ApiErrorRef {
            code: self.code(),
            message: self.message(),
            error_type: self.error_type(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ApiError {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = ApiErrorOwned::deserialize(deserializer)?;
        Ok(match raw.error_type {
            ErrorType::Validation => Self::validation(raw.code, raw.message),
            ErrorType::AuthN => Self::authn(raw.code, raw.message),
            ErrorType::AuthZ => Self::authz(raw.code, raw.message),
            ErrorType::Exception => Self::Exception,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_fixed_by_constructor() {
        assert_eq!(
            ApiError::validation("NameRequired", "Name is required.").error_type(),
            ErrorType::Validation
        );
        assert_eq!(
            ApiError::authn("Exception", "looks like an exception").error_type(),
            ErrorType::AuthN
        );
        assert_eq!(ApiError::authz("Denied", "Denied.").error_type(), ErrorType::AuthZ);
        assert_eq!(ApiError::exception().error_type(), ErrorType::Exception);
    }

    #[test]
    fn test_exception_has_fixed_text() {
        let error = ApiError::exception();
        assert_eq!(error.code(), "InternalError");
        assert_eq!(
            error.message(),
            "We encountered an internal error. Please try again."
        );
    }

    #[test]
    fn test_serialized_shape() {
        let error = ApiError::authz("NotOwner", "You do not own this order.");
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(
            value,
            json!({"code": "NotOwner", "message": "You do not own this order.", "type": "AuthZ"})
        );
    }

    #[test]
    fn test_deserialized_exception_drops_caller_text() {
        let value = json!({"code": "Leaked", "message": "stack trace here", "type": "Exception"});
        let error: ApiError = serde_json::from_value(value).unwrap();
        assert_eq!(error, ApiError::Exception);
        assert_eq!(error.code(), INTERNAL_ERROR_CODE);
    }

    #[test]
    fn test_deserialize_validation() {
        let value = json!({"code": "TooLong", "message": "Too long.", "type": "Validation"});
        let error: ApiError = serde_json::from_value(value).unwrap();
        assert_eq!(error, ApiError::validation("TooLong", "Too long."));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let value = json!({"code": "X", "message": "Y", "type": "Teapot"});
        assert!(serde_json::from_value::<ApiError>(value).is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorType::Validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorType::AuthZ.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorType::AuthN.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorType::Exception.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display() {
        let error = ApiError::validation("NameRequired", "Name is required.");
        assert_eq!(
            error.to_string(),
            "Validation error NameRequired: Name is required."
        );
    }
}
