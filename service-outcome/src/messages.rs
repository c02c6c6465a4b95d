//! Log message templates
//!
//! Every message that mentions a request starts with `{correlation_id}:` so
//! plain-text log search works even without structured fields.

use std::fmt::Display;

use crate::outcome::Outcome;

pub(crate) fn correlation_set(correlation_id: impl Display) -> String {
    format!("{correlation_id}:Correlation Id set.")
}

pub(crate) fn request_start(correlation_id: impl Display, timestamp: impl Display) -> String {
    format!("{correlation_id}:Request start: {timestamp}.")
}

pub(crate) fn request_received(correlation_id: impl Display) -> String {
    format!("{correlation_id}:Request received.")
}

pub(crate) fn resource_retrieved() -> &'static str {
    "Resource retrieved."
}

/// "Response returned" line for an outcome; `error_count` is only used by
/// outcomes that carry client-supplied errors.
pub(crate) fn response_returned(
    outcome: Outcome,
    correlation_id: impl Display,
    error_count: usize,
) -> String {
    match outcome {
        Outcome::Ok => format!("{correlation_id}:Ok response returned."),
        Outcome::Created => format!("{correlation_id}:Created response returned."),
        Outcome::NoContent => format!("{correlation_id}:No Content response returned."),
        Outcome::NotFound => format!("{correlation_id}:Not found response returned."),
        Outcome::BadRequest => format!(
            "{correlation_id}:Bad response returned with {error_count} validation errors."
        ),
        Outcome::Unauthorized => {
            format!("{correlation_id}:Unauthorized response returned with {error_count} errors.")
        }
        Outcome::Forbidden => {
            format!("{correlation_id}:Forbidden response returned with {error_count} errors.")
        }
        Outcome::InternalServerException => {
            format!("{correlation_id}:Internal server exception response returned.")
        }
    }
}

pub(crate) fn service_response_returned(correlation_id: impl Display) -> String {
    format!("{correlation_id}:Service response returned:")
}

pub(crate) fn request_end(correlation_id: impl Display, timestamp: impl Display) -> String {
    format!("{correlation_id}:Request end: {timestamp}")
}

pub(crate) fn request_duration(correlation_id: impl Display, milliseconds: u64) -> String {
    format!("{correlation_id}:Request duration: {milliseconds} ms")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_message() {
        assert_eq!(
            response_returned(Outcome::Forbidden, "abc", 2),
            "abc:Forbidden response returned with 2 errors."
        );
    }

    #[test]
    fn test_bad_request_message() {
        assert_eq!(
            response_returned(Outcome::BadRequest, "abc", 1),
            "abc:Bad response returned with 1 validation errors."
        );
    }

    #[test]
    fn test_count_free_messages() {
        assert_eq!(response_returned(Outcome::Ok, "abc", 0), "abc:Ok response returned.");
        assert_eq!(
            response_returned(Outcome::NoContent, "abc", 0),
            "abc:No Content response returned."
        );
        assert_eq!(
            response_returned(Outcome::InternalServerException, "abc", 1),
            "abc:Internal server exception response returned."
        );
    }

    #[test]
    fn test_lifecycle_messages() {
        assert_eq!(correlation_set("abc"), "abc:Correlation Id set.");
        assert_eq!(request_start("abc", 5), "abc:Request start: 5.");
        assert_eq!(request_received("abc"), "abc:Request received.");
        assert_eq!(service_response_returned("abc"), "abc:Service response returned:");
        assert_eq!(request_end("abc", 9), "abc:Request end: 9");
        assert_eq!(request_duration("abc", 12), "abc:Request duration: 12 ms");
        assert_eq!(resource_retrieved(), "Resource retrieved.");
    }
}
