//! Response and error contracts
//!
//! - [`ApiError`] / [`ErrorType`]: a single structured error and its category
//! - [`ResponseEnvelope`]: the body returned for 400, 401, 403 and 500 outcomes

mod envelopes;
mod errors;

pub use envelopes::{EnvelopeKind, ResponseEnvelope};
pub use errors::{ApiError, ErrorType, INTERNAL_ERROR_CODE, INTERNAL_ERROR_MESSAGE};
