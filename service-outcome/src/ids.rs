//! Correlation identifiers
//!
//! A correlation id ties together every log line, metric and response
//! produced for one logical request. Callers usually forward the id they
//! received from upstream; when none arrives, the orchestrator asks an
//! [`IdGenerator`] for a fresh one.
//!
//! # Generated formats
//!
//! - [`TypedIdGenerator`] (default) produces TypeIDs such as
//!   `corr_01h455vb4pex5vsknk084sn02q`, built on UUIDv7 so they sort by time.
//! - [`UuidGenerator`] produces random hyphenated UUIDv4 strings.
//!
//! ```rust
//! use service_outcome::ids::{CorrelationId, IdGenerator, TypedIdGenerator};
//!
//! let id = TypedIdGenerator::default().generate();
//! assert!(id.as_str().starts_with("corr_"));
//!
//! let forwarded = CorrelationId::new("upstream-42").unwrap();
//! assert_eq!(forwarded.as_str(), "upstream-42");
//! ```

use std::fmt;

use http::HeaderMap;
use mti::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header conventionally used to carry correlation ids between services
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Opaque, non-empty identifier for one logical request
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wrap an existing identifier, keeping it byte for byte
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationIdError::Blank`] if the value is empty or only
    /// whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, CorrelationIdError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(CorrelationIdError::Blank);
        }
        Ok(Self(value))
    }

    /// Read a correlation id from request headers
    ///
    /// Returns `None` when the header is missing, not visible ASCII, or blank.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, header_name: &str) -> Option<Self> {
        headers
            .get(header_name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Self::new(value).ok())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CorrelationId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for CorrelationId {
    type Error = CorrelationIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CorrelationId> for String {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}

/// Error type for correlation id construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrelationIdError {
    /// The supplied id was empty or whitespace.
    #[error("correlation id must not be blank")]
    Blank,
}

/// Source of fresh correlation ids
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Produce a globally unique id
    fn generate(&self) -> CorrelationId;
}

/// Generates TypeID correlation ids with a UUIDv7 suffix
#[derive(Debug, Clone, Copy)]
pub struct TypedIdGenerator {
    prefix: &'static str,
}

impl TypedIdGenerator {
    /// The prefix used when none is configured
    pub const DEFAULT_PREFIX: &'static str = "corr";

    /// Use a custom TypeID prefix (lowercase ASCII letters and underscores)
    #[must_use]
    pub const fn with_prefix(prefix: &'static str) -> Self {
        Self { prefix }
    }
}

impl Default for TypedIdGenerator {
    fn default() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }
}

impl IdGenerator for TypedIdGenerator {
    fn generate(&self) -> CorrelationId {
        CorrelationId(self.prefix.create_type_id::<V7>().to_string())
    }
}

/// Generates random hyphenated UUIDv4 correlation ids
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> CorrelationId {
        CorrelationId(Uuid::new_v4().to_string())
    }
}
