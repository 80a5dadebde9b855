//! Codec error model.

use thiserror::Error;

/// Result type used across the codec layers.
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec-level error.
///
/// Every variant is reported synchronously to the immediate caller; nothing in
/// the codec retries or recovers in the background.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A required attribute was missing or empty, or an attribute value could
    /// not be parsed (e.g. a timestamp).
    #[error("malformed attribute: {0}")]
    MalformedAttribute(String),

    /// A spec version marker was present but not recognized.
    #[error("unknown spec version: {0:?}")]
    UnknownSpecVersion(String),

    /// A structured body was not a single well-formed JSON object.
    #[error("malformed body: {0}")]
    MalformedBody(String),

    /// The payload cannot be carried by the requested encoding.
    #[error("encoding mismatch: {0}")]
    EncodingMismatch(String),

    /// The carrier failed to deliver a message or answered with a failure status.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The receiving handler rejected the event.
    #[error("handler failure: {0}")]
    Handler(String),
}

impl CodecError {
    pub fn malformed_attribute(msg: impl Into<String>) -> Self {
        Self::MalformedAttribute(msg.into())
    }

    pub fn unknown_spec_version(version: impl Into<String>) -> Self {
        Self::UnknownSpecVersion(version.into())
    }

    pub fn malformed_body(msg: impl Into<String>) -> Self {
        Self::MalformedBody(msg.into())
    }

    pub fn encoding_mismatch(msg: impl Into<String>) -> Self {
        Self::EncodingMismatch(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    /// Stable machine-readable code, used in error response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedAttribute(_) => "malformed_attribute",
            Self::UnknownSpecVersion(_) => "unknown_spec_version",
            Self::MalformedBody(_) => "malformed_body",
            Self::EncodingMismatch(_) => "encoding_mismatch",
            Self::Transport(_) => "transport_failure",
            Self::Handler(_) => "handler_failure",
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedBody(err.to_string())
    }
}
