//! Environment-driven configuration.
//!
//! Read once at startup. Unset variables take defaults; invalid values are
//! logged and also fall back to defaults.

use http::Method;

use evently_events::SpecVersion;

use crate::binding::Encoding;

pub const ENCODING_VAR: &str = "EVENTLY_ENCODING";
pub const TARGET_VAR: &str = "EVENTLY_TARGET";
pub const METHOD_VAR: &str = "EVENTLY_METHOD";
pub const RECEIVER_VERSION_VAR: &str = "EVENTLY_RECEIVER_VERSION";

/// Sender configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Wire encoding for outgoing events.
    pub encoding: Encoding,
    /// Request target path.
    pub target: String,
    pub method: Method,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Binary,
            target: "/".to_string(),
            method: Method::POST,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let encoding = match lookup(ENCODING_VAR) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(
                    var = ENCODING_VAR,
                    value = %raw,
                    error = %e,
                    "invalid encoding; using binary"
                );
                defaults.encoding
            }),
            None => defaults.encoding,
        };

        let target = match lookup(TARGET_VAR) {
            Some(raw) if raw.starts_with('/') => raw,
            Some(raw) => {
                tracing::warn!(
                    var = TARGET_VAR,
                    value = %raw,
                    "target must start with '/'; using /"
                );
                defaults.target
            }
            None => defaults.target,
        };

        let method = match lookup(METHOD_VAR) {
            Some(raw) => {
                let upper = raw.trim().to_ascii_uppercase();
                Method::from_bytes(upper.as_bytes()).unwrap_or_else(|e| {
                    tracing::warn!(
                        var = METHOD_VAR,
                        value = %raw,
                        error = %e,
                        "invalid method; using POST"
                    );
                    defaults.method.clone()
                })
            }
            None => defaults.method,
        };

        Self {
            encoding,
            target,
            method,
        }
    }
}

/// Receiver configuration.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Version inbound events are converted to before handling; `None` keeps
    /// the sender's version.
    pub version: Option<SpecVersion>,
}

impl ReceiverConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let version = lookup(RECEIVER_VERSION_VAR).and_then(|raw| match raw.parse() {
            Ok(version) => Some(version),
            Err(e) => {
                tracing::warn!(
                    var = RECEIVER_VERSION_VAR,
                    value = %raw,
                    error = %e,
                    "invalid version; keeping sender's version"
                );
                None
            }
        });
        Self { version }
    }
}
