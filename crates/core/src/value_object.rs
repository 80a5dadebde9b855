//! Value objects shared by every spec version: timestamps and URI references.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! values and are immutable once constructed.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodecError;

/// A point in time, always normalized to UTC with nanosecond precision.
///
/// The wire form is RFC 3339 with a `Z` suffix and a nanosecond fraction whose
/// trailing zeros are trimmed (`2021-01-01T00:00:00.123456789Z`,
/// `2021-01-01T00:00:00.5Z`, `2021-01-01T00:00:00Z`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self(time)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn into_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Parse an RFC 3339 timestamp in any offset; the result is normalized to UTC.
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        DateTime::parse_from_rfc3339(s.trim())
            .map(|t| Self(t.with_timezone(&Utc)))
            .map_err(|e| CodecError::malformed_attribute(format!("time {s:?}: {e}")))
    }

    /// Format as RFC 3339, UTC, with trailing fractional zeros trimmed.
    pub fn to_rfc3339_nano(&self) -> String {
        let seconds = self.0.format("%Y-%m-%dT%H:%M:%S");
        // Leap seconds are represented by chrono as nanos >= 1e9.
        let nanos = self.0.nanosecond() % 1_000_000_000;
        if nanos == 0 {
            return format!("{seconds}Z");
        }
        let fraction = format!("{nanos:09}");
        format!("{seconds}.{}Z", fraction.trim_end_matches('0'))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339_nano())
    }
}

impl FromStr for Timestamp {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339_nano())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A URI reference (absolute URI or relative reference such as `/unit/test`).
///
/// Only the shape needed for lossless transport is checked: non-empty and no
/// whitespace or control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UriRef(String);

impl UriRef {
    pub fn parse(s: impl Into<String>) -> Result<Self, CodecError> {
        let s = s.into();
        if s.is_empty() {
            return Err(CodecError::malformed_attribute("URI reference must not be empty"));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CodecError::malformed_attribute(format!(
                "URI reference {s:?} contains whitespace or control characters"
            )));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UriRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UriRef {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for UriRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(s).map_err(serde::de::Error::custom)
    }
}
