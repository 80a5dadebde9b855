use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use evently_core::CodecError;

/// Schema revision of an event context.
///
/// Closed set: adding a revision is a compile-time change in every table and
/// conversion that matches on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecVersion {
    V01,
    V02,
    V03,
}

impl SpecVersion {
    pub const ALL: [SpecVersion; 3] = [SpecVersion::V01, SpecVersion::V02, SpecVersion::V03];

    /// Wire literal (`"0.1"`, `"0.2"`, `"0.3"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecVersion::V01 => "0.1",
            SpecVersion::V02 => "0.2",
            SpecVersion::V03 => "0.3",
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0.1" => Ok(SpecVersion::V01),
            "0.2" => Ok(SpecVersion::V02),
            "0.3" => Ok(SpecVersion::V03),
            other => Err(CodecError::unknown_spec_version(other)),
        }
    }
}

impl Serialize for SpecVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
