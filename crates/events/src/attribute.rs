//! Per-version attribute name tables.
//!
//! Two fixed, bidirectional tables per spec version:
//!
//! - **header names** used by the binary HTTP encoding (lower-case, `ce-` prefixed,
//!   except the content type which rides on the native `content-type` header)
//! - **JSON keys** used by the structured encoding
//!
//! Lookups are exhaustive matches keyed by `(SpecVersion, Attribute)`. A name
//! missing from a table is an extension attribute, never an error.

use crate::SpecVersion;

/// Native transport header carrying the payload's content type.
pub const CONTENT_TYPE_HEADER: &str = "content-type";

/// Prefix of every event attribute header in binary mode.
pub const HEADER_PREFIX: &str = "ce-";

/// Semantic (version-independent) attribute names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Id,
    Type,
    Source,
    Time,
    SpecVersion,
    ContentType,
    SchemaUrl,
    Subject,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::Id,
        Attribute::Type,
        Attribute::Source,
        Attribute::Time,
        Attribute::SpecVersion,
        Attribute::ContentType,
        Attribute::SchemaUrl,
        Attribute::Subject,
    ];

    /// Attributes that must be present and non-empty in every context.
    pub const REQUIRED: [Attribute; 4] = [
        Attribute::Id,
        Attribute::Type,
        Attribute::Source,
        Attribute::SpecVersion,
    ];

    /// Semantic name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Id => "id",
            Attribute::Type => "type",
            Attribute::Source => "source",
            Attribute::Time => "time",
            Attribute::SpecVersion => "spec_version",
            Attribute::ContentType => "content_type",
            Attribute::SchemaUrl => "schema_url",
            Attribute::Subject => "subject",
        }
    }

    /// Whether `version`'s schema defines this attribute.
    pub fn is_defined_in(&self, version: SpecVersion) -> bool {
        !matches!((self, version), (Attribute::Subject, SpecVersion::V01 | SpecVersion::V02))
    }

    /// Binary-mode header name for this attribute under `version`.
    pub fn header_name(&self, version: SpecVersion) -> Option<&'static str> {
        let name = match (version, self) {
            (SpecVersion::V01, Attribute::Id) => "ce-eventid",
            (SpecVersion::V01, Attribute::Type) => "ce-eventtype",
            (SpecVersion::V01, Attribute::Time) => "ce-eventtime",
            (SpecVersion::V01, Attribute::SpecVersion) => "ce-cloudeventsversion",
            (SpecVersion::V01, Attribute::Subject) => return None,

            (SpecVersion::V02 | SpecVersion::V03, Attribute::Id) => "ce-id",
            (SpecVersion::V02 | SpecVersion::V03, Attribute::Type) => "ce-type",
            (SpecVersion::V02 | SpecVersion::V03, Attribute::Time) => "ce-time",
            (SpecVersion::V02 | SpecVersion::V03, Attribute::SpecVersion) => "ce-specversion",
            (SpecVersion::V02, Attribute::Subject) => return None,
            (SpecVersion::V03, Attribute::Subject) => "ce-subject",

            (_, Attribute::Source) => "ce-source",
            (_, Attribute::SchemaUrl) => "ce-schemaurl",
            (_, Attribute::ContentType) => CONTENT_TYPE_HEADER,
        };
        Some(name)
    }

    /// Structured-mode JSON key for this attribute under `version`.
    pub fn json_key(&self, version: SpecVersion) -> Option<&'static str> {
        let key = match (version, self) {
            (SpecVersion::V01 | SpecVersion::V02, Attribute::ContentType) => "contenttype",
            (SpecVersion::V03, Attribute::ContentType) => "datacontenttype",
            (SpecVersion::V01 | SpecVersion::V02, Attribute::Subject) => return None,
            (SpecVersion::V03, Attribute::Subject) => "subject",

            (_, Attribute::Id) => "id",
            (_, Attribute::Type) => "type",
            (_, Attribute::Source) => "source",
            (_, Attribute::Time) => "time",
            (_, Attribute::SpecVersion) => "specversion",
            (_, Attribute::SchemaUrl) => "schemaurl",
        };
        Some(key)
    }

    /// Inverse of [`Attribute::header_name`]; `name` must already be lower-case.
    pub fn from_header_name(version: SpecVersion, name: &str) -> Option<Attribute> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.header_name(version) == Some(name))
    }

    /// Inverse of [`Attribute::json_key`].
    pub fn from_json_key(version: SpecVersion, key: &str) -> Option<Attribute> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.json_key(version) == Some(key))
    }
}

/// Header name for an extension attribute (`ce-<name>`).
///
/// Header names are case-insensitive, so only lower-case extension names
/// survive the trip unchanged.
pub fn extension_header_name(name: &str) -> String {
    format!("{HEADER_PREFIX}{name}")
}

/// Extension name carried by a `ce-` header, if `header` is one.
pub fn extension_from_header_name(header: &str) -> Option<&str> {
    header
        .strip_prefix(HEADER_PREFIX)
        .filter(|name| !name.is_empty())
}
