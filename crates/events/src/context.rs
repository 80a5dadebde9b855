//! Versioned event contexts and the conversions between them.
//!
//! Each schema revision gets its own struct with its own field names; the
//! [`EventContext`] sum type tags which one an event carries. Conversion is a
//! renaming only: values are never transformed, and only attributes the target
//! schema does not define are dropped.

use std::collections::BTreeMap;

use evently_core::{CodecError, CodecResult, Timestamp, UriRef};

use crate::{Attribute, SpecVersion};

/// Extension attributes: producer-defined name → scalar value.
pub type Extensions = BTreeMap<String, serde_json::Value>;

/// Content type assumed for a payload when the producer did not declare one.
pub const APPLICATION_JSON: &str = "application/json";

/// Context for spec version 0.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContextV01 {
    pub event_id: String,
    pub event_type: String,
    pub source: UriRef,
    pub event_time: Option<Timestamp>,
    pub schema_url: Option<UriRef>,
    pub content_type: Option<String>,
    pub extensions: Extensions,
}

impl EventContextV01 {
    pub fn new(event_id: impl Into<String>, event_type: impl Into<String>, source: UriRef) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            source,
            event_time: None,
            schema_url: None,
            content_type: None,
            extensions: Extensions::new(),
        }
    }
}

/// Context for spec version 0.2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContextV02 {
    pub id: String,
    pub event_type: String,
    pub source: UriRef,
    pub time: Option<Timestamp>,
    pub schema_url: Option<UriRef>,
    pub content_type: Option<String>,
    pub extensions: Extensions,
}

impl EventContextV02 {
    pub fn new(id: impl Into<String>, event_type: impl Into<String>, source: UriRef) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            source,
            time: None,
            schema_url: None,
            content_type: None,
            extensions: Extensions::new(),
        }
    }
}

/// Context for spec version 0.3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContextV03 {
    pub id: String,
    pub event_type: String,
    pub source: UriRef,
    pub time: Option<Timestamp>,
    pub schema_url: Option<UriRef>,
    pub data_content_type: Option<String>,
    /// Subject of the event in the context of the source (0.3 only).
    pub subject: Option<String>,
    pub extensions: Extensions,
}

impl EventContextV03 {
    pub fn new(id: impl Into<String>, event_type: impl Into<String>, source: UriRef) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            source,
            time: None,
            schema_url: None,
            data_content_type: None,
            subject: None,
            extensions: Extensions::new(),
        }
    }
}

/// A context of exactly one spec version.
///
/// The variant *is* the spec version: a `V02` context always reports `"0.2"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventContext {
    V01(EventContextV01),
    V02(EventContextV02),
    V03(EventContextV03),
}

impl From<EventContextV01> for EventContext {
    fn from(value: EventContextV01) -> Self {
        EventContext::V01(value)
    }
}

impl From<EventContextV02> for EventContext {
    fn from(value: EventContextV02) -> Self {
        EventContext::V02(value)
    }
}

impl From<EventContextV03> for EventContext {
    fn from(value: EventContextV03) -> Self {
        EventContext::V03(value)
    }
}

/// Superset of every version's attributes; the pivot for conversions.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attributes {
    id: String,
    event_type: String,
    source: UriRef,
    time: Option<Timestamp>,
    schema_url: Option<UriRef>,
    content_type: Option<String>,
    subject: Option<String>,
    extensions: Extensions,
}

impl Attributes {
    fn into_context(self, version: SpecVersion) -> EventContext {
        match version {
            SpecVersion::V01 => EventContext::V01(EventContextV01 {
                event_id: self.id,
                event_type: self.event_type,
                source: self.source,
                event_time: self.time,
                schema_url: self.schema_url,
                content_type: self.content_type,
                extensions: self.extensions,
            }),
            SpecVersion::V02 => EventContext::V02(EventContextV02 {
                id: self.id,
                event_type: self.event_type,
                source: self.source,
                time: self.time,
                schema_url: self.schema_url,
                content_type: self.content_type,
                extensions: self.extensions,
            }),
            SpecVersion::V03 => EventContext::V03(EventContextV03 {
                id: self.id,
                event_type: self.event_type,
                source: self.source,
                time: self.time,
                schema_url: self.schema_url,
                data_content_type: self.content_type,
                subject: self.subject,
                extensions: self.extensions,
            }),
        }
    }
}

impl From<EventContext> for Attributes {
    fn from(value: EventContext) -> Self {
        match value {
            EventContext::V01(c) => Attributes {
                id: c.event_id,
                event_type: c.event_type,
                source: c.source,
                time: c.event_time,
                schema_url: c.schema_url,
                content_type: c.content_type,
                subject: None,
                extensions: c.extensions,
            },
            EventContext::V02(c) => Attributes {
                id: c.id,
                event_type: c.event_type,
                source: c.source,
                time: c.time,
                schema_url: c.schema_url,
                content_type: c.content_type,
                subject: None,
                extensions: c.extensions,
            },
            EventContext::V03(c) => Attributes {
                id: c.id,
                event_type: c.event_type,
                source: c.source,
                time: c.time,
                schema_url: c.schema_url,
                content_type: c.data_content_type,
                subject: c.subject,
                extensions: c.extensions,
            },
        }
    }
}

impl EventContext {
    pub fn spec_version(&self) -> SpecVersion {
        match self {
            EventContext::V01(_) => SpecVersion::V01,
            EventContext::V02(_) => SpecVersion::V02,
            EventContext::V03(_) => SpecVersion::V03,
        }
    }

    /// Produce a context of `target` populated from this one.
    ///
    /// Unset optionals stay unset. Attributes the target schema does not
    /// define (e.g. the 0.3 `subject` when targeting 0.2) are dropped.
    /// Content-type defaulting is not applied here; see
    /// [`Event::as_version`](crate::Event::as_version).
    pub fn as_version(&self, target: SpecVersion) -> EventContext {
        let source_version = self.spec_version();
        let attributes = Attributes::from(self.clone());
        if attributes.subject.is_some() && !Attribute::Subject.is_defined_in(target) {
            tracing::debug!(
                from = %source_version,
                to = %target,
                "dropping subject attribute not defined in target version"
            );
        }
        attributes.into_context(target)
    }

    pub fn id(&self) -> &str {
        match self {
            EventContext::V01(c) => &c.event_id,
            EventContext::V02(c) => &c.id,
            EventContext::V03(c) => &c.id,
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            EventContext::V01(c) => &c.event_type,
            EventContext::V02(c) => &c.event_type,
            EventContext::V03(c) => &c.event_type,
        }
    }

    pub fn source(&self) -> &UriRef {
        match self {
            EventContext::V01(c) => &c.source,
            EventContext::V02(c) => &c.source,
            EventContext::V03(c) => &c.source,
        }
    }

    pub fn time(&self) -> Option<Timestamp> {
        match self {
            EventContext::V01(c) => c.event_time,
            EventContext::V02(c) => c.time,
            EventContext::V03(c) => c.time,
        }
    }

    pub fn schema_url(&self) -> Option<&UriRef> {
        match self {
            EventContext::V01(c) => c.schema_url.as_ref(),
            EventContext::V02(c) => c.schema_url.as_ref(),
            EventContext::V03(c) => c.schema_url.as_ref(),
        }
    }

    /// Declared content type; an empty string counts as unset.
    pub fn content_type(&self) -> Option<&str> {
        let content_type = match self {
            EventContext::V01(c) => c.content_type.as_deref(),
            EventContext::V02(c) => c.content_type.as_deref(),
            EventContext::V03(c) => c.data_content_type.as_deref(),
        };
        content_type.filter(|ct| !ct.is_empty())
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            EventContext::V01(_) | EventContext::V02(_) => None,
            EventContext::V03(c) => c.subject.as_deref(),
        }
    }

    pub fn extensions(&self) -> &Extensions {
        match self {
            EventContext::V01(c) => &c.extensions,
            EventContext::V02(c) => &c.extensions,
            EventContext::V03(c) => &c.extensions,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        match &mut self {
            EventContext::V01(c) => c.event_id = id,
            EventContext::V02(c) => c.id = id,
            EventContext::V03(c) => c.id = id,
        }
        self
    }

    pub fn with_time(mut self, time: Timestamp) -> Self {
        match &mut self {
            EventContext::V01(c) => c.event_time = Some(time),
            EventContext::V02(c) => c.time = Some(time),
            EventContext::V03(c) => c.time = Some(time),
        }
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = Some(content_type.into());
        match &mut self {
            EventContext::V01(c) => c.content_type = content_type,
            EventContext::V02(c) => c.content_type = content_type,
            EventContext::V03(c) => c.data_content_type = content_type,
        }
        self
    }

    /// Add an extension attribute; the name is stored lower-cased so it
    /// reads back identically from either encoding.
    pub fn with_extension(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        let extensions = match &mut self {
            EventContext::V01(c) => &mut c.extensions,
            EventContext::V02(c) => &mut c.extensions,
            EventContext::V03(c) => &mut c.extensions,
        };
        extensions.insert(name.into().to_ascii_lowercase(), value);
        self
    }

    /// Check that every required attribute is present and non-empty.
    pub fn validate(&self) -> CodecResult<()> {
        if self.id().is_empty() {
            return Err(CodecError::malformed_attribute("id is required"));
        }
        if self.event_type().is_empty() {
            return Err(CodecError::malformed_attribute("type is required"));
        }
        if self.source().as_str().is_empty() {
            return Err(CodecError::malformed_attribute("source is required"));
        }
        Ok(())
    }

    /// Wire (string) value of `attribute`, if set and defined in this version.
    ///
    /// Timestamps use the RFC 3339 nanosecond form; the spec version is always set.
    pub fn attribute(&self, attribute: Attribute) -> Option<String> {
        match attribute {
            Attribute::Id => Some(self.id().to_string()),
            Attribute::Type => Some(self.event_type().to_string()),
            Attribute::Source => Some(self.source().to_string()),
            Attribute::Time => self.time().map(|t| t.to_rfc3339_nano()),
            Attribute::SpecVersion => Some(self.spec_version().as_str().to_string()),
            Attribute::ContentType => self.content_type().map(str::to_string),
            Attribute::SchemaUrl => self.schema_url().map(|u| u.to_string()),
            Attribute::Subject => self.subject().map(str::to_string),
        }
    }

    /// Assemble a context of `version` from wire (string) attribute values.
    ///
    /// `values` is keyed by semantic attribute; `SpecVersion` entries are
    /// ignored since the caller already resolved the version. Fails with
    /// `MalformedAttribute` when `id`, `type` or `source` is missing or empty,
    /// or when `time`/`schema_url` cannot be parsed.
    pub fn from_attributes(
        version: SpecVersion,
        mut values: BTreeMap<Attribute, String>,
        extensions: Extensions,
    ) -> CodecResult<EventContext> {
        let mut required = |attribute: Attribute| -> CodecResult<String> {
            values
                .remove(&attribute)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    CodecError::malformed_attribute(format!("{} is required", attribute.name()))
                })
        };
        let id = required(Attribute::Id)?;
        let event_type = required(Attribute::Type)?;
        let source = UriRef::parse(required(Attribute::Source)?)?;

        let time = values
            .remove(&Attribute::Time)
            .map(|t| Timestamp::parse(&t))
            .transpose()?;
        let schema_url = values
            .remove(&Attribute::SchemaUrl)
            .map(UriRef::parse)
            .transpose()?;
        let content_type = values
            .remove(&Attribute::ContentType)
            .filter(|ct| !ct.is_empty());
        let subject = values.remove(&Attribute::Subject);

        let attributes = Attributes {
            id,
            event_type,
            source,
            time,
            schema_url,
            content_type,
            subject,
            extensions,
        };
        Ok(attributes.into_context(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn source() -> UriRef {
        UriRef::parse("/unit/test/client").unwrap()
    }

    fn now() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap())
    }

    fn full_v03() -> EventContext {
        let mut ctx = EventContextV03::new("ABC-123", "unit.test.client.sent", source());
        ctx.time = Some(now());
        ctx.schema_url = Some(UriRef::parse("http://example.com/schema").unwrap());
        ctx.data_content_type = Some("text/plain".to_string());
        ctx.subject = Some("widget-7".to_string());
        ctx.extensions
            .insert("traceparent".to_string(), serde_json::json!("00-abc"));
        ctx.into()
    }

    #[test]
    fn variant_reports_its_spec_version() {
        let ctx: EventContext = EventContextV02::new("a", "b", source()).into();
        assert_eq!(ctx.spec_version(), SpecVersion::V02);
        assert_eq!(ctx.attribute(Attribute::SpecVersion).as_deref(), Some("0.2"));
    }

    #[test]
    fn v01_names_map_onto_common_accessors() {
        let mut v01 = EventContextV01::new("321-CBA", "unit.test.client.response", source());
        v01.event_time = Some(now());
        let ctx = EventContext::from(v01);

        assert_eq!(ctx.id(), "321-CBA");
        assert_eq!(ctx.event_type(), "unit.test.client.response");
        assert_eq!(ctx.time(), Some(now()));
    }

    #[test]
    fn conversion_preserves_common_attributes() {
        let original = full_v03();
        for target in SpecVersion::ALL {
            let converted = original.as_version(target);
            assert_eq!(converted.spec_version(), target);
            assert_eq!(converted.id(), original.id());
            assert_eq!(converted.event_type(), original.event_type());
            assert_eq!(converted.source(), original.source());
            assert_eq!(converted.time(), original.time());
            assert_eq!(converted.content_type(), original.content_type());
            assert_eq!(converted.schema_url(), original.schema_url());
            assert_eq!(converted.extensions(), original.extensions());
        }
    }

    #[test]
    fn conversion_drops_attributes_missing_from_target_schema() {
        let v02 = full_v03().as_version(SpecVersion::V02);
        assert_eq!(v02.subject(), None);

        let back = v02.as_version(SpecVersion::V03);
        assert_eq!(back.subject(), None);
    }

    #[test]
    fn conversion_leaves_unset_optionals_unset() {
        let ctx: EventContext = EventContextV02::new("a", "b", source()).into();
        let v01 = ctx.as_version(SpecVersion::V01);
        assert_eq!(v01.time(), None);
        assert_eq!(v01.content_type(), None);
        assert_eq!(v01.schema_url(), None);
    }

    #[test]
    fn as_same_version_is_idempotent() {
        let ctx = full_v03();
        assert_eq!(ctx.as_version(SpecVersion::V03), ctx);
    }

    #[test]
    fn v03_content_type_lives_in_data_content_type() {
        let ctx: EventContext = EventContextV02::new("a", "b", source()).into();
        let ctx = ctx.with_content_type("application/xml").as_version(SpecVersion::V03);
        match ctx {
            EventContext::V03(c) => {
                assert_eq!(c.data_content_type.as_deref(), Some("application/xml"))
            }
            other => panic!("expected a 0.3 context, got {other:?}"),
        }
    }

    #[test]
    fn with_extension_lower_cases_the_name() {
        let ctx = EventContext::from(EventContextV02::new("a", "b", source()))
            .with_extension("traceParent", serde_json::json!("00-abc"));
        assert_eq!(ctx.extensions().get("traceparent"), Some(&serde_json::json!("00-abc")));
        assert!(ctx.extensions().get("traceParent").is_none());
    }

    #[test]
    fn validate_rejects_empty_required_attributes() {
        let ctx: EventContext = EventContextV02::new("", "b", source()).into();
        assert!(matches!(ctx.validate(), Err(CodecError::MalformedAttribute(_))));

        let ctx: EventContext = EventContextV01::new("a", "", source()).into();
        assert!(matches!(ctx.validate(), Err(CodecError::MalformedAttribute(_))));
    }

    #[test]
    fn from_attributes_requires_id_type_and_source() {
        let mut values = BTreeMap::new();
        values.insert(Attribute::Id, "a".to_string());
        values.insert(Attribute::Type, "t".to_string());

        let err = EventContext::from_attributes(SpecVersion::V02, values, Extensions::new())
            .unwrap_err();
        assert_eq!(err, CodecError::MalformedAttribute("source is required".to_string()));
    }

    #[test]
    fn from_attributes_parses_time() {
        let mut values = BTreeMap::new();
        values.insert(Attribute::Id, "a".to_string());
        values.insert(Attribute::Type, "t".to_string());
        values.insert(Attribute::Source, "/s".to_string());
        values.insert(Attribute::Time, "2021-01-01T00:00:00Z".to_string());

        let ctx = EventContext::from_attributes(SpecVersion::V01, values, Extensions::new())
            .unwrap();
        assert_eq!(ctx.time(), Some(now()));
        assert_eq!(ctx.spec_version(), SpecVersion::V01);
    }
}
