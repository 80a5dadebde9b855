//! Binary mode: attributes as headers, payload as the raw body.

use std::collections::BTreeMap;

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use evently_core::{CodecError, CodecResult};
use evently_events::attribute::{extension_from_header_name, extension_header_name};
use evently_events::{Attribute, Event, EventContext, Extensions, SpecVersion};

use crate::message::{Parts, media_type};
use crate::structured::CONTENT_TYPE_STRUCTURED;

const VERSION_MARKERS: [&str; 2] = ["ce-specversion", "ce-cloudeventsversion"];

/// Encode `event` as headers plus raw body.
///
/// Only set attributes become headers. The body is the payload byte-for-byte
/// (JSON payloads are marshaled compactly) and `content-length` matches it.
///
/// A content type of `application/cloudevents+json` is refused: it would make
/// the message read back as structured mode.
pub fn encode(event: &Event) -> CodecResult<Parts> {
    event.validate()?;
    let event = event.finalized();
    let context = event.context();
    let version = context.spec_version();

    if let Some(content_type) = context.content_type() {
        if media_type(content_type) == CONTENT_TYPE_STRUCTURED {
            return Err(CodecError::encoding_mismatch(format!(
                "content type {content_type:?} is reserved for structured mode"
            )));
        }
    }

    let mut headers = HeaderMap::new();
    for attribute in Attribute::ALL {
        let name = attribute.header_name(version);
        let (Some(name), Some(value)) = (name, context.attribute(attribute)) else {
            continue;
        };
        let value = header_value(attribute.name(), &value)?;
        headers.insert(HeaderName::from_static(name), value);
    }

    for (name, value) in context.extensions() {
        if name.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(CodecError::malformed_attribute(format!(
                "extension {name:?} must be lower-case to travel as a header"
            )));
        }
        let header = extension_header_name(name);
        let reserved = VERSION_MARKERS.contains(&header.as_str())
            || Attribute::from_header_name(version, &header).is_some();
        if reserved {
            return Err(CodecError::malformed_attribute(format!(
                "extension {name:?} collides with a {version} attribute header"
            )));
        }
        let header = HeaderName::from_bytes(header.as_bytes())
            .map_err(|e| CodecError::malformed_attribute(format!("extension {name:?}: {e}")))?;
        headers.insert(header, header_value(name, &extension_text(value))?);
    }

    let body = match event.data() {
        Some(data) => data.to_bytes()?,
        None => Vec::new(),
    };
    Ok(Parts::new(headers, body))
}

/// Decode headers plus raw body into an event of the version the headers declare.
///
/// Unknown `ce-` headers become string extensions; the body, if any, becomes
/// binary data.
pub fn decode(headers: &HeaderMap, body: &[u8]) -> CodecResult<Event> {
    let version = spec_version(headers)?;

    let mut values = BTreeMap::new();
    let mut extensions = Extensions::new();
    for (name, value) in headers {
        let name = name.as_str();
        if VERSION_MARKERS.contains(&name) {
            continue;
        }
        if let Some(attribute) = Attribute::from_header_name(version, name) {
            let value = header_text(name, value)?;
            values.entry(attribute).or_insert(value);
        } else if let Some(extension) = extension_from_header_name(name) {
            let value = header_text(name, value)?;
            extensions
                .entry(extension.to_string())
                .or_insert(serde_json::Value::String(value));
        }
    }

    let context = EventContext::from_attributes(version, values, extensions)?;
    let data = (!body.is_empty()).then(|| body.to_vec().into());
    Ok(Event::from_parts(context, data))
}

fn spec_version(headers: &HeaderMap) -> CodecResult<SpecVersion> {
    let (name, value) = VERSION_MARKERS
        .iter()
        .find_map(|name| headers.get(*name).map(|value| (*name, value)))
        .ok_or_else(|| CodecError::malformed_attribute("spec version header is required"))?;
    let version = header_text(name, value)?;
    if version.is_empty() {
        return Err(CodecError::malformed_attribute(format!("{name} is empty")));
    }
    version.parse()
}

fn header_value(name: &str, value: &str) -> CodecResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        CodecError::malformed_attribute(format!("{name} cannot be carried in a header: {e}"))
    })
}

fn header_text(name: &str, value: &HeaderValue) -> CodecResult<String> {
    String::from_utf8(value.as_bytes().to_vec())
        .map_err(|e| CodecError::malformed_attribute(format!("{name} is not valid UTF-8: {e}")))
}

/// Strings go out verbatim, other scalars in their JSON text form.
fn extension_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
