//! Structured mode: attributes and payload in one JSON document.

use std::collections::BTreeMap;

use http::header::{CONTENT_TYPE, HeaderValue};
use http::HeaderMap;
use serde_json::Value;

use evently_core::{CodecError, CodecResult};
use evently_events::{Attribute, Data, Event, EventContext, Extensions, SpecVersion};

use crate::message::{Parts, is_json};

/// Content type of a structured-mode message.
pub const CONTENT_TYPE_STRUCTURED: &str = "application/cloudevents+json";

const DATA_KEY: &str = "data";
const SPEC_VERSION_KEY: &str = "specversion";
/// 0.1 nests extensions under this key; later versions flatten them.
const EXTENSIONS_KEY: &str = "extensions";

/// Encode `event` as a single JSON object with alphabetically ordered keys.
pub fn encode(event: &Event) -> CodecResult<Parts> {
    event.validate()?;
    let event = event.finalized();
    let context = event.context();
    let version = context.spec_version();

    // BTreeMap keeps the keys sorted whatever serde_json's map flavor is.
    let mut document: BTreeMap<&str, Value> = BTreeMap::new();

    let extensions = context.extensions();
    match version {
        SpecVersion::V01 => {
            if !extensions.is_empty() {
                let nested = extensions
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<serde_json::Map<_, _>>();
                document.insert(EXTENSIONS_KEY, Value::Object(nested));
            }
        }
        SpecVersion::V02 | SpecVersion::V03 => {
            for (name, value) in extensions {
                if is_reserved_key(version, name) {
                    return Err(CodecError::malformed_attribute(format!(
                        "extension {name:?} collides with a {version} attribute key"
                    )));
                }
                document.insert(name.as_str(), value.clone());
            }
        }
    }

    for attribute in Attribute::ALL {
        let key = attribute.json_key(version);
        if let (Some(key), Some(value)) = (key, context.attribute(attribute)) {
            document.insert(key, Value::String(value));
        }
    }

    if let Some(data) = event.data().filter(|_| event.has_payload()) {
        document.insert(DATA_KEY, data_value(data, context.content_type())?);
    }

    let body = serde_json::to_vec(&document)
        .map_err(|e| CodecError::encoding_mismatch(format!("document is not serializable: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_STRUCTURED));
    Ok(Parts::new(headers, body))
}

/// Decode a structured-mode body.
pub fn decode(body: &[u8]) -> CodecResult<Event> {
    let document: Value = serde_json::from_slice(body)
        .map_err(|e| CodecError::malformed_body(format!("body is not JSON: {e}")))?;
    let Value::Object(mut document) = document else {
        return Err(CodecError::malformed_body("body is not a JSON object"));
    };

    let version: SpecVersion = match document.remove(SPEC_VERSION_KEY) {
        Some(Value::String(version)) if !version.is_empty() => version.parse()?,
        Some(Value::String(_)) | None => {
            return Err(CodecError::malformed_attribute("specversion is required"));
        }
        Some(other) => {
            return Err(CodecError::malformed_attribute(format!(
                "specversion must be a string, got {other}"
            )));
        }
    };
    let data = document.remove(DATA_KEY);

    let mut extensions = Extensions::new();
    let nested_extensions = matches!(document.get(EXTENSIONS_KEY), Some(Value::Object(_)));
    if version == SpecVersion::V01 && nested_extensions {
        if let Some(Value::Object(nested)) = document.remove(EXTENSIONS_KEY) {
            extensions.extend(nested);
        }
    }

    let mut values = BTreeMap::new();
    for (key, value) in document {
        match Attribute::from_json_key(version, &key) {
            Some(attribute) => {
                let Value::String(value) = value else {
                    return Err(CodecError::malformed_attribute(format!("{key} must be a string")));
                };
                values.insert(attribute, value);
            }
            None => {
                extensions.insert(key, value);
            }
        }
    }

    let context = EventContext::from_attributes(version, values, extensions)?;
    let data = match data {
        None | Some(Value::Null) => None,
        Some(value) => Some(data_from_value(value, context.content_type())),
    };
    Ok(Event::from_parts(context, data))
}

/// Key of a known attribute of `version`, or one the document layout uses.
fn is_reserved_key(version: SpecVersion, key: &str) -> bool {
    key == DATA_KEY || key == SPEC_VERSION_KEY || Attribute::from_json_key(version, key).is_some()
}

/// Payloads declared as JSON are embedded as JSON values; anything else as
/// the UTF-8 text of its wire bytes, so the body decodes back to the same bytes
/// binary mode would carry.
fn data_value(data: &Data, content_type: Option<&str>) -> CodecResult<Value> {
    if content_type.is_none_or(is_json) {
        return match data {
            Data::Json(value) => Ok(value.clone()),
            Data::Binary(bytes) => serde_json::from_slice(bytes).map_err(|e| {
                CodecError::encoding_mismatch(format!(
                    "payload is declared as JSON but does not parse: {e}"
                ))
            }),
        };
    }
    String::from_utf8(data.to_bytes()?).map(Value::String).map_err(|_| {
        CodecError::encoding_mismatch(
            "binary payload is not UTF-8 text and cannot be embedded in a structured document",
        )
    })
}

/// Inverse of [`data_value`]: text under a non-JSON content type is bytes.
fn data_from_value(value: Value, content_type: Option<&str>) -> Data {
    match value {
        Value::String(text) if !content_type.is_none_or(is_json) => {
            Data::Binary(text.into_bytes())
        }
        other => Data::Json(other),
    }
}
