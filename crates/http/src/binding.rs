//! Encoding selection and the two entry points used by the transport:
//! `encode(event, encoding) -> message` and `decode(message) -> event`.

use core::fmt;
use core::str::FromStr;

use http::{Method, StatusCode};

use evently_core::{CodecError, CodecResult};
use evently_events::Event;

use crate::message::{Message, Parts, Request, Response, media_type};
use crate::structured::CONTENT_TYPE_STRUCTURED;
use crate::{binary, structured};

/// Wire encoding of an event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Attributes as headers, payload as raw body.
    #[default]
    Binary,
    /// Attributes and payload in one JSON document.
    Structured,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Binary => "binary",
            Encoding::Structured => "structured",
        }
    }

    /// Structured iff the media type is `application/cloudevents+json`.
    pub fn detect(content_type: Option<&str>) -> Encoding {
        match content_type {
            Some(ct) if media_type(ct) == CONTENT_TYPE_STRUCTURED => Encoding::Structured,
            _ => Encoding::Binary,
        }
    }

    pub fn of(message: &impl Message) -> Encoding {
        Encoding::detect(message.content_type())
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(Encoding::Binary),
            "structured" => Ok(Encoding::Structured),
            other => Err(CodecError::encoding_mismatch(format!("unknown encoding {other:?}"))),
        }
    }
}

/// Encode `event` with `encoding`.
pub fn encode(event: &Event, encoding: Encoding) -> CodecResult<Parts> {
    match encoding {
        Encoding::Binary => binary::encode(event),
        Encoding::Structured => structured::encode(event),
    }
}

/// Decode any message, picking the decoder from its content type.
pub fn decode(message: &impl Message) -> CodecResult<Event> {
    match Encoding::of(message) {
        Encoding::Binary => binary::decode(message.headers(), message.body()),
        Encoding::Structured => structured::decode(message.body()),
    }
}

pub fn encode_request(
    event: &Event,
    encoding: Encoding,
    method: Method,
    target: &str,
) -> CodecResult<Request> {
    Ok(Request::new(method, target, encode(event, encoding)?))
}

/// Encode an optional reply: `200 OK` with the event, or a bodiless `202 Accepted`.
pub fn encode_response(event: Option<&Event>, encoding: Encoding) -> CodecResult<Response> {
    match event {
        Some(event) => Ok(Response::new(StatusCode::OK, encode(event, encoding)?)),
        None => Ok(Response::empty(StatusCode::ACCEPTED)),
    }
}

/// Decode a reply; a bodiless response carries no event.
pub fn decode_response(response: &Response) -> CodecResult<Option<Event>> {
    let bodiless = response.body.is_empty() && Encoding::of(response) == Encoding::Binary;
    if bodiless && !has_event_headers(response) {
        return Ok(None);
    }
    decode(response).map(Some)
}

fn has_event_headers(message: &impl Message) -> bool {
    message
        .headers()
        .keys()
        .any(|name| name.as_str().starts_with(evently_events::attribute::HEADER_PREFIX))
}
