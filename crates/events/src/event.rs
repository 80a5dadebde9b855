use serde::Serialize;
use serde::de::DeserializeOwned;

use evently_core::{CodecError, CodecResult};

use crate::context::APPLICATION_JSON;
use crate::{EventContext, SpecVersion};

/// Event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    /// Structured data, marshaled as JSON on the wire.
    Json(serde_json::Value),
    /// Already-encoded bytes, carried byte-exact.
    Binary(Vec<u8>),
}

impl Data {
    /// `null` JSON and zero-length bytes carry nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Data::Json(value) => value.is_null(),
            Data::Binary(bytes) => bytes.is_empty(),
        }
    }

    /// Raw body bytes: JSON marshaled compactly, binary unchanged.
    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        match self {
            Data::Json(value) => serde_json::to_vec(value).map_err(unserializable),
            Data::Binary(bytes) => Ok(bytes.clone()),
        }
    }
}

impl From<serde_json::Value> for Data {
    fn from(value: serde_json::Value) -> Self {
        Data::Json(value)
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Data::Binary(value)
    }
}

/// A context of one spec version paired with an optional payload.
///
/// Events are values: codecs read them and conversions build new ones, nothing
/// mutates an event in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    context: EventContext,
    data: Option<Data>,
}

impl Event {
    pub fn new(context: impl Into<EventContext>) -> Self {
        Self {
            context: context.into(),
            data: None,
        }
    }

    pub fn from_parts(context: impl Into<EventContext>, data: Option<Data>) -> Self {
        Self {
            context: context.into(),
            data,
        }
    }

    pub fn with_data(mut self, data: impl Into<Data>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Attach a structured payload.
    pub fn with_json<T: Serialize>(self, data: &T) -> CodecResult<Self> {
        let value = serde_json::to_value(data).map_err(unserializable)?;
        Ok(self.with_data(Data::Json(value)))
    }

    pub fn with_context(mut self, context: impl Into<EventContext>) -> Self {
        self.context = context.into();
        self
    }

    pub fn context(&self) -> &EventContext {
        &self.context
    }

    pub fn data(&self) -> Option<&Data> {
        self.data.as_ref()
    }

    pub fn spec_version(&self) -> SpecVersion {
        self.context.spec_version()
    }

    pub fn into_parts(self) -> (EventContext, Option<Data>) {
        (self.context, self.data)
    }

    pub fn has_payload(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// Deserialize the payload as JSON into `T`.
    ///
    /// Works for both payload forms, so an event decoded from a binary body
    /// compares equal to the structured data it was built from.
    pub fn data_as<T: DeserializeOwned>(&self) -> CodecResult<Option<T>> {
        match &self.data {
            None => Ok(None),
            Some(Data::Json(value)) => Ok(Some(serde_json::from_value(value.clone())?)),
            Some(Data::Binary(bytes)) if bytes.is_empty() => Ok(None),
            Some(Data::Binary(bytes)) => Ok(Some(serde_json::from_slice(bytes)?)),
        }
    }

    /// Finalize the context: a non-empty payload with no declared content
    /// type gets `application/json`.
    pub fn finalized(&self) -> Event {
        let mut event = self.clone();
        if event.has_payload() && event.context.content_type().is_none() {
            event.context = event.context.with_content_type(APPLICATION_JSON);
        }
        event
    }

    /// View this event under `target`'s schema, finalizing the new context.
    pub fn as_version(&self, target: SpecVersion) -> Event {
        Event {
            context: self.context.as_version(target),
            data: self.data.clone(),
        }
        .finalized()
    }

    pub fn validate(&self) -> CodecResult<()> {
        self.context.validate()
    }
}

fn unserializable(e: serde_json::Error) -> CodecError {
    CodecError::encoding_mismatch(format!("payload is not serializable: {e}"))
}
