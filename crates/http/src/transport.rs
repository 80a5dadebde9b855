//! Request/response cycle over an abstract carrier.
//!
//! ```text
//! Idle → Encoding → Transmitted → [remote: decode → handle → encode]
//!      → Decoding → Done
//! ```
//!
//! Any failure ends the exchange with an [`ExchangeError`] naming the phase it
//! failed in. There are no retries and no shared state between exchanges.

use core::fmt;

use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderValue};
use serde_json::json;

use evently_core::{CodecError, CodecResult};
use evently_events::Event;

use crate::binding::{self, Encoding};
use crate::config::{ClientConfig, ReceiverConfig};
use crate::defaults::Defaults;
use crate::message::{Parts, Request, Response};

/// Moves an encoded request to its destination and returns the reply.
///
/// This is the only contract with the HTTP layer; connection handling lives
/// behind it.
pub trait Transport {
    fn send(&self, request: Request) -> CodecResult<Response>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: Request) -> CodecResult<Response> {
        (**self).send(request)
    }
}

/// Receiver-side application logic: consumes an event, optionally replies.
pub trait Handler {
    fn handle(&self, event: Event) -> CodecResult<Option<Event>>;
}

impl<F> Handler for F
where
    F: Fn(Event) -> CodecResult<Option<Event>>,
{
    fn handle(&self, event: Event) -> CodecResult<Option<Event>> {
        self(event)
    }
}

/// Position of an exchange in its lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Encoding,
    Transmitted,
    Decoding,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Encoding => "encoding",
            Phase::Transmitted => "transmitted",
            Phase::Decoding => "decoding",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Terminal failure of an exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("exchange failed while {phase}: {source}")]
pub struct ExchangeError {
    pub phase: Phase,
    #[source]
    pub source: CodecError,
}

/// Tracks one exchange through its phases.
#[derive(Debug)]
struct Exchange {
    phase: Phase,
    event_id: String,
    encoding: Encoding,
}

impl Exchange {
    fn start(event: &Event, encoding: Encoding) -> Self {
        Self {
            phase: Phase::Idle,
            event_id: event.context().id().to_string(),
            encoding,
        }
    }

    fn advance(&mut self, next: Phase) {
        tracing::debug!(
            event_id = %self.event_id,
            encoding = %self.encoding,
            from = %self.phase,
            to = %next,
            "exchange phase"
        );
        self.phase = next;
    }

    fn fail(&self, source: CodecError) -> ExchangeError {
        tracing::debug!(
            event_id = %self.event_id,
            phase = %self.phase,
            error = %source,
            "exchange failed"
        );
        ExchangeError {
            phase: self.phase,
            source,
        }
    }
}

/// Sending side of the binding.
#[derive(Debug)]
pub struct Client<T> {
    transport: T,
    config: ClientConfig,
    defaults: Defaults,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            defaults: Defaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `event` and decode the reply, if the receiver sent one.
    pub fn send(&self, event: Event) -> Result<Option<Event>, ExchangeError> {
        let encoding = self.config.encoding;
        let event = self.defaults.apply(event);
        let mut exchange = Exchange::start(&event, encoding);

        exchange.advance(Phase::Encoding);
        let request = binding::encode_request(
            &event,
            encoding,
            self.config.method.clone(),
            &self.config.target,
        )
        .map_err(|e| exchange.fail(e))?;

        exchange.advance(Phase::Transmitted);
        let response = self.transport.send(request).map_err(|e| exchange.fail(e))?;
        if !response.status.is_success() {
            let detail = String::from_utf8_lossy(&response.body).into_owned();
            return Err(exchange.fail(CodecError::transport(format!(
                "receiver answered {}: {detail}",
                response.status
            ))));
        }

        exchange.advance(Phase::Decoding);
        let reply = binding::decode_response(&response).map_err(|e| exchange.fail(e))?;

        exchange.advance(Phase::Done);
        Ok(reply)
    }
}

/// Receiving side of the binding.
///
/// Decodes whatever encoding arrives, hands the event to the handler, and
/// answers in the encoding the request used.
#[derive(Debug)]
pub struct Receiver<H> {
    handler: H,
    config: ReceiverConfig,
    defaults: Defaults,
}

impl<H: Handler> Receiver<H> {
    pub fn new(handler: H, config: ReceiverConfig) -> Self {
        Self {
            handler,
            config,
            defaults: Defaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn handle(&self, request: Request) -> Response {
        let encoding = Encoding::of(&request);

        let event = match binding::decode(&request) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(encoding = %encoding, error = %err, "rejecting undecodable request");
                return error_response(StatusCode::BAD_REQUEST, &err);
            }
        };
        let event = match self.config.version {
            Some(version) => event.as_version(version),
            None => event,
        };
        tracing::debug!(
            event_id = %event.context().id(),
            spec_version = %event.spec_version(),
            encoding = %encoding,
            "received event"
        );

        let reply = match self.handler.handle(event) {
            Ok(reply) => reply.map(|r| self.defaults.apply(r)),
            Err(err) => {
                tracing::warn!(error = %err, "handler failed");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, &err);
            }
        };

        match binding::encode_response(reply.as_ref(), encoding) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(encoding = %encoding, error = %err, "reply could not be encoded");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &err)
            }
        }
    }
}

/// In-process carrier: delivers requests straight to a [`Receiver`].
#[derive(Debug)]
pub struct Loopback<H> {
    receiver: Receiver<H>,
}

impl<H: Handler> Loopback<H> {
    pub fn new(receiver: Receiver<H>) -> Self {
        Self { receiver }
    }
}

impl<H: Handler> Transport for Loopback<H> {
    fn send(&self, request: Request) -> CodecResult<Response> {
        Ok(self.receiver.handle(request))
    }
}

fn error_response(status: StatusCode, err: &CodecError) -> Response {
    let body = json!({
        "error": err.code(),
        "message": err.to_string(),
    });
    let mut headers = http::HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Response::new(status, Parts::new(headers, body.to_string().into_bytes()))
}
