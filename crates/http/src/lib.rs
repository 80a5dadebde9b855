//! HTTP binding for versioned events.
//!
//! Maps [`Event`](evently_events::Event)s to and from carrier messages in two
//! encodings:
//!
//! - **binary** ([`binary`]): attributes as `ce-` headers, payload as raw body
//! - **structured** ([`structured`]): attributes and payload in one
//!   `application/cloudevents+json` document
//!
//! [`binding`] picks the encoding, [`transport`] drives the
//! send → receive → handle → reply cycle over an abstract [`Transport`].

pub mod binary;
pub mod binding;
pub mod config;
pub mod defaults;
pub mod message;
pub mod structured;
pub mod transport;

pub use binding::{Encoding, decode, decode_response, encode, encode_request, encode_response};
pub use config::{ClientConfig, ReceiverConfig};
pub use defaults::{Clock, Defaults, FixedClock, SystemClock};
pub use message::{Message, Parts, Request, Response};
pub use transport::{Client, ExchangeError, Handler, Loopback, Phase, Receiver, Transport};
