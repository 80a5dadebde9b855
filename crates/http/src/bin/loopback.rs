//! Sends one event through an in-process loopback and logs the reply.
//!
//! Configuration comes from the environment (`EVENTLY_ENCODING`,
//! `EVENTLY_TARGET`, `EVENTLY_METHOD`, `EVENTLY_RECEIVER_VERSION`, `RUST_LOG`).

use serde_json::json;

use evently_core::{CodecResult, UriRef};
use evently_events::{Event, EventContextV01, EventContextV02};
use evently_http::{
    Client, ClientConfig, Defaults, Loopback, Receiver, ReceiverConfig, SystemClock,
};

fn respond(event: Event) -> CodecResult<Option<Event>> {
    tracing::info!(
        event_id = %event.context().id(),
        spec_version = %event.spec_version(),
        "loopback receiver got event"
    );
    let reply = EventContextV01::new(
        format!("{}-reply", event.context().id()),
        "dev.evently.loopback.response",
        event.context().source().clone(),
    );
    Event::new(reply)
        .with_json(&json!({ "received": event.context().id() }))
        .map(Some)
}

fn main() -> anyhow::Result<()> {
    evently_observability::init();

    let client_config = ClientConfig::from_env();
    let receiver_config = ReceiverConfig::from_env();
    tracing::info!(
        encoding = %client_config.encoding,
        target = %client_config.target,
        method = %client_config.method,
        receiver_version = ?receiver_config.version,
        "starting loopback exchange"
    );

    let receiver = Receiver::new(respond, receiver_config)
        .with_defaults(Defaults::with_time_now(SystemClock));
    let client = Client::new(Loopback::new(receiver), client_config)
        .with_defaults(Defaults::with_time_now(SystemClock).with_uuid_ids());

    let event = Event::new(EventContextV02::new(
        "",
        "dev.evently.loopback.sent",
        UriRef::parse("/evently/loopback")?,
    ))
    .with_json(&json!({ "hello": "loopback" }))?;

    match client.send(event)? {
        Some(reply) => tracing::info!(
            event_id = %reply.context().id(),
            spec_version = %reply.spec_version(),
            content_type = ?reply.context().content_type(),
            data = ?reply.data_as::<serde_json::Value>()?,
            "loopback reply"
        ),
        None => tracing::info!("loopback receiver sent no reply"),
    }
    Ok(())
}
