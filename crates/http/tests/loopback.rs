//! Full client → receiver → client exchanges over a tapping in-process carrier.
//!
//! Each case checks the request as sent, the response as received, and the
//! event the client finally decodes.

use std::cell::RefCell;
use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use http::header::CONTENT_LENGTH;
use http::{HeaderMap, Method, StatusCode};
use serde_json::{Value, json};

use evently_core::{CodecResult, Timestamp, UriRef};
use evently_events::{
    Event, EventContext, EventContextV01, EventContextV02, EventContextV03, SpecVersion,
};
use evently_http::{
    Client, ClientConfig, Defaults, Encoding, FixedClock, Loopback, Message, Receiver,
    ReceiverConfig, Request, Response, Transport,
};

/// Records every request/response pair passing through `inner`.
struct Tap<T> {
    inner: T,
    captured: RefCell<Vec<(Request, Response)>>,
}

impl<T> Tap<T> {
    fn new(inner: T) -> Self {
        Self {
            inner,
            captured: RefCell::new(Vec::new()),
        }
    }

    fn single(&self) -> (Request, Response) {
        let captured = self.captured.borrow();
        assert_eq!(captured.len(), 1, "expected exactly one exchange");
        captured[0].clone()
    }
}

impl<T: Transport> Transport for Tap<T> {
    fn send(&self, request: Request) -> CodecResult<Response> {
        let response = self.inner.send(request.clone())?;
        self.captured.borrow_mut().push((request, response.clone()));
        Ok(response)
    }
}

struct Case {
    event: Event,
    resp: Event,
    want: EventContext,
    want_data: Value,
}

struct Outcome {
    sent: Request,
    received: Response,
    reply: Event,
}

fn now() -> Timestamp {
    let t = Utc.with_ymd_and_hms(2019, 3, 14, 15, 9, 26).unwrap();
    Timestamp::new(t + chrono::Duration::nanoseconds(535_897_932))
}

fn now_text() -> String {
    now().to_rfc3339_nano()
}

fn source() -> UriRef {
    UriRef::parse("/unit/test/client").unwrap()
}

fn request_v02() -> Event {
    Event::new(EventContextV02::new("ABC-123", "unit.test.client.sent", source()))
        .with_json(&json!({"hello": "unittest"}))
        .unwrap()
}

fn response_data() -> Value {
    json!({"unittest": "response"})
}

fn loopback(case: &Case, encoding: Encoding) -> Outcome {
    let resp = case.resp.clone();
    let handler = move |_event: Event| -> CodecResult<Option<Event>> { Ok(Some(resp.clone())) };
    let receiver = Receiver::new(handler, ReceiverConfig::default())
        .with_defaults(Defaults::with_time_now(FixedClock::new(now())));
    let tap = Tap::new(Loopback::new(receiver));

    let config = ClientConfig {
        encoding,
        ..ClientConfig::default()
    };
    let client =
        Client::new(&tap, config).with_defaults(Defaults::with_time_now(FixedClock::new(now())));

    let reply = client
        .send(case.event.clone())
        .expect("exchange succeeds")
        .expect("receiver replies");
    let (sent, received) = tap.single();
    Outcome {
        sent,
        received,
        reply,
    }
}

/// Headers as name → values, leaving out the length the carrier accounts separately.
fn header_table(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut table: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        if *name == CONTENT_LENGTH {
            continue;
        }
        table
            .entry(name.as_str().to_string())
            .or_default()
            .push(value.to_str().unwrap().to_string());
    }
    table
}

fn table(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), vec![v.to_string()]))
        .collect()
}

fn body_text(message: &impl Message) -> &str {
    std::str::from_utf8(message.body()).unwrap()
}

fn assert_reply(outcome: &Outcome, case: &Case) {
    assert_eq!(outcome.reply.context(), &case.want);
    assert_eq!(
        outcome.reply.data_as::<Value>().unwrap(),
        Some(case.want_data.clone())
    );
}

fn assert_binary_request(sent: &Request) {
    assert_eq!(sent.method, Method::POST);
    assert_eq!(sent.target, "/");
    assert_eq!(
        header_table(&sent.headers),
        table(&[
            ("ce-specversion", "0.2"),
            ("ce-id", "ABC-123"),
            ("ce-time", now_text().as_str()),
            ("ce-type", "unit.test.client.sent"),
            ("ce-source", "/unit/test/client"),
            ("content-type", "application/json"),
        ])
    );
    assert_eq!(body_text(sent), r#"{"hello":"unittest"}"#);
    assert_eq!(sent.content_length(), 20);
}

#[test]
fn binary_v02_to_v01() {
    let mut want = EventContextV01::new("321-CBA", "unit.test.client.response", source());
    want.event_time = Some(now());
    want.content_type = Some("application/json".to_string());

    let case = Case {
        event: request_v02(),
        resp: Event::new(EventContextV01::new(
            "321-CBA",
            "unit.test.client.response",
            source(),
        ))
        .with_json(&response_data())
        .unwrap(),
        want: want.into(),
        want_data: response_data(),
    };

    let outcome = loopback(&case, Encoding::Binary);
    assert_binary_request(&outcome.sent);

    assert_eq!(outcome.received.status.to_string(), "200 OK");
    assert_eq!(
        header_table(&outcome.received.headers),
        table(&[
            ("ce-cloudeventsversion", "0.1"),
            ("ce-eventid", "321-CBA"),
            ("ce-eventtime", now_text().as_str()),
            ("ce-eventtype", "unit.test.client.response"),
            ("ce-source", "/unit/test/client"),
            ("content-type", "application/json"),
        ])
    );
    assert_eq!(body_text(&outcome.received), r#"{"unittest":"response"}"#);
    assert_eq!(outcome.received.content_length(), 23);

    assert_reply(&outcome, &case);
}

#[test]
fn binary_v02_to_v02() {
    let mut want = EventContextV02::new("321-CBA", "unit.test.client.response", source());
    want.time = Some(now());
    want.content_type = Some("application/json".to_string());

    let case = Case {
        event: request_v02(),
        resp: Event::new(EventContextV02::new(
            "321-CBA",
            "unit.test.client.response",
            source(),
        ))
        .with_json(&response_data())
        .unwrap(),
        want: want.into(),
        want_data: response_data(),
    };

    let outcome = loopback(&case, Encoding::Binary);
    assert_binary_request(&outcome.sent);

    assert_eq!(outcome.received.status, StatusCode::OK);
    assert_eq!(
        header_table(&outcome.received.headers),
        table(&[
            ("ce-specversion", "0.2"),
            ("ce-id", "321-CBA"),
            ("ce-time", now_text().as_str()),
            ("ce-type", "unit.test.client.response"),
            ("ce-source", "/unit/test/client"),
            ("content-type", "application/json"),
        ])
    );
    assert_eq!(body_text(&outcome.received), r#"{"unittest":"response"}"#);
    assert_eq!(outcome.received.content_length(), 23);

    assert_reply(&outcome, &case);
}

#[test]
fn structured_v02_to_v02() {
    let mut want = EventContextV02::new("321-CBA", "unit.test.client.response", source());
    want.time = Some(now());
    want.content_type = Some("application/json".to_string());

    let case = Case {
        event: request_v02(),
        resp: Event::new(EventContextV02::new(
            "321-CBA",
            "unit.test.client.response",
            source(),
        ))
        .with_json(&response_data())
        .unwrap(),
        want: want.into(),
        want_data: response_data(),
    };

    let outcome = loopback(&case, Encoding::Structured);

    let sent_body = format!(
        r#"{{"contenttype":"application/json","data":{{"hello":"unittest"}},"id":"ABC-123","source":"/unit/test/client","specversion":"0.2","time":"{}","type":"unit.test.client.sent"}}"#,
        now_text()
    );
    assert_eq!(outcome.sent.method, Method::POST);
    assert_eq!(outcome.sent.target, "/");
    assert_eq!(
        header_table(&outcome.sent.headers),
        table(&[("content-type", "application/cloudevents+json")])
    );
    assert_eq!(body_text(&outcome.sent), sent_body);
    assert_eq!(outcome.sent.content_length(), sent_body.len());

    let received_body = format!(
        r#"{{"contenttype":"application/json","data":{{"unittest":"response"}},"id":"321-CBA","source":"/unit/test/client","specversion":"0.2","time":"{}","type":"unit.test.client.response"}}"#,
        now_text()
    );
    assert_eq!(outcome.received.status.to_string(), "200 OK");
    assert_eq!(
        header_table(&outcome.received.headers),
        table(&[("content-type", "application/cloudevents+json")])
    );
    assert_eq!(body_text(&outcome.received), received_body);
    assert_eq!(outcome.received.content_length(), received_body.len());

    assert_reply(&outcome, &case);
}

#[test]
fn binary_v02_to_v03() {
    let mut want = EventContextV03::new("321-CBA", "unit.test.client.response", source());
    want.time = Some(now());
    want.data_content_type = Some("application/json".to_string());

    let case = Case {
        event: request_v02(),
        resp: Event::new(EventContextV03::new(
            "321-CBA",
            "unit.test.client.response",
            source(),
        ))
        .with_json(&response_data())
        .unwrap(),
        want: want.into(),
        want_data: response_data(),
    };

    let outcome = loopback(&case, Encoding::Binary);
    assert_binary_request(&outcome.sent);

    assert_eq!(outcome.received.status, StatusCode::OK);
    assert_eq!(
        header_table(&outcome.received.headers),
        table(&[
            ("ce-specversion", "0.3"),
            ("ce-id", "321-CBA"),
            ("ce-time", now_text().as_str()),
            ("ce-type", "unit.test.client.response"),
            ("ce-source", "/unit/test/client"),
            ("content-type", "application/json"),
        ])
    );
    assert_eq!(body_text(&outcome.received), r#"{"unittest":"response"}"#);
    assert_eq!(outcome.received.content_length(), 23);

    assert_reply(&outcome, &case);
}

#[test]
fn every_version_pair_survives_both_encodings() {
    for encoding in [Encoding::Binary, Encoding::Structured] {
        for sent_version in SpecVersion::ALL {
            for reply_version in SpecVersion::ALL {
                let event = request_v02().as_version(sent_version);
                let reply_context = EventContext::from(EventContextV02::new(
                    "321-CBA",
                    "unit.test.client.response",
                    source(),
                ))
                .as_version(reply_version);
                let case = Case {
                    event,
                    resp: Event::new(reply_context.clone())
                        .with_json(&response_data())
                        .unwrap(),
                    want: reply_context
                        .with_time(now())
                        .with_content_type("application/json"),
                    want_data: response_data(),
                };

                let outcome = loopback(&case, encoding);
                let decoded_request = evently_http::decode(&outcome.sent).unwrap();
                assert_eq!(decoded_request.spec_version(), sent_version);
                assert_eq!(decoded_request.context().id(), "ABC-123");
                assert_eq!(decoded_request.context().time(), Some(now()));
                assert_eq!(
                    decoded_request.data_as::<Value>().unwrap(),
                    Some(json!({"hello": "unittest"}))
                );
                assert_eq!(outcome.reply.spec_version(), reply_version);
                assert_reply(&outcome, &case);
            }
        }
    }
}

#[test]
fn receiver_without_reply_answers_accepted() {
    let receiver = Receiver::new(
        |_event: Event| -> CodecResult<Option<Event>> { Ok(None) },
        ReceiverConfig::default(),
    );
    let tap = Tap::new(Loopback::new(receiver));
    let client = Client::new(&tap, ClientConfig::default());

    assert_eq!(client.send(request_v02()).unwrap(), None);
    let (_, received) = tap.single();
    assert_eq!(received.status, StatusCode::ACCEPTED);
    assert!(received.body.is_empty());
}
