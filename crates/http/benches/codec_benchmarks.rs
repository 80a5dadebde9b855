use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use serde_json::json;

use evently_core::{Timestamp, UriRef};
use evently_events::{Event, EventContext, EventContextV02, SpecVersion};
use evently_http::{Encoding, decode, encode};

fn sample_event(fields: usize) -> Event {
    let payload: serde_json::Map<String, serde_json::Value> = (0..fields)
        .map(|i| (format!("field_{i:04}"), json!(format!("value {i}"))))
        .collect();
    let context = EventContext::from(EventContextV02::new(
        "ABC-123",
        "bench.event.sent",
        UriRef::parse("/bench/source").expect("valid uri"),
    ))
    .with_time(Timestamp::new(Utc::now()))
    .with_extension(
        "traceparent",
        json!("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
    );
    Event::new(context)
        .with_json(&payload)
        .expect("serializable payload")
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for fields in [1usize, 16, 256] {
        let event = sample_event(fields);
        group.throughput(Throughput::Elements(1));
        for encoding in [Encoding::Binary, Encoding::Structured] {
            group.bench_with_input(
                BenchmarkId::new(encoding.as_str(), fields),
                &event,
                |b, event| b.iter(|| encode(black_box(event), encoding).expect("encodes")),
            );
        }
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for fields in [1usize, 16, 256] {
        let event = sample_event(fields);
        for encoding in [Encoding::Binary, Encoding::Structured] {
            let parts = encode(&event, encoding).expect("encodes");
            group.throughput(Throughput::Bytes(parts.body.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(encoding.as_str(), fields),
                &parts,
                |b, parts| b.iter(|| decode(black_box(parts)).expect("decodes")),
            );
        }
    }
    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let event = sample_event(16);
    let mut group = c.benchmark_group("as_version");
    for target in SpecVersion::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(target), &event, |b, event| {
            b.iter(|| black_box(event).as_version(target))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_convert);
criterion_main!(benches);
