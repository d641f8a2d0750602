//! Codec benchmarks for golf-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use golf_protocol::{codec, GameSnapshot, InboundMessage, OutboundResponse, WireFormat};
use serde_json::json;

fn sample_game() -> OutboundResponse {
    OutboundResponse::game(GameSnapshot::new(json!({
        "id": 42,
        "state": "started",
        "owner": "sess_1",
        "players": ["sess_1", "sess_2", "sess_3", "sess_4"],
    })))
}

fn bench_encode_game(c: &mut Criterion) {
    let response = sample_game();

    let mut group = c.benchmark_group("encode_game");
    group.bench_function("json", |b| {
        b.iter(|| WireFormat::Json.encode(black_box(&response)))
    });
    group.bench_function("msgpack", |b| {
        b.iter(|| WireFormat::MessagePack.encode(black_box(&response)))
    });
    group.finish();
}

fn bench_decode_inbound(c: &mut Criterion) {
    let text = r#"{"type":"startGame","gameId":42}"#;
    let binary = codec::encode(&InboundMessage::StartGame { game_id: 42 }).unwrap();

    let mut group = c.benchmark_group("decode_inbound");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("json", |b| {
        b.iter(|| codec::decode_json::<InboundMessage>(black_box(text)))
    });
    group.throughput(Throughput::Bytes(binary.len() as u64));
    group.bench_function("msgpack", |b| {
        b.iter(|| codec::decode::<InboundMessage>(black_box(&binary)))
    });
    group.finish();
}

criterion_group!(benches, bench_encode_game, bench_decode_inbound);
criterion_main!(benches);
