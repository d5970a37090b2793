//! Session state machine benchmark suite.
//!
//! Measures the sans-IO hot paths without any sockets:
//! - Full connect cycle (resolve, connect, handshake, close)
//! - Inbound frames at different queue bounds
//! - Queued outbound writes
//!
//! Run with: cargo bench --bench session_machine
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::net::SocketAddr;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ws_client_session::{Completion, QueueLimit, ReadOutcome, SessionMachine, SessionOptions};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const FRAME_COUNTS: &[usize] = &[100, 1_000, 10_000];
const QUEUE_BOUND: usize = 64;

// ============================================================================
// Helpers
// ============================================================================

fn endpoint() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9001))
}

fn connected(options: SessionOptions) -> SessionMachine {
    let mut machine = SessionMachine::new(options);
    let _ = machine.connect("example.org", "80");
    machine.step(Completion::Resolved(Ok(vec![endpoint()])));
    machine.step(Completion::TransportConnected(Ok(endpoint())));
    machine.step(Completion::Handshake(Ok(())));
    machine
}

fn frame(index: usize) -> String {
    format!("{{\"seq\":{index},\"payload\":\"benchmark frame\"}}")
}

// ============================================================================
// Benchmark: Connect Cycle
// ============================================================================

fn bench_connect_cycle(c: &mut Criterion) {
    c.bench_function("connect_cycle", |b| {
        b.iter(|| {
            let mut machine = connected(SessionOptions::new());
            machine.step(Completion::Read(ReadOutcome::EndOfStream));
            machine.step(Completion::Closed(Ok(())));
            black_box(machine.state())
        });
    });
}

// ============================================================================
// Benchmark: Inbound Frames
// ============================================================================

fn bench_inbound(c: &mut Criterion) {
    let limits = [
        ("unbounded", QueueLimit::Unbounded),
        ("drop_oldest", QueueLimit::DropOldest(QUEUE_BOUND)),
        ("drop_newest", QueueLimit::DropNewest(QUEUE_BOUND)),
    ];

    let mut group = c.benchmark_group("inbound");

    for &count in FRAME_COUNTS {
        group.throughput(Throughput::Elements(count as u64));

        for (name, limit) in limits {
            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, &count| {
                b.iter(|| {
                    let mut machine =
                        connected(SessionOptions::new().with_inbound_limit(limit));
                    for index in 0..count {
                        machine.step(Completion::Read(ReadOutcome::Frame(frame(index))));
                    }
                    while let Some(message) = machine.next_message() {
                        black_box(message);
                    }
                    black_box(machine.dropped_messages())
                });
            });
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Outbound Writes
// ============================================================================

fn bench_outbound(c: &mut Criterion) {
    let mut group = c.benchmark_group("outbound");

    for &count in FRAME_COUNTS {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("queued", count), &count, |b, &count| {
            b.iter(|| {
                let mut machine = connected(SessionOptions::new());
                for index in 0..count {
                    let _ = machine.send(frame(index));
                }
                while machine.write_in_flight() {
                    machine.step(Completion::Write(Ok(())));
                }
                black_box(machine.outbound_len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_connect_cycle, bench_inbound, bench_outbound);
criterion_main!(benches);
