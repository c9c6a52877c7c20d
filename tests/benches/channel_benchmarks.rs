//! # Switchyard Benchmarks
//!
//! | Component | Operation |
//! |-----------|-----------|
//! | QueueChannel | send + receive round trip |
//! | PriorityChannel | ordered insert under load |
//! | BroadcastingDispatcher | fan-out to N subscribers |
//! | CachingSessionFactory | acquire + release of a warm session |
//! | RemoteFileTemplate | REPLACE send through the in-memory store |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use sy_01_dispatcher::{BroadcastingDispatcher, DispatchMode, DispatcherConfig};
use sy_02_channels::{ChannelConfig, PriorityChannel, QueueChannel};
use sy_03_session_pool::{CachingSessionFactory, PoolConfig};
use sy_04_remote_transfer::{
    InMemorySessionFactory, InMemoryStore, RemoteFileTemplate, TransferConfig, TransferPayload,
};
use sy_types::{consumer, keys, Message, MessageBuilder, MessageChannel, PollableChannel};

// ============================================================================
// Channels
// ============================================================================

fn bench_queue_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue-channel");
    group.measurement_time(Duration::from_secs(5));

    let channel: QueueChannel<u64> =
        QueueChannel::new(ChannelConfig::bounded("bench", 1024)).unwrap();
    group.throughput(Throughput::Elements(1));
    group.bench_function("send_receive", |b| {
        b.iter(|| {
            channel.try_send(Message::new(black_box(42))).unwrap();
            black_box(channel.try_receive().unwrap());
        })
    });

    group.finish();
}

fn bench_priority_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority-channel");
    group.measurement_time(Duration::from_secs(5));

    for depth in [16usize, 256, 1024] {
        let messages: Vec<Message<u64>> = (0..depth as u64)
            .map(|i| MessageBuilder::with_payload(i).priority((i % 7) as i64).build())
            .collect();

        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("fill_drain", depth), &messages, |b, messages| {
            b.iter(|| {
                let channel: PriorityChannel<u64> =
                    PriorityChannel::new(ChannelConfig::bounded("bench", depth)).unwrap();
                for message in messages {
                    channel.try_send(message.clone()).unwrap();
                }
                while let Some(message) = channel.try_receive() {
                    black_box(message);
                }
            })
        });
    }

    group.finish();
}

// ============================================================================
// Dispatcher
// ============================================================================

fn bench_dispatcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatcher");
    group.measurement_time(Duration::from_secs(5));

    for (label, mode) in [
        ("synchronous", DispatchMode::Synchronous),
        ("concurrent", DispatchMode::Concurrent),
    ] {
        for subscribers in [1usize, 6, 32] {
            let dispatcher = BroadcastingDispatcher::new(DispatcherConfig::default().with_mode(mode));
            for _ in 0..subscribers {
                dispatcher.subscribe(consumer(|message: &Message<u64>| {
                    black_box(message.payload());
                }));
            }
            let message = Message::new(7u64);

            group.throughput(Throughput::Elements(subscribers as u64));
            group.bench_with_input(BenchmarkId::new(label, subscribers), &message, |b, message| {
                b.iter(|| black_box(dispatcher.dispatch(message).unwrap()))
            });
        }
    }

    group.finish();
}

// ============================================================================
// Session pool and transfer
// ============================================================================

fn bench_pool_and_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("session-pool");
    group.measurement_time(Duration::from_secs(5));

    let pool = CachingSessionFactory::new(
        InMemorySessionFactory::new(InMemoryStore::new()),
        PoolConfig::default(),
    )
    .unwrap();
    drop(pool.acquire().unwrap());
    group.bench_function("acquire_release_warm", |b| {
        b.iter(|| black_box(pool.acquire().unwrap().release()))
    });

    let template =
        RemoteFileTemplate::new(pool.clone(), TransferConfig::default()).unwrap();
    let message = MessageBuilder::with_payload(TransferPayload::from(vec![0u8; 4096]))
        .set_header(keys::FILE_NAME, "bench.bin")
        .build();
    group.throughput(Throughput::Bytes(4096));
    group.bench_function("template_replace_4k", |b| {
        b.iter(|| black_box(template.send(&message).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_queue_channel,
    bench_priority_channel,
    bench_dispatcher,
    bench_pool_and_transfer
);
criterion_main!(benches);
