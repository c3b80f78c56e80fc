//! Channel and store micro-benchmark.
//!
//! Measures the per-sample cost of the sampling hot path:
//! - routine push + pop
//! - routine push on a full queue (drop path)
//! - alert push + pop
//! - store write under an uncontended lock
//! - full `Pipeline::publish` for a normal reading

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use iaq_common::alert::AlertBits;
use iaq_common::config::NodeConfig;
use iaq_common::reading::{MetricKind, Reading, ReadingStatus};
use iaq_node::drivers::scripted::NullSink;
use iaq_node::queue::{AlertQueue, RoutineQueue};
use iaq_node::store::ReadingStore;
use iaq_node::workers::Pipeline;

fn sample() -> Reading {
    Reading {
        temperature: 22,
        humidity: 45,
        co2: 650,
        status: ReadingStatus::Normal,
    }
}

fn bench_routine_push_pop(c: &mut Criterion) {
    let q = RoutineQueue::new(12);
    c.bench_function("routine_push_pop", |b| {
        b.iter(|| {
            let _ = q.push(black_box(sample()));
            black_box(q.try_pop())
        })
    });
}

fn bench_routine_drop(c: &mut Criterion) {
    let q = RoutineQueue::new(12);
    for _ in 0..12 {
        let _ = q.push(sample());
    }
    c.bench_function("routine_push_full_drop", |b| {
        b.iter(|| black_box(q.push(black_box(sample()))))
    });
}

fn bench_alert_push_pop(c: &mut Criterion) {
    let q = AlertQueue::new(6);
    c.bench_function("alert_push_pop", |b| {
        b.iter(|| {
            let _ = q.push(black_box(sample()));
            black_box(q.pop_timeout(Duration::from_millis(1)))
        })
    });
}

fn bench_store_write(c: &mut Criterion) {
    let store = ReadingStore::new(Duration::from_millis(200));
    c.bench_function("store_write_metrics", |b| {
        b.iter(|| {
            black_box(store.write_metrics(black_box(&[
                (MetricKind::Co2, 700),
                (MetricKind::Humidity, 40),
            ])))
        })
    });
}

fn bench_publish_normal(c: &mut Criterion) {
    let pipeline = Pipeline::new(&NodeConfig::default(), Arc::new(NullSink));
    c.bench_function("pipeline_publish_normal", |b| {
        b.iter(|| {
            let outcome =
                pipeline.publish(black_box(&[(MetricKind::Temperature, 22)]), AlertBits::empty());
            pipeline.routine.try_pop();
            black_box(outcome)
        })
    });
}

criterion_group!(
    benches,
    bench_routine_push_pop,
    bench_routine_drop,
    bench_alert_push_pop,
    bench_store_write,
    bench_publish_normal,
);
criterion_main!(benches);
