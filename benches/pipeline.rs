//! Capture-path and composition benchmarks: raw events → window → vector.

use behavior_telemetry::capture::{EventNormalizer, InputEvent, RawInputEvent};
use behavior_telemetry::config::ResponseTimeScope;
use behavior_telemetry::features::{FeatureComposer, ResultLabel, WindowAccumulator};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

fn make_raw_events(n: usize) -> Vec<RawInputEvent> {
    (0..n)
        .map(|i| {
            let t = i as f64 * 8.0;
            match i % 10 {
                0 => RawInputEvent::pointer_down((i % 800) as f64, (i % 600) as f64, t),
                1 => RawInputEvent::wheel(if i % 20 == 1 { 120.0 } else { -60.0 }, t),
                2 => RawInputEvent::key_down(if i % 30 == 2 { "Shift" } else { "e" }, t),
                3 => RawInputEvent::key_up(if i % 30 == 3 { "Shift" } else { "e" }, t),
                _ => RawInputEvent::pointer_move((i % 800) as f64, ((i * 3) % 600) as f64, t),
            }
        })
        .collect()
}

fn normalized(n: usize) -> Vec<InputEvent> {
    let normalizer = EventNormalizer::new(tokio::time::Instant::now());
    make_raw_events(n)
        .into_iter()
        .filter_map(|e| normalizer.normalize(e))
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let normalizer = EventNormalizer::new(tokio::time::Instant::now());
    let events = make_raw_events(1_000);

    c.bench_function("normalize_1000_events", |b| {
        b.iter(|| {
            for e in events.iter().cloned() {
                black_box(normalizer.normalize(e));
            }
        })
    });
}

fn bench_accumulate(c: &mut Criterion) {
    let events = normalized(10_000);

    c.bench_function("accumulate_10000_events", |b| {
        b.iter(|| {
            let mut acc = WindowAccumulator::new();
            for e in &events {
                acc.apply(black_box(e));
            }
            black_box(acc)
        })
    });
}

fn bench_flush(c: &mut Criterion) {
    let events = normalized(10_000);
    let composer = FeatureComposer::new(ResultLabel::Human);

    let mut g = c.benchmark_group("detach_and_compose");
    for n in [100, 1_000, 10_000] {
        let mut acc = WindowAccumulator::new();
        for e in &events[..n] {
            acc.apply(e);
        }
        g.bench_function(format!("events_{}", n).as_str(), |b| {
            b.iter(|| {
                let mut live = acc.clone();
                let window = live.detach(ResponseTimeScope::Session, 5_000.0);
                black_box(composer.compose(&window, Duration::from_secs(5)))
            })
        });
    }
    g.finish();
}

criterion_group!(benches, bench_normalize, bench_accumulate, bench_flush);
criterion_main!(benches);
