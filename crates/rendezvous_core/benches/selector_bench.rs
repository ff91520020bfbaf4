//! Benchmarks for heading selection and scheduler ticks
//!
//! Measures performance of:
//! - Weighted azimuth draws across quantizations
//! - Full scheduler frames, including pole arrivals

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rendezvous_core::{ConvergenceScheduler, QuantizedAzimuthSelector, SchedulerConfig};

/// Benchmark a single heading draw with and without a peer
fn bench_next_azimuth(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_azimuth");

    for &q in &[4u32, 8, 36, 360] {
        let selector = QuantizedAzimuthSelector::with_quantization(q);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("solo", q), &selector, |b, s| {
            b.iter(|| s.next_azimuth(black_box(90.0), None, &mut rng))
        });
        group.bench_with_input(BenchmarkId::new("with_peer", q), &selector, |b, s| {
            b.iter(|| s.next_azimuth(black_box(270.0), Some(black_box(90.0)), &mut rng))
        });
    }
    group.finish();
}

/// Benchmark one second of frames at 60 fps
fn bench_scheduler_ticks(c: &mut Criterion) {
    c.bench_function("scheduler_60_frames", |b| {
        let mut scheduler = ConvergenceScheduler::new(SchedulerConfig::default());
        scheduler.start();
        let mut now_ms = 0u64;
        b.iter(|| {
            for _ in 0..60 {
                now_ms += 16;
                scheduler.tick(black_box(now_ms));
            }
            scheduler.drain_events();
        })
    });
}

criterion_group!(benches, bench_next_azimuth, bench_scheduler_ticks);
criterion_main!(benches);
