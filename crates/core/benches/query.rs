//! Benchmarks for registry queries and feed recomputes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use roadlink_core::feed::ProximityFeed;
use roadlink_core::registry::{PeerRegistry, PeerSnapshot};
use roadlink_geo::{offset, GeoPoint};

const LONDON: GeoPoint = GeoPoint::new(51.5074, -0.1278);

fn populated_registry(count: usize) -> PeerRegistry {
    let mut registry = PeerRegistry::new();
    for i in 0..count {
        // Spiral out to roughly 10 km so about a quarter fall inside 5 km
        let meters = (i as f64 * 37.0) % 10_000.0;
        let bearing = i as f64 * 0.61;
        if let Ok(position) = offset(&LONDON, meters, bearing) {
            let _ = registry.upsert(PeerSnapshot::new(format!("driver_{i:06}"), "Driver", position));
        }
    }
    registry
}

fn bench_query_within(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_within");

    for size in [10, 100, 1000, 10000].iter() {
        let registry = populated_registry(*size);
        group.bench_with_input(BenchmarkId::new("5km", size), size, |b, _| {
            b.iter(|| registry.query_within(black_box(&LONDON), black_box(5000.0)))
        });
    }

    group.finish();
}

fn bench_feed_recompute(c: &mut Criterion) {
    let registry = populated_registry(1000);
    let mut feed = ProximityFeed::default();
    let _ = feed.start(LONDON, &registry);

    let mut step = 0u32;
    c.bench_function("feed_observer_step", |b| {
        b.iter(|| {
            step = step.wrapping_add(1);
            let moved = GeoPoint::new(LONDON.latitude + f64::from(step % 100) * 1e-4, LONDON.longitude);
            let _ = feed.report_observer_position(black_box(moved), &registry);
        })
    });
}

criterion_group!(benches, bench_query_within, bench_feed_recompute);
criterion_main!(benches);
