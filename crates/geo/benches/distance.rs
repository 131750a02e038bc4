//! Benchmarks for geo crate distance calculations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use roadlink_geo::{bearing, distance, offset, GeoPoint};

fn create_points(count: usize) -> Vec<GeoPoint> {
    let london = GeoPoint::new(51.5074, -0.1278);
    (0..count)
        .map(|i| {
            // Spiral out from London, up to ~10 km
            let d = (i as f64 * 37.0) % 10_000.0;
            let theta = i as f64 * 0.61;
            offset(&london, d, theta).unwrap_or(london)
        })
        .collect()
}

fn bench_single_distance(c: &mut Criterion) {
    let berlin = GeoPoint::new(52.5200, 13.4050);
    let paris = GeoPoint::new(48.8566, 2.3522);

    c.bench_function("haversine_single", |b| {
        b.iter(|| distance(black_box(&berlin), black_box(&paris)))
    });

    c.bench_function("bearing_single", |b| {
        b.iter(|| bearing(black_box(&berlin), black_box(&paris)))
    });
}

fn bench_offset(c: &mut Criterion) {
    let london = GeoPoint::new(51.5074, -0.1278);

    c.bench_function("offset_single", |b| {
        b.iter(|| offset(black_box(&london), black_box(2000.0), black_box(0.7)))
    });
}

fn bench_distance_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance_sweep");
    let observer = GeoPoint::new(51.5074, -0.1278);

    for size in [10, 100, 1000, 10000].iter() {
        let points = create_points(*size);

        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, _| {
            b.iter(|| {
                points
                    .iter()
                    .map(|p| distance(black_box(&observer), p))
                    .filter(|d| *d <= 5000.0)
                    .count()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_distance, bench_offset, bench_distance_sweep);
criterion_main!(benches);
