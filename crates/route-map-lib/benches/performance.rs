//! Performance benchmarks for route-map-lib
//!
//! Run with: cargo bench --package route-map-lib

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use gpx::{Gpx, Track, TrackSegment, Waypoint};
use route_map_lib::{Config, Coordinate, Placement, Route, RouteCollection, gpx_io};
use std::hint::black_box;

/// Generate a wiggly GPX track with the specified number of points
fn generate_gpx_track(num_points: usize, base_lat: f64, base_lon: f64) -> Gpx {
    let mut gpx = Gpx::default();
    let mut track = Track::default();
    let mut segment = TrackSegment::default();

    for i in 0..num_points {
        let t = i as f64 / num_points as f64;
        let lat = base_lat + t * 0.1 + (t * 50.0).sin() * 0.001;
        let lon = base_lon + t * 0.1 + (t * 30.0).cos() * 0.001;
        segment.points.push(Waypoint::new(geo::Point::new(lon, lat)));
    }

    track.name = Some(format!("track {base_lat:.1} {base_lon:.1}"));
    track.segments.push(segment);
    gpx.tracks.push(track);
    gpx
}

/// Generate routes spread across an area
fn generate_routes(num_routes: usize, points_per_route: usize) -> Vec<Route> {
    (0..num_routes)
        .flat_map(|i| {
            let lat_offset = (i % 10) as f64 * 0.1;
            let lon_offset = (i / 10) as f64 * 0.1;
            gpx_io::import_gpx(&generate_gpx_track(
                points_per_route,
                51.5 + lat_offset,
                -0.1 + lon_offset,
            ))
        })
        .collect()
}

fn collection_with(routes: &[Route]) -> RouteCollection {
    let mut collection = RouteCollection::new(Config::default());
    for route in routes.iter().cloned() {
        let _ = collection.add(route, Placement::Static);
    }
    collection
}

// ============================================================================
// Route edits
// ============================================================================

fn bench_route_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("route");

    let route = generate_routes(1, 50_000).remove(0);
    let middle = Coordinate::new(51.55, -0.05);

    group.throughput(Throughput::Elements(50_000));
    group.bench_function("split_50k", |b| {
        b.iter(|| route.split(black_box(middle)));
    });
    group.bench_function("simplify_50k", |b| {
        b.iter(|| route.simplify(black_box(5.0)));
    });

    group.finish();
}

// ============================================================================
// Collection operations
// ============================================================================

fn bench_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection");
    group.sample_size(20);

    let routes = generate_routes(100, 1_000);

    group.bench_function("add_100x1k_with_dedup", |b| {
        b.iter(|| collection_with(&routes));
    });

    let collection = collection_with(&routes);
    group.bench_function("compute_stats_100", |b| {
        b.iter(|| collection.compute_stats(black_box("")));
    });
    group.bench_function("base_scene_100", |b| {
        b.iter(|| collection.base_scene());
    });

    let id = collection.routes().next().map(|(id, _)| id.clone()).unwrap();
    group.bench_function("split_and_drain", |b| {
        b.iter_batched(
            || collection.clone(),
            |mut collection| {
                let _halves = collection.split(&id, Coordinate::new(51.55, -0.05)).unwrap();
                collection.drain_updates()
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");
    group.sample_size(20);

    let routes = generate_routes(50, 1_000);
    group.throughput(Throughput::Elements(50 * 1_000));
    group.bench_function("prepare_50x1k", |b| {
        b.iter(|| gpx_io::prepare_imports(&routes, 1.0));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_route_edits, bench_collection, bench_import);

criterion_main!(benches);
