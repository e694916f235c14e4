//! Benchmarks for the hot paths of a nesting run.
//!
//! Measures clipping unions, orbital NFP computation and one placement
//! evaluation at various scales.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polynest_core::{PackedConfig, Point, Polygon, PolygonNode, BIN_SOURCE};
use polynest_d2::clipper::{to_path, ClipType, ClippingEngine, PolyFillType, PolyType};
use polynest_d2::codec::{NfpCache, NfpKey, PlacementJob};
use polynest_d2::{NfpEngine, PlacementEngine};

fn star(points: usize, outer: f64, inner: f64) -> Polygon {
    Polygon::new(
        (0..points * 2)
            .map(|i| {
                let r = if i % 2 == 0 { outer } else { inner };
                let a = i as f64 * std::f64::consts::PI / points as f64;
                Point::new(r * a.cos(), r * a.sin())
            })
            .collect(),
    )
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("clipping_union");
    for &n in &[4usize, 16, 64] {
        let paths: Vec<_> = (0..n)
            .map(|i| {
                let mut p = star(8, 20.0, 8.0);
                p.translate(Point::new((i % 8) as f64 * 15.0, (i / 8) as f64 * 15.0));
                to_path(p.points(), 1e7)
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("stars", n), &paths, |b, paths| {
            b.iter(|| {
                let mut clipper = ClippingEngine::new();
                clipper.add_paths(black_box(paths), PolyType::Subject);
                black_box(clipper.execute(ClipType::Union, PolyFillType::NonZero))
            })
        });
    }
    group.finish();
}

fn bench_orbit(c: &mut Criterion) {
    let mut group = c.benchmark_group("orbital_nfp");
    for &points in &[4usize, 8, 16] {
        let a = star(points, 30.0, 12.0);
        let b = star(points, 10.0, 4.0);
        group.bench_with_input(BenchmarkId::new("star_pair", points), &(a, b), |bench, (a, b)| {
            let mut engine = NfpEngine::new();
            bench.iter(|| black_box(engine.no_fit_polygon(black_box(a), black_box(b), false)))
        });
    }
    group.finish();
}

fn bench_placement(c: &mut Criterion) {
    let bin = Polygon::rectangle(0.0, 0.0, 200.0, 200.0);
    let parts: Vec<PolygonNode> = (0..12)
        .map(|i| {
            let w = 20.0 + (i as f64 * 3.0) % 30.0;
            let h = 15.0 + (i as f64 * 7.0) % 25.0;
            PolygonNode::new(i, Polygon::rectangle(0.0, 0.0, w, h))
        })
        .collect();

    let mut engine = NfpEngine::new();
    let mut cache = NfpCache::new();
    for (i, part) in parts.iter().enumerate() {
        if let Ok(loops) = engine.no_fit_polygon(&bin, &part.polygon, true) {
            cache.insert(NfpKey::new(BIN_SOURCE, part.source, 0, 0, true).pack(), loops);
        }
        for other in &parts[..i] {
            if let Ok(loops) = engine.no_fit_polygon(&other.polygon, &part.polygon, false) {
                cache.insert(NfpKey::new(other.source, part.source, 0, 0, false).pack(), loops);
            }
        }
    }
    let mut config = PackedConfig::unpack(0);
    config.rotations = 1;
    let job = PlacementJob {
        config,
        area: bin.abs_area(),
        nfp_cache: cache,
        parts,
    };

    c.bench_function("place_paths_12_rectangles", |b| {
        let mut placement = PlacementEngine::new(1e7);
        b.iter(|| black_box(placement.place_paths(black_box(&job))))
    });
}

criterion_group!(benches, bench_union, bench_orbit, bench_placement);
criterion_main!(benches);
