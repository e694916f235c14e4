//! Integration tests for polynest-d2.

use polynest_core::{
    BoundRect, GeneticSearch, NestConfig, PackedConfig, Phenotype, Point, PointPool, Polygon, PolygonNode,
    RotationTable, BIN_SOURCE,
};
use polynest_d2::clipper::{area, to_path, ClipType, ClippingEngine, IntPoint, PolyFillType, PolyType};
use polynest_d2::codec::{decode_forest, encode_forest};
use polynest_d2::nfp_sliding::{find_contacts, orbit, polygons_intersect};
use polynest_d2::{no_fit_polygon_rectangle, Nester, NfpEngine, NfpStore, OffsetEngine, TreeBuilder};
use std::sync::Arc;

fn l_shape() -> Polygon {
    Polygon::from_tuples(&[
        (0.0, 0.0),
        (40.0, 0.0),
        (40.0, 15.0),
        (15.0, 15.0),
        (15.0, 40.0),
        (0.0, 40.0),
    ])
}

fn sorted(points: &[IntPoint]) -> Vec<(i64, i64)> {
    let mut out: Vec<(i64, i64)> = points.iter().map(|p| (p.x, p.y)).collect();
    out.sort_unstable();
    out
}

mod clipping_tests {
    use super::*;

    #[test]
    fn test_self_union_is_idempotent() {
        for polygon in [Polygon::rectangle(0.0, 0.0, 30.0, 20.0), l_shape()] {
            let path = to_path(polygon.points(), 1000.0);
            let mut clipper = ClippingEngine::new();
            assert!(clipper.add_path(&path, PolyType::Subject));
            let union = clipper.execute(ClipType::Union, PolyFillType::NonZero).unwrap();
            assert_eq!(union.len(), 1);
            assert_eq!(sorted(&union[0]), sorted(&path));
            assert_eq!(area(&union[0]).abs(), area(&path).abs());
        }
    }

    #[test]
    fn test_difference_punches_hole() {
        let mut clipper = ClippingEngine::new();
        clipper.add_path(&to_path(Polygon::rectangle(0.0, 0.0, 100.0, 100.0).points(), 1.0), PolyType::Subject);
        clipper.add_path(&to_path(Polygon::rectangle(25.0, 25.0, 50.0, 50.0).points(), 1.0), PolyType::Clip);
        let result = clipper.execute(ClipType::Difference, PolyFillType::NonZero).unwrap();
        assert_eq!(result.len(), 2);
        let total: f64 = result.iter().map(|p| area(p)).sum();
        assert_eq!(total.abs(), 10_000.0 - 2_500.0);
    }

    #[test]
    fn test_offset_round_trip_convex() {
        let hexagon: Vec<IntPoint> = (0..6)
            .map(|i| {
                let a = f64::from(i) * std::f64::consts::PI / 3.0;
                IntPoint::new((100_000.0 * a.cos()).round() as i64, (100_000.0 * a.sin()).round() as i64)
            })
            .collect();
        for path in [hexagon, to_path(Polygon::rectangle(0.0, 0.0, 50.0, 20.0).points(), 1000.0)] {
            let mut engine = OffsetEngine::new();
            let grown = engine.execute(&path, 2_000.0);
            assert_eq!(grown.len(), 1);
            let back = engine.execute(&grown[0], -2_000.0);
            assert_eq!(back.len(), 1);
            let (before, after) = (area(&path).abs(), area(&back[0]).abs());
            assert!((before - after).abs() / before < 0.005, "{} vs {}", before, after);
        }
    }
}

mod nfp_tests {
    use super::*;

    #[test]
    fn test_rectangle_shortcut_matches_orbit() {
        let bin = Polygon::rectangle(0.0, 0.0, 60.0, 40.0);
        let movers = [
            Polygon::from_tuples(&[(0.0, 0.0), (12.0, 0.0), (6.0, 9.0)]),
            Polygon::rectangle(0.0, 0.0, 7.0, 13.0),
            Polygon::from_tuples(&[(3.0, 1.0), (11.0, 2.0), (9.0, 8.0), (1.0, 6.0)]),
        ];
        let mut pool = PointPool::new();
        for moving in &movers {
            let closed = no_fit_polygon_rectangle(&bin, moving).unwrap();
            let loops = orbit(&mut pool, bin.points(), moving.points(), true).unwrap();
            assert_eq!(loops.len(), 1);
            let orbited = Polygon::new(loops[0].clone());
            let (a, b) = (orbited.bounds(), closed.bounds());
            assert!((a.x() - b.x()).abs() < 1e-9 && (a.y() - b.y()).abs() < 1e-9);
            assert!((a.width() - b.width()).abs() < 1e-9 && (a.height() - b.height()).abs() < 1e-9);
            assert!((orbited.abs_area() - closed.abs_area()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_outer_nfp_touches_without_overlap() {
        let cases = [
            (l_shape(), Polygon::rectangle(0.0, 0.0, 10.0, 10.0)),
            (l_shape(), Polygon::from_tuples(&[(0.0, 0.0), (8.0, 0.0), (4.0, 6.0)])),
            (Polygon::rectangle(0.0, 0.0, 20.0, 20.0), l_shape()),
        ];
        let mut engine = NfpEngine::new();
        for (a, b) in &cases {
            let loops = engine.no_fit_polygon(a, b, false).unwrap();
            assert!(!loops.is_empty());
            let reference = b.points()[0];
            for nfp in &loops {
                for &p in nfp.points() {
                    let offset = p - reference;
                    assert!(!polygons_intersect(a.points(), b.points(), offset), "overlap at {:?}", p);
                    assert!(!find_contacts(a.points(), b.points(), offset).is_empty(), "no contact at {:?}", p);
                }
            }
        }
    }

    #[test]
    fn test_outer_nfp_encloses_stationary() {
        let mut engine = NfpEngine::new();
        let a = l_shape();
        let loops = engine.no_fit_polygon(&a, &Polygon::rectangle(0.0, 0.0, 5.0, 5.0), false).unwrap();
        assert!(loops[0].abs_area() > a.abs_area());
    }
}

mod search_tests {
    use super::*;

    fn nodes() -> Vec<PolygonNode> {
        (0..6)
            .map(|i| PolygonNode::new(i, Polygon::rectangle(0.0, 0.0, 5.0 + f64::from(i), 4.0)))
            .collect()
    }

    fn is_permutation(genome: &Phenotype, n: usize) -> bool {
        let mut order = genome.placement.clone();
        order.sort_unstable();
        order == (0..n).collect::<Vec<_>>() && genome.rotation.len() == n
    }

    #[test]
    fn test_population_is_permutations() {
        let config = NestConfig::new().with_population_size(8).with_rotations(4).with_mutation_rate(50);
        let mut search = GeneticSearch::init(
            nodes(),
            BoundRect::new(0.0, 0.0, 100.0, 100.0),
            &config,
            Arc::new(RotationTable::new(4)),
        )
        .unwrap();
        assert_eq!(search.population().len(), 8);
        assert!(search.population().iter().all(|g| is_permutation(g, 6)));

        for generation in 0..3 {
            for i in 0..search.population().len() {
                search.set_fitness(i, f64::from(generation * 10) + i as f64);
            }
            search.generation_step();
            assert_eq!(search.population().len(), 8);
            assert!(search.population().iter().all(|g| is_permutation(g, 6)));
        }
    }

    #[test]
    fn test_store_skips_cached_pairs() {
        let nodes = nodes();
        let bin = PolygonNode::new(BIN_SOURCE, Polygon::rectangle(0.0, 0.0, 100.0, 100.0));
        let config = PackedConfig::try_from(&NestConfig::new().with_rotations(2)).unwrap();
        let table = RotationTable::new(2);
        let mut store = NfpStore::new();
        let mut engine = NfpEngine::new();

        let first = Phenotype::new(vec![0, 1, 2, 3], vec![0.0, 180.0, 0.0, 0.0]);
        let jobs = store.init(&nodes, &first, &bin, config, &table);
        assert_eq!(jobs.len(), 4 + 6);
        let results = jobs
            .iter()
            .map(|job| polynest_d2::codec::encode_pair_result(job.key, &engine.pair_nfp(job).unwrap()))
            .collect();
        store.update(results).unwrap();

        let second = Phenotype::new(vec![3, 0, 4, 1], vec![0.0, 0.0, 0.0, 180.0]);
        let jobs = store.init(&nodes, &second, &bin, config, &table);
        assert!(!jobs.is_empty());
        assert!(jobs.iter().all(|job| !store.contains(job.key)));
    }
}

mod nesting_tests {
    use super::*;

    fn overlaps(a: (f64, f64, f64), b: (f64, f64, f64)) -> bool {
        let eps = 1e-6;
        a.0 + a.2 > b.0 + eps && b.0 + b.2 > a.0 + eps && a.1 + a.2 > b.1 + eps && b.1 + b.2 > a.1 + eps
    }

    #[test]
    fn test_two_squares_in_one_bin() {
        let config = NestConfig::new().with_rotations(1).with_population_size(4);
        let mut nester = Nester::new(config).unwrap().with_threads(2).with_seed(1);
        let bin = Polygon::rectangle(0.0, 0.0, 100.0, 100.0);
        let square = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        nester.start(&bin, &[square.clone(), square]).unwrap();

        let best = nester.run(4).unwrap().cloned().unwrap();
        assert_eq!(best.bins_used(), 1);
        assert_eq!(best.placement_count(), 2);
        assert!(best.fitness < 2.0);

        let boxes: Vec<(f64, f64, f64)> = best.bins[0].iter().map(|p| (p.x, p.y, 10.0)).collect();
        assert!(!overlaps(boxes[0], boxes[1]));
        for (x, y, size) in boxes {
            assert!(x >= -1e-6 && y >= -1e-6 && x + size <= 100.0 + 1e-6 && y + size <= 100.0 + 1e-6);
        }
    }

    #[test]
    fn test_oversized_part_is_never_placed() {
        let config = NestConfig::new().with_rotations(1).with_population_size(3);
        let mut nester = Nester::new(config).unwrap().with_threads(2).with_seed(2);
        let bin = Polygon::rectangle(0.0, 0.0, 100.0, 100.0);
        let parts = vec![
            Polygon::rectangle(0.0, 0.0, 150.0, 120.0),
            Polygon::rectangle(0.0, 0.0, 20.0, 20.0),
        ];
        nester.start(&bin, &parts).unwrap();

        let best = nester.run(3).unwrap().cloned().unwrap();
        assert!(best.placed_count() < parts.len());
        assert_eq!(best.unplaced, vec![0]);
        assert!(best.fitness >= 2.0);
    }

    #[test]
    fn test_spacing_keeps_parts_apart() {
        let config = NestConfig::new().with_rotations(1).with_population_size(2).with_spacing(4.0);
        let mut nester = Nester::new(config).unwrap().with_threads(1).with_seed(3);
        let bin = Polygon::rectangle(0.0, 0.0, 60.0, 60.0);
        let square = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        nester.start(&bin, &[square.clone(), square]).unwrap();

        let best = nester.run(2).unwrap().cloned().unwrap();
        assert_eq!(best.placement_count(), 2);
        let (a, b) = (best.bins[0][0], best.bins[0][1]);
        // parts grew by 2 on each side
        let gap = (a.x - b.x).abs().max((a.y - b.y).abs());
        assert!(gap >= 14.0 - 1e-6);
    }

    #[test]
    fn test_part_nests_inside_hole() {
        let config = NestConfig::new()
            .with_rotations(1)
            .with_population_size(4)
            .with_use_holes(true);
        let mut nester = Nester::new(config).unwrap().with_threads(2).with_seed(4);
        // the frame alone nearly fills the bin, so the square only fits in its hole
        let bin = Polygon::rectangle(0.0, 0.0, 105.0, 105.0);
        let frame = Polygon::rectangle(0.0, 0.0, 100.0, 100.0);
        let hole = Polygon::rectangle(20.0, 20.0, 60.0, 60.0);
        let square = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        nester.start(&bin, &[frame, hole, square]).unwrap();

        let best = nester.run(8).unwrap().cloned().unwrap();
        assert_eq!(best.bins_used(), 1);
        assert!(best.unplaced.is_empty());
        assert_eq!(best.placed_count(), 2);

        let find = |source: i32| best.bins[0].iter().find(|p| p.source == source).copied().unwrap();
        let (f, s) = (find(0), find(2));
        let (dx, dy) = (s.x - f.x, s.y - f.y);
        assert!((20.0 - 1e-6..=70.0 + 1e-6).contains(&dx), "dx = {}", dx);
        assert!((20.0 - 1e-6..=70.0 + 1e-6).contains(&dy), "dy = {}", dy);
    }
}

mod forest_tests {
    use super::*;

    #[test]
    fn test_three_level_forest_round_trip() {
        let innermost = PolygonNode::new(2, Polygon::rectangle(35.0, 35.0, 10.0, 10.0));
        let hole = PolygonNode::new(1, Polygon::rectangle(20.0, 20.0, 40.0, 40.0)).with_children(vec![innermost]);
        let part = PolygonNode::new(0, Polygon::rectangle(0.0, 0.0, 80.0, 80.0))
            .with_rotation(270.0)
            .with_children(vec![hole]);
        let forest = vec![part, PolygonNode::new(3, l_shape())];

        let decoded = decode_forest(&encode_forest(&forest)).unwrap();
        assert_eq!(decoded, forest);
        assert_eq!(decoded[0].count(), 3);
    }

    #[test]
    fn test_tree_builder_nests_parts() {
        let builder = TreeBuilder::new(&NestConfig::new());
        let parts = vec![
            Polygon::rectangle(20.0, 20.0, 40.0, 40.0),
            Polygon::rectangle(0.0, 0.0, 80.0, 80.0),
            Polygon::rectangle(35.0, 35.0, 10.0, 10.0),
        ];
        let forest = builder.generate_tree(&parts);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].source, 1);
        assert_eq!(forest[0].children[0].source, 0);
        assert_eq!(forest[0].children[0].children[0].source, 2);

        let decoded = decode_forest(&encode_forest(&forest)).unwrap();
        assert_eq!(decoded, forest);
    }

    #[test]
    fn test_point_offsets_survive_round_trip() {
        let node = PolygonNode::new(0, Polygon::new(vec![Point::new(0.1, 0.2), Point::new(1e9, -3.5), Point::new(-7.25, 1e-12)]));
        let decoded = decode_forest(&encode_forest(&[node.clone()])).unwrap();
        assert_eq!(decoded[0].polygon.points(), node.polygon.points());
    }
}
