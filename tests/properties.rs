//! Property tests for covers, clusterers and nerve assembly.

use std::collections::BTreeSet;
use std::sync::Arc;

use mapper_kernel::{
    Clusterer, CoverSet, FirstHistogramGap, FirstSimpleGap, Interval, LocalClusterer,
    MapperConfig, MapperPipeline, Matrix, Nerve, OneDimensionalCover, SequentialExecutor,
};
use proptest::prelude::*;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn node_count(values: &[f64], config: MapperConfig) -> usize {
    let data = Matrix::column_vector(values.to_vec()).unwrap();
    MapperPipeline::with_executor(config, Arc::new(SequentialExecutor))
        .unwrap()
        .fit_transform(&data)
        .unwrap()
        .node_count()
}

fn cover_sets_strategy() -> impl Strategy<Value = (Vec<CoverSet>, Vec<Vec<usize>>)> {
    prop::collection::vec((prop::collection::vec(0usize..30, 0..12), 1usize..4), 0..8).prop_map(
        |raw| {
            let mut sets = Vec::new();
            let mut labels = Vec::new();
            for (index, (members, k)) in raw.into_iter().enumerate() {
                let set = CoverSet::new(index, vec![Interval::new(0.0, 1.0)], members);
                labels.push(set.members.iter().enumerate().map(|(i, &p)| (p * 7 + i) % k).collect());
                sets.push(set);
            }
            (sets, labels)
        },
    )
}

fn check_labels(labels: &[usize], n: usize) {
    assert_eq!(labels.len(), n);
    // Labels are 0..k, first appearances in increasing order.
    let mut next = 0;
    for &label in labels {
        assert!(label <= next, "label {label} skips ahead of {next}");
        if label == next {
            next += 1;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_cover_reaches_every_value(
        values in prop::collection::vec(-1e3f64..1e3, 1..60),
        n in 1usize..12,
        overlap in 0.0f64..0.95,
    ) {
        let lens = Matrix::column_vector(values.clone()).unwrap();
        let sets = OneDimensionalCover::new(n, overlap).fit_transform(&lens).unwrap();

        for point in 0..values.len() {
            prop_assert!(sets.iter().any(|s| s.contains(point)), "point {} uncovered", point);
        }
        prop_assert!(sets.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn prop_interval_boundaries_are_covered(
        low in -1e3f64..1e3,
        span in 1e-6f64..1e3,
        n in 1usize..16,
        overlap in prop::sample::select(vec![0.0, 0.1, 0.25, 0.5]),
    ) {
        let cover = OneDimensionalCover::new(n, overlap);
        let intervals = cover.fit_intervals(&[low, low + span]);
        prop_assert!(intervals.windows(2).all(|w| w[0].upper >= w[1].lower));

        // Every bound inside the range is itself a lens value.
        let mut values = vec![low, low + span];
        for interval in &intervals {
            values.extend([interval.lower, interval.upper].iter().filter(|v| (low..=low + span).contains(*v)));
        }
        let lens = Matrix::column_vector(values.clone()).unwrap();
        let sets = cover.fit_transform(&lens).unwrap();
        for point in 0..values.len() {
            prop_assert!(sets.iter().any(|s| s.contains(point)), "value {} uncovered", values[point]);
        }
    }

    #[test]
    fn prop_clusters_partition_members(
        rows in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 2), 0..40),
        relative_gap in 0.05f64..1.0,
        threshold in 0usize..3,
    ) {
        let points: Vec<&[f64]> = rows.iter().map(Vec::as_slice).collect();
        let clusterers = [
            Clusterer::from(FirstSimpleGap::new(relative_gap)),
            Clusterer::from(FirstHistogramGap::new(threshold, 5)),
        ];

        for clusterer in &clusterers {
            let labels = clusterer.fit_predict(&points).unwrap();
            check_labels(&labels, points.len());
        }
    }

    #[test]
    fn prop_edge_weights_are_exact_intersections(
        (sets, labels) in cover_sets_strategy(),
        min_intersection in 1usize..3,
    ) {
        let nerve = Nerve::with_min_intersection(min_intersection);
        let graph = nerve.assemble(&sets, &labels).unwrap();

        for (i, a) in graph.nodes.iter().enumerate() {
            prop_assert!(!a.points.is_empty());
            let pa: BTreeSet<usize> = a.points.iter().copied().collect();
            for b in &graph.nodes[i + 1..] {
                let shared = b.points.iter().filter(|p| pa.contains(p)).count();
                match graph.edge(a.id, b.id) {
                    Some(edge) => prop_assert_eq!(edge.weight, shared),
                    None => prop_assert!(shared < min_intersection),
                }
            }
        }
        prop_assert!(graph.edges.iter().all(|e| e.source < e.target));
        prop_assert_eq!(&graph, &nerve.assemble_pairwise(&sets, &labels).unwrap());
    }

    #[test]
    fn prop_nested_refinement_never_loses_nodes(
        values in prop::collection::vec(-100.0f64..100.0, 1..40),
        n in 1usize..8,
        k in 2usize..4,
    ) {
        // Zero overlap and a clusterer that never cuts: nodes are the
        // non-empty intervals, and every interval of n splits into k.
        let config = |intervals| {
            MapperConfig::default()
                .with_cover(OneDimensionalCover::new(intervals, 0.0))
                .with_clusterer(FirstSimpleGap::new(1.0))
        };
        prop_assert!(node_count(&values, config(n)) <= node_count(&values, config(k * n)));
    }

    #[test]
    fn prop_evenly_spaced_refinement_is_monotonic(
        n_points in 2usize..25,
        overlap in 0.0f64..0.9,
    ) {
        let values: Vec<f64> = (0..n_points).map(|i| i as f64).collect();
        let counts: Vec<usize> = (1..=n_points)
            .map(|n| node_count(&values, MapperConfig::default().with_cover(OneDimensionalCover::new(n, overlap))))
            .collect();

        prop_assert!(counts.windows(2).all(|w| w[0] <= w[1]), "counts {:?}", counts);
    }
}
