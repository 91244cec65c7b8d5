//! Golden tests for the Mapper kernel.
//!
//! These tests pin down exact graphs for small datasets and verify that
//! repeated runs and different executors produce identical graphs.

use std::sync::Arc;

use mapper_kernel::{
    BranchExecutor, Clusterer, CubicalCover, Dataset, FilterFunction, FirstHistogramGap,
    MapperConfig, MapperGraph, MapperPipeline, Matrix, NerveEdge, OneDimensionalCover,
    Projection, RayonExecutor, SequentialExecutor,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn line(n: usize) -> Dataset {
    Matrix::column_vector((0..n).map(|i| i as f64).collect()).unwrap()
}

/// `n` points evenly spaced on the unit circle, starting at angle 0.
fn circle(n: usize) -> Dataset {
    let rows = (0..n)
        .map(|k| {
            let t = 2.0 * std::f64::consts::PI * k as f64 / n as f64;
            vec![t.cos(), t.sin()]
        })
        .collect();
    Matrix::from_rows(rows).unwrap()
}

fn run_with(config: MapperConfig, executor: Arc<dyn BranchExecutor>, data: &Dataset) -> MapperGraph {
    MapperPipeline::with_executor(config, executor)
        .unwrap()
        .fit_transform(data)
        .unwrap()
}

fn circle_config() -> MapperConfig {
    MapperConfig::default()
        .with_filters(vec![FilterFunction::Projection(Projection::new(vec![0]))])
        .with_cover(OneDimensionalCover::new(6, 0.3))
}

// ─────────────────────────────────────────────────────────────────────────────
// Exact Graphs
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_nine_points_on_a_line() {
    let config = MapperConfig::default().with_cover(OneDimensionalCover::new(3, 0.2));
    let graph = MapperPipeline::new(config).unwrap().fit_transform(&line(9)).unwrap();

    assert_eq!(graph.node_count(), 3);
    let points: Vec<Vec<usize>> = graph.nodes.iter().map(|n| n.points.clone()).collect();
    assert_eq!(points, vec![vec![0, 1, 2, 3], vec![3, 4, 5], vec![5, 6, 7, 8]]);

    // Each edge weight is the number of points in the overlap.
    assert_eq!(graph.edges, vec![NerveEdge::new(0, 1, 1), NerveEdge::new(1, 2, 1)]);
}

#[test]
fn test_circle_becomes_a_cycle() {
    let graph = MapperPipeline::new(circle_config()).unwrap().fit_transform(&circle(60)).unwrap();

    // End intervals hold one arc each; the four middle intervals split into
    // an upper and a lower arc.
    assert_eq!(graph.node_count(), 10);
    assert_eq!(graph.edge_count(), 10);
    assert_eq!(graph.connected_components().len(), 1);
    for node in &graph.nodes {
        assert_eq!(graph.degree(node.id), 2, "node {} is not on the cycle", node.id);
    }
}

#[test]
fn test_two_lines_stay_disconnected() {
    // Two parallel segments far apart in the second coordinate.
    let rows = (0..20)
        .flat_map(|i| [vec![i as f64, 0.0], vec![i as f64, 100.0]])
        .collect();
    let data = Matrix::from_rows(rows).unwrap();

    let config = MapperConfig::default()
        .with_cover(OneDimensionalCover::new(4, 0.25))
        .with_clusterer(Clusterer::FirstHistogramGap(FirstHistogramGap::default()));
    let graph = MapperPipeline::new(config).unwrap().fit_transform(&data).unwrap();

    assert_eq!(graph.node_count(), 8);
    let components = graph.connected_components();
    assert_eq!(components.len(), 2);
    assert!(components.iter().all(|c| c.len() == 4));
}

// ─────────────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_repeated_runs_identical() {
    let data = circle(48);
    let mut pipeline = MapperPipeline::new(circle_config()).unwrap();
    let reference = pipeline.fit_transform(&data).unwrap();

    for _ in 0..100 {
        let graph = pipeline.fit_transform(&data).unwrap();
        assert_eq!(graph.graph_hash, reference.graph_hash);
        assert_eq!(graph, reference);
    }
}

#[test]
fn test_executors_agree() {
    let data = circle(80);
    let config = circle_config().with_cover(CubicalCover::new(4, 0.3));
    let config = config.with_filters(vec![FilterFunction::Identity]);

    let sequential = run_with(config.clone(), Arc::new(SequentialExecutor), &data);
    let global = run_with(config.clone(), Arc::new(RayonExecutor::global()), &data);
    let pooled = run_with(config, Arc::new(RayonExecutor::with_threads(4).unwrap()), &data);

    assert!(sequential.node_count() > 0);
    assert_eq!(sequential.graph_hash, global.graph_hash);
    assert_eq!(sequential.graph_hash, pooled.graph_hash);
    assert_eq!(sequential, pooled);
}

#[test]
fn test_transform_matches_fit_transform_on_training_data() {
    let data = circle(60);
    let mut pipeline = MapperPipeline::new(circle_config()).unwrap();
    let fitted_graph = pipeline.fit_transform(&data).unwrap();

    assert_eq!(pipeline.transform(&data).unwrap(), fitted_graph);
}

#[test]
fn test_graph_hash_tracks_content() {
    let data = line(9);
    let a = MapperPipeline::new(MapperConfig::default().with_cover(OneDimensionalCover::new(3, 0.2)))
        .unwrap()
        .fit_transform(&data)
        .unwrap();
    let b = MapperPipeline::new(MapperConfig::default().with_cover(OneDimensionalCover::new(4, 0.2)))
        .unwrap()
        .fit_transform(&data)
        .unwrap();

    assert_eq!(a.graph_hash.len(), 16);
    assert_ne!(a.graph_hash, b.graph_hash);
}
