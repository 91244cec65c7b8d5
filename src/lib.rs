//! # mapper-kernel
//!
//! Deterministic Mapper graphs for point clouds.
//!
//! Mapper summarises a high-dimensional dataset as a graph:
//!
//! > Points that look alike under a lens, and that are close in the original
//! > space, end up in the same node; nodes that share points are joined.
//!
//! ## Core Contract
//!
//! 1. Map every point through one or more filter functions (the lens)
//! 2. Cover the lens range with overlapping regions
//! 3. Cluster the points of each region independently
//! 4. Join clusters sharing points into a graph with a stable content hash
//!
//! ## Architecture
//!
//! ```text
//! Dataset → Filters ─fan-out→ Lens → Cover → CoverSets ─fan-out→ LocalClusterer
//!                                                                      ↓
//!                                      MapperGraph ← Nerve ←─fan-in── Labels
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same data + same config → identical `graph_hash`, whatever the executor
//! - Nodes are ordered by (cover set, local cluster)
//! - Edges are ordered by (source, target) with source < target

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod canonical;
pub mod filter;
pub mod cover;
pub mod cluster;
pub mod executor;
pub mod nerve;
pub mod pipeline;
pub mod visualization;

// Re-exports
pub use types::{Cluster, CoverSet, Dataset, Interval, MapperGraph, MapperNode, Matrix, NerveEdge};
pub use error::{ConfigError, MapperError};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
pub use filter::{
    compute_lens, CallableFilter, Eccentricity, Entropy, Exponent, Filter, FilterFunction,
    Metric, Projection,
};
pub use cover::{Cover, CoverKind, CubicalCover, FittedCover, OneDimensionalCover};
pub use cluster::{ClusterError, Clusterer, FirstHistogramGap, FirstSimpleGap, LocalClusterer};
pub use executor::{
    executor_for, Branch, BranchExecutor, BranchOutput, BranchOutputs, RayonExecutor,
    SequentialExecutor,
};
pub use nerve::Nerve;
pub use pipeline::{FittedMapper, MapperConfig, MapperPipeline, PipelineStage};
pub use visualization::{node_color_values, node_summaries, point_multiplicity, GraphRenderer, NodeSummary};

/// Schema version of persisted fitted state and graphs.
/// Increment on breaking changes to any serialized type.
pub const MAPPER_SCHEMA_VERSION: &str = "1.0.0";
