//! Core data types for Mapper runs.

pub mod matrix;
pub mod cover_set;
pub mod cluster;
pub mod graph;

pub use matrix::{Dataset, Matrix};
pub use cover_set::{CoverSet, Interval};
pub use cluster::{group_by_label, Cluster};
pub use graph::{MapperGraph, MapperNode, NerveEdge};
