//! Nerve construction: merge per-cover-set clusters into the Mapper graph.
//!
//! Every non-empty local cluster becomes a node. Two nodes are joined when
//! their point sets share at least `min_intersection` points, the edge
//! weight being the exact number of shared points. Shared points are found
//! through an inverted index (point -> nodes containing it), so the work is
//! proportional to the total membership rather than to the square of the
//! node count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, MapperError};
use crate::types::{group_by_label, Cluster, CoverSet, MapperGraph, MapperNode, NerveEdge};

/// Graph assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nerve {
    /// Minimum number of shared points for an edge.
    pub min_intersection: usize,
}

impl Nerve {
    /// Create an assembler with the default threshold of one shared point.
    pub fn new() -> Self {
        Self { min_intersection: 1 }
    }

    /// Create an assembler with a custom threshold.
    pub fn with_min_intersection(min_intersection: usize) -> Self {
        Self { min_intersection }
    }

    /// Check the threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_intersection < 1 {
            return Err(ConfigError::invalid("min_intersection", "must be at least 1"));
        }
        Ok(())
    }

    /// Build the graph from cover sets and the labels of their members.
    ///
    /// `labels[k][m]` is the local cluster of `cover_sets[k].members[m]`.
    pub fn assemble(&self, cover_sets: &[CoverSet], labels: &[Vec<usize>]) -> Result<MapperGraph, MapperError> {
        let clusters = clusters_of(cover_sets, labels)?;
        Ok(self.from_clusters(&clusters))
    }

    /// Same graph as [`Nerve::assemble`], computed by intersecting every
    /// pair of clusters.
    pub fn assemble_pairwise(&self, cover_sets: &[CoverSet], labels: &[Vec<usize>]) -> Result<MapperGraph, MapperError> {
        let clusters = clusters_of(cover_sets, labels)?;
        Ok(self.from_clusters_pairwise(&clusters))
    }

    /// Build the graph from clusters given in `(cover_set, local_cluster)`
    /// order.
    pub fn from_clusters(&self, clusters: &[Cluster]) -> MapperGraph {
        let nodes = nodes_of(clusters);

        // point -> ids of the nodes holding it, ascending
        let mut index: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for node in &nodes {
            for &p in &node.points {
                index.entry(p).or_default().push(node.id);
            }
        }

        let mut shared: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for holders in index.values() {
            for (i, &a) in holders.iter().enumerate() {
                for &b in &holders[i + 1..] {
                    *shared.entry((a, b)).or_default() += 1;
                }
            }
        }

        let edges = self.edges_from(shared);
        debug!(nodes = nodes.len(), edges = edges.len(), points = index.len(), "nerve assembled");
        MapperGraph::new(nodes, edges, self.min_intersection)
    }

    /// Build the graph by intersecting every pair of clusters.
    pub fn from_clusters_pairwise(&self, clusters: &[Cluster]) -> MapperGraph {
        let nodes = nodes_of(clusters);

        let mut shared = BTreeMap::new();
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let count = intersection_size(&nodes[i].points, &nodes[j].points);
                if count > 0 {
                    shared.insert((i, j), count);
                }
            }
        }

        let edges = self.edges_from(shared);
        MapperGraph::new(nodes, edges, self.min_intersection)
    }

    fn edges_from(&self, shared: BTreeMap<(usize, usize), usize>) -> Vec<NerveEdge> {
        shared
            .into_iter()
            .filter(|&(_, weight)| weight >= self.min_intersection)
            .map(|((a, b), weight)| NerveEdge::new(a, b, weight))
            .collect()
    }
}

impl Default for Nerve {
    fn default() -> Self {
        Self::new()
    }
}

/// Group cover-set members into clusters, in cover-set then label order.
pub fn clusters_of(cover_sets: &[CoverSet], labels: &[Vec<usize>]) -> Result<Vec<Cluster>, MapperError> {
    if cover_sets.len() != labels.len() {
        return Err(MapperError::DimensionMismatch {
            what: "label vectors",
            expected: cover_sets.len(),
            found: labels.len(),
        });
    }

    let mut clusters = Vec::new();
    for (set, set_labels) in cover_sets.iter().zip(labels) {
        if set_labels.len() != set.len() {
            return Err(MapperError::DimensionMismatch {
                what: "cover set labels",
                expected: set.len(),
                found: set_labels.len(),
            });
        }
        clusters.extend(group_by_label(set.index, &set.members, set_labels));
    }
    Ok(clusters)
}

fn nodes_of(clusters: &[Cluster]) -> Vec<MapperNode> {
    clusters
        .iter()
        .filter(|c| !c.points.is_empty())
        .enumerate()
        .map(|(id, c)| MapperNode {
            id,
            cover_set: c.cover_set,
            local_cluster: c.local_cluster,
            points: c.points.clone(),
            size: c.size(),
        })
        .collect()
}

/// Size of the intersection of two ascending index lists.
fn intersection_size(a: &[usize], b: &[usize]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}
