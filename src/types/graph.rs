//! The Mapper graph: local clusters joined by shared points.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::canonical::canonical_hash_hex;

/// A node of the Mapper graph: one non-empty local cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperNode {
    /// Node identifier, equal to the node's position in [`MapperGraph::nodes`].
    pub id: usize,
    /// Cover set the cluster was found in.
    pub cover_set: usize,
    /// Local cluster label within the cover set.
    pub local_cluster: usize,
    /// Point indices of the cluster, ascending.
    pub points: Vec<usize>,
    /// Number of points.
    pub size: usize,
}

/// An undirected edge between two nodes sharing points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NerveEdge {
    /// Smaller node id.
    pub source: usize,
    /// Larger node id.
    pub target: usize,
    /// Number of shared points.
    pub weight: usize,
}

impl NerveEdge {
    /// Create a new edge with canonical endpoint ordering.
    pub fn new(a: usize, b: usize, weight: usize) -> Self {
        let (source, target) = if a < b { (a, b) } else { (b, a) };
        Self { source, target, weight }
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint.
    pub fn other(&self, node: usize) -> Option<usize> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}

/// The complete Mapper graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperGraph {
    /// Nodes ordered by `(cover_set, local_cluster)`.
    pub nodes: Vec<MapperNode>,
    /// Edges ordered by `(source, target)`.
    pub edges: Vec<NerveEdge>,
    /// Minimum shared-point count used when building edges.
    pub min_intersection: usize,
    /// Content hash of nodes and edges.
    pub graph_hash: String,
}

impl MapperGraph {
    /// Create a graph, sorting edges and computing the content hash.
    pub fn new(nodes: Vec<MapperNode>, mut edges: Vec<NerveEdge>, min_intersection: usize) -> Self {
        edges.sort();
        let graph_hash = canonical_hash_hex(&(&nodes, &edges, min_intersection));
        Self {
            nodes,
            edges,
            min_intersection,
            graph_hash,
        }
    }

    /// Graph with no nodes.
    pub fn empty(min_intersection: usize) -> Self {
        Self::new(Vec::new(), Vec::new(), min_intersection)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get a node by id.
    pub fn node(&self, id: usize) -> Option<&MapperNode> {
        self.nodes.get(id)
    }

    /// Get the edge between two nodes, in either order.
    pub fn edge(&self, a: usize, b: usize) -> Option<&NerveEdge> {
        let (source, target) = if a < b { (a, b) } else { (b, a) };
        self.edges
            .binary_search_by(|e| (e.source, e.target).cmp(&(source, target)))
            .ok()
            .map(|i| &self.edges[i])
    }

    /// Get all edges touching a node.
    pub fn edges_for_node(&self, id: usize) -> Vec<&NerveEdge> {
        self.edges
            .iter()
            .filter(|e| e.source == id || e.target == id)
            .collect()
    }

    /// Get the neighbor node ids of a node, ascending.
    pub fn neighbors(&self, id: usize) -> Vec<usize> {
        let mut neighbors: Vec<usize> = self
            .edges
            .iter()
            .filter_map(|e| e.other(id))
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// Number of edges touching a node.
    pub fn degree(&self, id: usize) -> usize {
        self.edges
            .iter()
            .filter(|e| e.source == id || e.target == id)
            .count()
    }

    /// Nodes with at least `min_degree` edges, by degree descending then id.
    pub fn hub_nodes(&self, min_degree: usize) -> Vec<(usize, usize)> {
        let mut degrees: BTreeMap<usize, usize> = BTreeMap::new();

        for edge in &self.edges {
            *degrees.entry(edge.source).or_default() += 1;
            *degrees.entry(edge.target).or_default() += 1;
        }

        let mut hubs: Vec<_> = degrees
            .into_iter()
            .filter(|(_, d)| *d >= min_degree)
            .collect();

        // Stable sort keeps ascending id among equal degrees.
        hubs.sort_by(|a, b| b.1.cmp(&a.1));
        hubs
    }

    /// Nodes of one cover set.
    pub fn nodes_in_cover_set(&self, cover_set: usize) -> Vec<&MapperNode> {
        self.nodes.iter().filter(|n| n.cover_set == cover_set).collect()
    }

    /// Connected components as sorted node-id lists, ordered by smallest id.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut parent: Vec<usize> = (0..self.nodes.len()).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        for edge in &self.edges {
            let a = find(&mut parent, edge.source);
            let b = find(&mut parent, edge.target);
            if a != b {
                let (root, child) = if a < b { (a, b) } else { (b, a) };
                parent[child] = root;
            }
        }

        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for id in 0..self.nodes.len() {
            let root = find(&mut parent, id);
            components.entry(root).or_default().push(id);
        }
        components.into_values().collect()
    }
}
