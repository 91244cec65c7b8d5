//! Inputs for drawing a Mapper graph.
//!
//! Rendering itself lives outside this crate behind [`GraphRenderer`]; the
//! helpers here summarise per-point values onto nodes so that a renderer
//! only deals with the graph.

use serde::{Deserialize, Serialize};

use crate::error::MapperError;
use crate::types::MapperGraph;

/// Draws a Mapper graph.
pub trait GraphRenderer {
    /// Rendered artifact (SVG text, a figure handle, ...).
    type Output;

    /// Render `graph`, colouring nodes by `point_colors` when given.
    ///
    /// `point_colors[i]` is the colour value of point `i` of the dataset the
    /// graph was built from.
    fn render(&self, graph: &MapperGraph, point_colors: Option<&[f64]>) -> Result<Self::Output, MapperError>;
}

/// Per-node view handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    /// Node id.
    pub id: usize,
    /// Cover set of the node.
    pub cover_set: usize,
    /// Number of points.
    pub size: usize,
    /// Number of incident edges.
    pub degree: usize,
    /// Mean colour of the node's points, if colours were given.
    pub color: Option<f64>,
}

/// Mean of `point_colors` over each node's points, in node order.
pub fn node_color_values(graph: &MapperGraph, point_colors: &[f64]) -> Result<Vec<f64>, MapperError> {
    graph
        .nodes
        .iter()
        .map(|node| -> Result<f64, MapperError> {
            let mut sum = 0.0;
            for &p in &node.points {
                sum += *point_colors.get(p).ok_or(MapperError::DimensionMismatch {
                    what: "point colors",
                    expected: p + 1,
                    found: point_colors.len(),
                })?;
            }
            Ok(sum / node.size as f64)
        })
        .collect()
}

/// How many nodes contain each of the first `n_points` points.
///
/// Points in no node (e.g. from an empty cover cell) count 0.
pub fn point_multiplicity(graph: &MapperGraph, n_points: usize) -> Vec<usize> {
    let mut counts = vec![0; n_points];
    for node in &graph.nodes {
        for &p in &node.points {
            if let Some(c) = counts.get_mut(p) {
                *c += 1;
            }
        }
    }
    counts
}

/// Summaries of every node, with mean colours when `point_colors` is given.
pub fn node_summaries(graph: &MapperGraph, point_colors: Option<&[f64]>) -> Result<Vec<NodeSummary>, MapperError> {
    let colors = point_colors
        .map(|c| node_color_values(graph, c))
        .transpose()?;

    Ok(graph
        .nodes
        .iter()
        .map(|node| NodeSummary {
            id: node.id,
            cover_set: node.cover_set,
            size: node.size,
            degree: graph.degree(node.id),
            color: colors.as_ref().map(|c| c[node.id]),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MapperNode, NerveEdge};

    fn graph() -> MapperGraph {
        let node = |id, cover_set, points: Vec<usize>| MapperNode {
            id,
            cover_set,
            local_cluster: 0,
            size: points.len(),
            points,
        };
        MapperGraph::new(
            vec![node(0, 0, vec![0, 1, 2]), node(1, 1, vec![2, 3])],
            vec![NerveEdge::new(0, 1, 1)],
            1,
        )
    }

    /// Renders a one-line-per-node text listing.
    struct TextRenderer;

    impl GraphRenderer for TextRenderer {
        type Output = String;

        fn render(&self, graph: &MapperGraph, point_colors: Option<&[f64]>) -> Result<String, MapperError> {
            let lines: Vec<String> = node_summaries(graph, point_colors)?
                .iter()
                .map(|s| format!("{} size={} degree={} color={:?}", s.id, s.size, s.degree, s.color))
                .collect();
            Ok(lines.join("\n"))
        }
    }

    #[test]
    fn test_node_colors_are_means() {
        let colors = node_color_values(&graph(), &[0.0, 3.0, 6.0, 10.0]).unwrap();
        assert_eq!(colors, vec![3.0, 8.0]);
    }

    #[test]
    fn test_short_color_vector_is_an_error() {
        assert!(node_color_values(&graph(), &[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_point_multiplicity() {
        assert_eq!(point_multiplicity(&graph(), 5), vec![1, 1, 2, 1, 0]);
    }

    #[test]
    fn test_renderer_receives_summaries() {
        let text = TextRenderer.render(&graph(), None).unwrap();
        assert_eq!(text, "0 size=3 degree=1 color=None\n1 size=2 degree=1 color=None");
    }
}
