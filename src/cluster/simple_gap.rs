//! First-simple-gap clustering.

use serde::{Deserialize, Serialize};

use super::{cap_clusters, validate_max_fraction, ClusterError, LocalClusterer};
use super::linkage::{labels_at_cut, single_linkage};
use crate::error::ConfigError;
use crate::filter::Metric;

/// Single linkage cut at the first large jump between consecutive merge
/// distances.
///
/// With merge distances `d_0 <= ... <= d_{n-2}`, merge `i >= 1` is a gap when
/// `d_i - d_{i-1} > relative_gap_size * d_max`. Merges before the first gap
/// are applied, leaving `n - i` clusters. Without a gap all points form one
/// cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstSimpleGap {
    /// Minimum jump, as a fraction of the largest merge distance.
    #[serde(default = "default_relative_gap_size")]
    pub relative_gap_size: f64,
    /// Optional cap on the cluster count as a fraction of the subset size.
    #[serde(default)]
    pub max_fraction: Option<f64>,
    /// Distance between points.
    #[serde(default)]
    pub metric: Metric,
}

fn default_relative_gap_size() -> f64 {
    0.3
}

impl Default for FirstSimpleGap {
    fn default() -> Self {
        Self {
            relative_gap_size: default_relative_gap_size(),
            max_fraction: None,
            metric: Metric::default(),
        }
    }
}

impl FirstSimpleGap {
    /// Create with the given relative gap size.
    pub fn new(relative_gap_size: f64) -> Self {
        Self {
            relative_gap_size,
            ..Self::default()
        }
    }

    /// Cap the cluster count at `floor(max_fraction * n)`.
    pub fn with_max_fraction(mut self, max_fraction: f64) -> Self {
        self.max_fraction = Some(max_fraction);
        self
    }

    /// Use a different metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Number of leading merges to apply for sorted merge distances over
    /// `n_points` points.
    pub fn cut(&self, distances: &[f64], n_points: usize) -> usize {
        let Some(&d_max) = distances.last() else {
            return 0;
        };
        let max_clusters = cap_clusters(self.max_fraction, n_points);
        let threshold = self.relative_gap_size * d_max;

        (1..distances.len())
            .find(|&i| distances[i] - distances[i - 1] > threshold && n_points - i <= max_clusters)
            .unwrap_or(distances.len())
    }
}

impl LocalClusterer for FirstSimpleGap {
    fn name(&self) -> &str {
        "first_simple_gap"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.relative_gap_size.is_finite() && self.relative_gap_size > 0.0) {
            return Err(ConfigError::invalid(
                "relative_gap_size",
                format!("must be finite and > 0, got {}", self.relative_gap_size),
            ));
        }
        validate_max_fraction(self.max_fraction)
    }

    fn fit_predict(&self, points: &[&[f64]]) -> Result<Vec<usize>, ClusterError> {
        match points.len() {
            0 => return Ok(Vec::new()),
            1 => return Ok(vec![0]),
            _ => {}
        }
        super::check_points(points)?;

        let merges = single_linkage(points, self.metric);
        let distances: Vec<f64> = merges.iter().map(|m| m.distance).collect();
        let applied = self.cut(&distances, points.len());
        Ok(labels_at_cut(points.len(), &merges, applied))
    }
}
