//! First-histogram-gap clustering.

use serde::{Deserialize, Serialize};

use super::{cap_clusters, validate_max_fraction, ClusterError, LocalClusterer};
use super::linkage::{labels_at_cut, single_linkage};
use crate::error::ConfigError;
use crate::filter::Metric;

/// Single linkage cut at the first sparse bin of the merge-distance
/// histogram.
///
/// Merge distances are binned into `n_bins_start` equal buckets spanning
/// `[d_min, d_max]`. The first bucket holding at most `freq_threshold`
/// distances marks the gap, and the cut sits at that bucket's lower edge:
/// merges at or above it are not applied, including the few merges inside
/// the sparse bucket itself. The bucket holding `d_min` is never a gap.
///
/// With `freq_threshold = 0` the sparse bucket is empty, so its lower and
/// upper edges give the same cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstHistogramGap {
    /// A bucket with this many distances or fewer counts as empty.
    #[serde(default)]
    pub freq_threshold: usize,
    /// Number of histogram buckets.
    #[serde(default = "default_n_bins_start")]
    pub n_bins_start: usize,
    /// Optional cap on the cluster count as a fraction of the subset size.
    #[serde(default)]
    pub max_fraction: Option<f64>,
    /// Distance between points.
    #[serde(default)]
    pub metric: Metric,
}

fn default_n_bins_start() -> usize {
    5
}

impl Default for FirstHistogramGap {
    fn default() -> Self {
        Self {
            freq_threshold: 0,
            n_bins_start: default_n_bins_start(),
            max_fraction: None,
            metric: Metric::default(),
        }
    }
}

impl FirstHistogramGap {
    /// Create with the given threshold and bucket count.
    pub fn new(freq_threshold: usize, n_bins_start: usize) -> Self {
        Self {
            freq_threshold,
            n_bins_start,
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
        let (Some(&d_min), Some(&d_max)) = (distances.first(), distances.last()) else {
            return 0;
        };
        if d_min == d_max {
            return distances.len();
        }

        let bins = self.n_bins_start;
        let width = (d_max - d_min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for &d in distances {
            let bin = (((d - d_min) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }

        let max_clusters = cap_clusters(self.max_fraction, n_points);
        counts
            .iter()
            .enumerate()
            .skip(1)
            .filter(|&(_, &count)| count <= self.freq_threshold)
            .map(|(bin, _)| {
                let edge = d_min + bin as f64 * width;
                distances.partition_point(|&d| d < edge)
            })
            .find(|&applied| n_points - applied <= max_clusters)
            .unwrap_or(distances.len())
    }
}

impl LocalClusterer for FirstHistogramGap {
    fn name(&self) -> &str {
        "first_histogram_gap"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.n_bins_start < 1 {
            return Err(ConfigError::invalid("n_bins_start", "must be at least 1"));
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
