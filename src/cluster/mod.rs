//! Local clustering inside a cover set.
//!
//! Both clusterers build the single-linkage hierarchy of the subset and cut
//! it automatically, so the number of clusters per cover set is decided by
//! the data rather than configured.

pub mod linkage;
pub mod simple_gap;
pub mod histogram_gap;

pub use linkage::{labels_at_cut, single_linkage, Merge, UnionFind};
pub use simple_gap::FirstSimpleGap;
pub use histogram_gap::FirstHistogramGap;

use serde::{Deserialize, Serialize};

use crate::canonical::quantize_float;
use crate::error::ConfigError;

/// Failure while clustering one subset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClusterError {
    /// Points of one subset do not share a width.
    #[error("point {index} has {found} coordinates, expected {expected}")]
    RaggedPoints {
        /// Position within the subset.
        index: usize,
        /// Width of the first point.
        expected: usize,
        /// Width of the offending point.
        found: usize,
    },
    /// A coordinate is NaN or infinite.
    #[error("point {index} has a non-finite coordinate")]
    NonFinite {
        /// Position within the subset.
        index: usize,
    },
}

/// Assigns cluster labels to a subset of points.
pub trait LocalClusterer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Check parameters before any computation.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Label each point, `0..k` in order of first appearance.
    ///
    /// An empty subset has no labels; a single point is its own cluster.
    fn fit_predict(&self, points: &[&[f64]]) -> Result<Vec<usize>, ClusterError>;
}

/// Clusterer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Clusterer {
    /// Cut at the first large jump in merge distances.
    FirstSimpleGap(FirstSimpleGap),
    /// Cut at the first sparse bucket of the merge-distance histogram.
    FirstHistogramGap(FirstHistogramGap),
}

impl Default for Clusterer {
    fn default() -> Self {
        Self::FirstSimpleGap(FirstSimpleGap::default())
    }
}

impl From<FirstSimpleGap> for Clusterer {
    fn from(c: FirstSimpleGap) -> Self {
        Self::FirstSimpleGap(c)
    }
}

impl From<FirstHistogramGap> for Clusterer {
    fn from(c: FirstHistogramGap) -> Self {
        Self::FirstHistogramGap(c)
    }
}

impl Clusterer {
    fn inner(&self) -> &dyn LocalClusterer {
        match self {
            Self::FirstSimpleGap(c) => c,
            Self::FirstHistogramGap(c) => c,
        }
    }

    /// Parameters with floats quantized, for hashing.
    pub(crate) fn quantized(&self) -> (String, Vec<i64>) {
        let fraction = |f: Option<f64>| f.map_or(-1, quantize_float);
        match self {
            Self::FirstSimpleGap(c) => (
                format!("first_simple_gap/{}", c.metric),
                vec![quantize_float(c.relative_gap_size), fraction(c.max_fraction)],
            ),
            Self::FirstHistogramGap(c) => (
                format!("first_histogram_gap/{}", c.metric),
                vec![
                    c.freq_threshold as i64,
                    c.n_bins_start as i64,
                    fraction(c.max_fraction),
                ],
            ),
        }
    }
}

impl LocalClusterer for Clusterer {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.inner().validate()
    }

    fn fit_predict(&self, points: &[&[f64]]) -> Result<Vec<usize>, ClusterError> {
        self.inner().fit_predict(points)
    }
}

/// Largest cluster count allowed for `n_points` points.
pub(crate) fn cap_clusters(max_fraction: Option<f64>, n_points: usize) -> usize {
    match max_fraction {
        Some(f) => ((f * n_points as f64).floor() as usize).max(1),
        None => n_points,
    }
}

pub(crate) fn validate_max_fraction(max_fraction: Option<f64>) -> Result<(), ConfigError> {
    match max_fraction {
        Some(f) if !(f > 0.0 && f <= 1.0) => Err(ConfigError::invalid(
            "max_fraction",
            format!("must lie in (0, 1], got {f}"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn check_points(points: &[&[f64]]) -> Result<(), ClusterError> {
    let expected = points.first().map_or(0, |p| p.len());
    for (index, p) in points.iter().enumerate() {
        if p.len() != expected {
            return Err(ClusterError::RaggedPoints {
                index,
                expected,
                found: p.len(),
            });
        }
        if p.iter().any(|v| !v.is_finite()) {
            return Err(ClusterError::NonFinite { index });
        }
    }
    Ok(())
}
