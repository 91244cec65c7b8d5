//! Eccentricity lens: how far each point sits from the rest of the cloud.

use serde::{Deserialize, Serialize};

use super::{Filter, Metric};
use crate::error::{ConfigError, MapperError};
use crate::types::{Dataset, Matrix};

/// Exponent of the norm aggregating a point's distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exponent {
    /// p-norm with finite `p >= 1`.
    Finite(f64),
    /// Maximum distance.
    Infinity,
}

impl Default for Exponent {
    fn default() -> Self {
        Self::Finite(2.0)
    }
}

/// For each point, the p-norm of its distances to every point of the dataset.
///
/// Needs the full distance matrix row by row, so cost is O(N^2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Eccentricity {
    /// Norm exponent.
    #[serde(default)]
    pub exponent: Exponent,
    /// Point-to-point metric.
    #[serde(default)]
    pub metric: Metric,
}

impl Eccentricity {
    /// Create an eccentricity lens.
    pub fn new(exponent: Exponent, metric: Metric) -> Self {
        Self { exponent, metric }
    }

    fn aggregate(&self, distances: &[f64]) -> f64 {
        match self.exponent {
            Exponent::Infinity => distances.iter().copied().fold(0.0, f64::max),
            Exponent::Finite(p) => distances.iter().map(|d| d.powf(p)).sum::<f64>().powf(1.0 / p),
        }
    }
}

impl Filter for Eccentricity {
    fn name(&self) -> &str {
        "eccentricity"
    }

    fn validate_params(&self) -> Result<(), ConfigError> {
        match self.exponent {
            Exponent::Finite(p) if !(p.is_finite() && p >= 1.0) => Err(ConfigError::invalid(
                "exponent",
                format!("must be a finite value >= 1 or infinity, got {p}"),
            )),
            _ => Ok(()),
        }
    }

    fn apply(&self, data: &Dataset) -> Result<Matrix, MapperError> {
        let points: Vec<&[f64]> = data.rows().collect();
        let values: Vec<f64> = (0..points.len())
            .map(|i| self.aggregate(&self.metric.distances_from(&points, i)))
            .collect();
        Ok(Matrix::column_vector(values)?)
    }
}
