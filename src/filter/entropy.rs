//! Entropy lens over local distance distributions.

use serde::{Deserialize, Serialize};

use super::{Filter, Metric};
use crate::error::{ConfigError, MapperError};
use crate::types::{Dataset, Matrix};

/// For each point, the Shannon entropy (natural log) of the distances to its
/// neighbours within `radius`, normalised into a probability distribution.
///
/// Coincident points (distance 0) carry no mass. A point with no neighbour in
/// range scores 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entropy {
    /// Neighbourhood radius (inclusive).
    pub radius: f64,
    /// Point-to-point metric.
    #[serde(default)]
    pub metric: Metric,
}

impl Entropy {
    /// Create an entropy lens.
    pub fn new(radius: f64, metric: Metric) -> Self {
        Self { radius, metric }
    }

    fn score(&self, distances: &[f64]) -> f64 {
        let neighbourhood: Vec<f64> = distances
            .iter()
            .copied()
            .filter(|&d| d > 0.0 && d <= self.radius)
            .collect();
        let total: f64 = neighbourhood.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }

        -neighbourhood
            .iter()
            .map(|d| {
                let p = d / total;
                p * p.ln()
            })
            .sum::<f64>()
    }
}

impl Default for Entropy {
    fn default() -> Self {
        Self::new(1.0, Metric::Euclidean)
    }
}

impl Filter for Entropy {
    fn name(&self) -> &str {
        "entropy"
    }

    fn validate_params(&self) -> Result<(), ConfigError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::invalid(
                "radius",
                format!("must be finite and positive, got {}", self.radius),
            ));
        }
        Ok(())
    }

    fn apply(&self, data: &Dataset) -> Result<Matrix, MapperError> {
        let points: Vec<&[f64]> = data.rows().collect();
        let values: Vec<f64> = (0..points.len())
            .map(|i| self.score(&self.metric.distances_from(&points, i)))
            .collect();
        Ok(Matrix::column_vector(values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_point_scores_zero() {
        let data = Matrix::from_rows(vec![vec![0.0], vec![0.5], vec![100.0]]).unwrap();
        let lens = Entropy::new(1.0, Metric::Euclidean).apply(&data).unwrap();

        assert_eq!(lens.get(2, 0), 0.0);
        // One neighbour: a single-outcome distribution has zero entropy.
        assert_eq!(lens.get(0, 0), 0.0);
    }

    #[test]
    fn test_uniform_neighbourhood_is_log_n() {
        // Center point with four neighbours at equal distance.
        let data = Matrix::from_rows(vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![-1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, -1.0],
        ])
        .unwrap();
        let lens = Entropy::new(1.0, Metric::Euclidean).apply(&data).unwrap();
        assert!((lens.get(0, 0) - 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_duplicates_carry_no_mass() {
        let data = Matrix::from_rows(vec![vec![1.0], vec![1.0], vec![1.0]]).unwrap();
        let lens = Entropy::default().apply(&data).unwrap();
        assert_eq!(lens.column(0), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        assert!(Entropy::new(0.0, Metric::Euclidean).validate_params().is_err());
        assert!(Entropy::new(f64::INFINITY, Metric::Euclidean).validate_params().is_err());
    }
}
