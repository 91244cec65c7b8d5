//! Cover generators: overlapping regions of lens space.
//!
//! A cover is fitted once (interval bounds per lens dimension) and then
//! applied to lens values to produce [`CoverSet`]s. Fitted bounds are plain
//! data and can be persisted for reproducible `transform` calls.

pub mod one_dimensional;
pub mod cubical;

pub use one_dimensional::{CoverKind, OneDimensionalCover};
pub use cubical::CubicalCover;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::canonical::quantize_float;
use crate::error::{ConfigError, MapperError};
use crate::types::{CoverSet, Interval, Matrix};

/// Cover configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cover {
    /// Intervals over a single lens column.
    OneDimensional(OneDimensionalCover),
    /// Hyperrectangles over every lens column.
    Cubical(CubicalCover),
}

impl Cover {
    /// Check `n_intervals` and `overlap_frac`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::OneDimensional(c) => c.validate(),
            Self::Cubical(c) => c.validate(),
        }
    }

    /// Number of intervals per dimension.
    pub fn n_intervals(&self) -> usize {
        match self {
            Self::OneDimensional(c) => c.n_intervals,
            Self::Cubical(c) => c.n_intervals,
        }
    }

    /// Overlap fraction.
    pub fn overlap_frac(&self) -> f64 {
        match self {
            Self::OneDimensional(c) => c.overlap_frac,
            Self::Cubical(c) => c.overlap_frac,
        }
    }

    /// Fit interval bounds to the lens.
    pub fn fit(&self, lens: &Matrix) -> Result<FittedCover, MapperError> {
        match self {
            Self::OneDimensional(c) => c.fit(lens),
            Self::Cubical(c) => c.fit(lens),
        }
    }

    /// Fit and assign in one pass.
    pub fn fit_transform(&self, lens: &Matrix) -> Result<Vec<CoverSet>, MapperError> {
        self.fit(lens)?.transform(lens)
    }
}

impl Default for Cover {
    fn default() -> Self {
        Self::OneDimensional(OneDimensionalCover::default())
    }
}

impl From<OneDimensionalCover> for Cover {
    fn from(c: OneDimensionalCover) -> Self {
        Self::OneDimensional(c)
    }
}

impl From<CubicalCover> for Cover {
    fn from(c: CubicalCover) -> Self {
        Self::Cubical(c)
    }
}

/// Interval bounds fitted to a lens, one list per lens dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCover {
    /// Intervals of each lens dimension, in ascending order.
    pub dimensions: Vec<Vec<Interval>>,
}

impl FittedCover {
    /// Wrap per-dimension intervals.
    pub fn new(dimensions: Vec<Vec<Interval>>) -> Self {
        Self { dimensions }
    }

    /// Number of lens dimensions the cover expects.
    pub fn n_dimensions(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of grid cells (product of per-dimension interval counts).
    pub fn n_cells(&self) -> usize {
        self.dimensions.iter().map(Vec::len).product()
    }

    /// Assign points to cover sets.
    ///
    /// Sets are returned in grid order (first dimension slowest) and only
    /// when non-empty.
    pub fn transform(&self, lens: &Matrix) -> Result<Vec<CoverSet>, MapperError> {
        if lens.n_cols() != self.n_dimensions() {
            return Err(MapperError::DimensionMismatch {
                what: "lens columns",
                expected: self.n_dimensions(),
                found: lens.n_cols(),
            });
        }
        if self.n_dimensions() == 0 || self.n_cells() == 0 {
            return Ok(Vec::new());
        }

        let mut cells: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (point, values) in lens.rows().enumerate() {
            let per_dim: Vec<Vec<usize>> = self
                .dimensions
                .iter()
                .zip(values)
                .map(|(intervals, &v)| {
                    intervals
                        .iter()
                        .enumerate()
                        .filter(|(_, interval)| interval.contains(v))
                        .map(|(k, _)| k)
                        .collect()
                })
                .collect();

            for cell in self.cells_of(&per_dim) {
                cells.entry(cell).or_default().push(point);
            }
        }

        Ok(cells
            .into_iter()
            .map(|(index, members)| CoverSet::new(index, self.bounds_of(index), members))
            .collect())
    }

    /// Grid indices of the Cartesian product of per-dimension memberships.
    fn cells_of(&self, per_dim: &[Vec<usize>]) -> Vec<usize> {
        let mut cells = vec![0usize];
        for (intervals, hits) in self.dimensions.iter().zip(per_dim) {
            cells = cells
                .iter()
                .flat_map(|&prefix| hits.iter().map(move |&k| prefix * intervals.len() + k))
                .collect();
        }
        cells
    }

    /// Per-dimension bounds of a grid cell.
    fn bounds_of(&self, mut index: usize) -> Vec<Interval> {
        let mut bounds = Vec::with_capacity(self.dimensions.len());
        for intervals in self.dimensions.iter().rev() {
            bounds.push(intervals[index % intervals.len()]);
            index /= intervals.len();
        }
        bounds.reverse();
        bounds
    }

    /// Quantized bounds for hashing.
    pub(crate) fn quantized(&self) -> Vec<Vec<(i64, i64, bool, bool)>> {
        self.dimensions
            .iter()
            .map(|intervals| {
                intervals
                    .iter()
                    .map(|i| {
                        (
                            quantize_float(i.lower),
                            quantize_float(i.upper),
                            i.unbounded_below,
                            i.unbounded_above,
                        )
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_value_is_covered() {
        let values: Vec<f64> = vec![0.3, -2.0, 7.5, 7.5, 1.0, 4.2, -2.0];
        let lens = Matrix::column_vector(values.clone()).unwrap();

        for overlap in [0.0, 0.1, 0.5, 0.9] {
            for n in 1..8 {
                let sets = Cover::from(OneDimensionalCover::new(n, overlap)).fit_transform(&lens).unwrap();
                for point in 0..values.len() {
                    assert!(
                        sets.iter().any(|s| s.contains(point)),
                        "point {point} uncovered (n={n}, overlap={overlap})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_transform_checks_dimensions() {
        let fitted = FittedCover::new(vec![vec![Interval::whole(0.0, 1.0)]]);
        let lens = Matrix::from_rows(vec![vec![0.0, 0.0]]).unwrap();
        assert!(matches!(
            fitted.transform(&lens),
            Err(MapperError::DimensionMismatch { expected: 1, found: 2, .. })
        ));
    }

    #[test]
    fn test_bounds_roundtrip_through_json() {
        let lens = Matrix::column_vector((0..10).map(|i| i as f64).collect()).unwrap();
        let fitted = Cover::default().fit(&lens).unwrap();

        let json = serde_json::to_string(&fitted).unwrap();
        let restored: FittedCover = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.transform(&lens).unwrap(), fitted.transform(&lens).unwrap());
    }

    #[test]
    fn test_empty_lens_fits_no_intervals() {
        let lens = Matrix::from_vec(vec![], 0, 1).unwrap();
        let fitted = Cover::default().fit(&lens).unwrap();
        assert_eq!(fitted.n_cells(), 0);
        assert!(fitted.transform(&lens).unwrap().is_empty());
    }
}
