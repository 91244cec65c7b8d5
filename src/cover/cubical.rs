//! Cubical cover: product of one-dimensional covers across lens columns.

use serde::{Deserialize, Serialize};

use super::{CoverKind, FittedCover, OneDimensionalCover};
use crate::error::{ConfigError, MapperError};
use crate::types::{CoverSet, Matrix};

/// Applies the same one-dimensional cover to every lens column and takes the
/// Cartesian product of the intervals.
///
/// A point belongs to a hyperrectangle iff it lies in the matching interval
/// of every dimension. The number of cells is `n_intervals ^ d`; cells that
/// receive no point produce no cover set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubicalCover {
    /// Intervals per dimension, at least 1.
    pub n_intervals: usize,
    /// Overlap fraction per dimension, in `[0, 1)`.
    pub overlap_frac: f64,
    /// Boundary placement per dimension.
    #[serde(default)]
    pub kind: CoverKind,
}

impl CubicalCover {
    /// Create a uniform cubical cover.
    pub fn new(n_intervals: usize, overlap_frac: f64) -> Self {
        Self {
            n_intervals,
            overlap_frac,
            kind: CoverKind::Uniform,
        }
    }

    /// Use a different boundary placement.
    pub fn with_kind(mut self, kind: CoverKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check `n_intervals` and `overlap_frac`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.axis().validate()
    }

    fn axis(&self) -> OneDimensionalCover {
        OneDimensionalCover::new(self.n_intervals, self.overlap_frac).with_kind(self.kind)
    }

    /// Fit one interval list per lens column.
    pub fn fit(&self, lens: &Matrix) -> Result<FittedCover, MapperError> {
        self.validate()?;
        if lens.n_cols() == 0 {
            return Err(MapperError::DimensionMismatch {
                what: "lens columns",
                expected: 1,
                found: 0,
            });
        }

        let axis = self.axis();
        let dimensions = (0..lens.n_cols())
            .map(|j| axis.fit_intervals(&lens.column(j)))
            .collect();
        Ok(FittedCover::new(dimensions))
    }

    /// Fit the cover and assign the same lens to cover sets.
    pub fn fit_transform(&self, lens: &Matrix) -> Result<Vec<CoverSet>, MapperError> {
        self.fit(lens)?.transform(lens)
    }
}

impl Default for CubicalCover {
    fn default() -> Self {
        Self::new(10, 0.1)
    }
}
