//! Overlapping interval cover of a single lens dimension.

use serde::{Deserialize, Serialize};

use super::FittedCover;
use crate::error::{ConfigError, MapperError};
use crate::types::{CoverSet, Interval, Matrix};

/// How interval boundaries are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverKind {
    /// Equal-width intervals over `[min, max]`.
    #[default]
    Uniform,
    /// Boundaries at quantiles of the observed values, so intervals hold
    /// roughly the same number of points.
    Balanced,
}

/// Cover of a one-column lens by `n_intervals` overlapping intervals.
///
/// In the uniform kind every interval has width
/// `w = (max - min) / (n - (n - 1) * overlap_frac)` and consecutive intervals
/// share exactly `overlap_frac * w`: the range is cut into `n` equal cells and
/// each cell grows by `overlap_frac * w / 2` per side. The first interval
/// starts at `min` and the last ends at `max`.
///
/// `overlap_frac = 0` is accepted, but the intervals are then disjoint, so no
/// point is shared between cover sets and the graph has no edges between
/// neighbouring regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneDimensionalCover {
    /// Number of intervals, at least 1.
    pub n_intervals: usize,
    /// Fraction of an interval's width shared with each neighbour, in `[0, 1)`.
    pub overlap_frac: f64,
    /// Boundary placement.
    #[serde(default)]
    pub kind: CoverKind,
}

impl OneDimensionalCover {
    /// Create a uniform cover.
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
        validate_cover_params(self.n_intervals, self.overlap_frac)
    }

    /// Compute interval bounds for the observed values.
    ///
    /// Empty input yields no intervals; a constant input yields a single
    /// interval accepting everything.
    pub fn fit_intervals(&self, values: &[f64]) -> Vec<Interval> {
        let Some((min, max)) = min_max(values) else {
            return Vec::new();
        };
        if min == max {
            return vec![Interval::whole(min, max)];
        }

        let mut intervals = match self.kind {
            CoverKind::Uniform => self.uniform_intervals(min, max),
            CoverKind::Balanced => self.balanced_intervals(values, min, max),
        };

        if let Some(first) = intervals.first_mut() {
            first.lower = min;
            first.unbounded_below = true;
        }
        if let Some(last) = intervals.last_mut() {
            last.upper = max;
            last.unbounded_above = true;
        }
        intervals
    }

    fn uniform_intervals(&self, min: f64, max: f64) -> Vec<Interval> {
        let n = self.n_intervals as f64;
        let width = (max - min) / (n - (n - 1.0) * self.overlap_frac);
        let step = width * (1.0 - self.overlap_frac);

        let lowers: Vec<f64> = (0..self.n_intervals).map(|i| min + i as f64 * step).collect();

        // Each upper bound reaches at least the next lower bound.
        lowers
            .iter()
            .enumerate()
            .map(|(i, &lower)| {
                let upper = match lowers.get(i + 1) {
                    Some(&next) => (lower + width).max(next),
                    None => lower + width,
                };
                Interval::new(lower, upper)
            })
            .collect()
    }

    fn balanced_intervals(&self, values: &[f64], min: f64, max: f64) -> Vec<Interval> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = self.n_intervals;
        let edges: Vec<f64> = (0..=n).map(|k| quantile(&sorted, k as f64 / n as f64)).collect();

        edges
            .windows(2)
            .map(|cell| {
                let grow = self.overlap_frac * (cell[1] - cell[0]) / 2.0;
                Interval::new((cell[0] - grow).max(min), (cell[1] + grow).min(max))
            })
            .collect()
    }

    /// Fit the cover to a single-column lens.
    pub fn fit(&self, lens: &Matrix) -> Result<FittedCover, MapperError> {
        self.validate()?;
        if lens.n_cols() != 1 {
            return Err(MapperError::DimensionMismatch {
                what: "lens columns",
                expected: 1,
                found: lens.n_cols(),
            });
        }
        Ok(FittedCover::new(vec![self.fit_intervals(&lens.column(0))]))
    }

    /// Fit the cover and assign the same lens to cover sets.
    pub fn fit_transform(&self, lens: &Matrix) -> Result<Vec<CoverSet>, MapperError> {
        self.fit(lens)?.transform(lens)
    }
}

impl Default for OneDimensionalCover {
    fn default() -> Self {
        Self::new(10, 0.1)
    }
}

/// Shared validation for one-dimensional and cubical covers.
pub(crate) fn validate_cover_params(n_intervals: usize, overlap_frac: f64) -> Result<(), ConfigError> {
    if n_intervals < 1 {
        return Err(ConfigError::InvalidIntervalCount(n_intervals));
    }
    if !(0.0..1.0).contains(&overlap_frac) {
        return Err(ConfigError::OverlapOutOfRange(overlap_frac));
    }
    Ok(())
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Linear-interpolated quantile of sorted values, `t` in `[0, 1]`.
fn quantile(sorted: &[f64], t: f64) -> f64 {
    let pos = t * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
}
