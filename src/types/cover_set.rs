//! Cover sets: regions of lens space and the points that fall inside them.

use serde::{Deserialize, Serialize};

/// One interval of a one-dimensional cover.
///
/// Membership is half-open `[lower, upper)`. The last interval of a cover is
/// unbounded above and the first unbounded below, so values outside the fitted
/// range (seen at `transform` time) still land in an end interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Lower bound (inclusive).
    pub lower: f64,
    /// Upper bound (exclusive unless `unbounded_above`).
    pub upper: f64,
    /// Accept every value below `upper`.
    pub unbounded_below: bool,
    /// Accept every value at or above `lower`.
    pub unbounded_above: bool,
}

impl Interval {
    /// Create a bounded half-open interval.
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            unbounded_below: false,
            unbounded_above: false,
        }
    }

    /// Interval accepting every value. Bounds record the observed range.
    pub fn whole(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            unbounded_below: true,
            unbounded_above: true,
        }
    }

    /// Check whether `value` falls inside the interval.
    pub fn contains(&self, value: f64) -> bool {
        let above_lower = self.unbounded_below || value >= self.lower;
        let below_upper = self.unbounded_above || value < self.upper;
        above_lower && below_upper
    }

    /// Width of the recorded bounds.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// A region of the cover together with its member points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverSet {
    /// Position of the region in the cover grid (first lens dimension slowest).
    pub index: usize,
    /// One interval per lens dimension.
    pub bounds: Vec<Interval>,
    /// Member point indices, ascending.
    pub members: Vec<usize>,
}

impl CoverSet {
    /// Create a cover set. Members are sorted and deduplicated.
    pub fn new(index: usize, bounds: Vec<Interval>, mut members: Vec<usize>) -> Self {
        members.sort_unstable();
        members.dedup();
        Self { index, bounds, members }
    }

    /// Number of member points.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check whether a point is a member.
    pub fn contains(&self, point: usize) -> bool {
        self.members.binary_search(&point).is_ok()
    }

    /// Boolean membership mask over `n_points` points.
    pub fn mask(&self, n_points: usize) -> Vec<bool> {
        let mut mask = vec![false; n_points];
        for &p in &self.members {
            if p < n_points {
                mask[p] = true;
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_membership() {
        let interval = Interval::new(1.0, 2.0);
        assert!(interval.contains(1.0));
        assert!(interval.contains(1.5));
        assert!(!interval.contains(2.0));
        assert!(!interval.contains(0.5));
    }

    #[test]
    fn test_unbounded_ends() {
        let mut last = Interval::new(5.0, 8.0);
        last.unbounded_above = true;
        assert!(last.contains(8.0));
        assert!(last.contains(100.0));
        assert!(!last.contains(4.9));

        let whole = Interval::whole(3.0, 3.0);
        assert!(whole.contains(-1e9));
        assert!(whole.contains(1e9));
    }

    #[test]
    fn test_cover_set_mask() {
        let set = CoverSet::new(2, vec![Interval::new(0.0, 1.0)], vec![3, 1, 3]);
        assert_eq!(set.members, vec![1, 3]);
        assert_eq!(set.mask(5), vec![false, true, false, true, false]);
        assert!(set.contains(3));
        assert!(!set.contains(2));
    }
}
