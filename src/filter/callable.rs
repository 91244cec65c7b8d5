//! User-supplied lens functions.

use std::fmt;
use std::sync::Arc;

use super::Filter;
use crate::error::MapperError;
use crate::types::{Dataset, Matrix};

/// Signature of a user lens: a batch of rows in, one output row per input row.
pub type LensFn = dyn Fn(&[&[f64]]) -> Vec<Vec<f64>> + Send + Sync;

/// A lens backed by a closure.
///
/// Dispatch is decided by the `applies_per_row` flag given at construction:
/// when set, the closure is called once per point with a one-row batch;
/// otherwise it is called once with every row and may use global statistics.
#[derive(Clone)]
pub struct CallableFilter {
    name: String,
    applies_per_row: bool,
    func: Arc<LensFn>,
}

impl CallableFilter {
    /// Register a closure with its dispatch flag.
    pub fn new<F>(name: impl Into<String>, applies_per_row: bool, func: F) -> Self
    where
        F: Fn(&[&[f64]]) -> Vec<Vec<f64>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            applies_per_row,
            func: Arc::new(func),
        }
    }

    /// Register a pointwise function of a single row.
    pub fn per_row<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Self::new(name, true, move |rows: &[&[f64]]| rows.iter().map(|r| func(r)).collect())
    }

    /// Whether the closure is invoked row by row.
    pub fn applies_per_row(&self) -> bool {
        self.applies_per_row
    }

    fn malformed(&self, reason: String) -> MapperError {
        MapperError::MalformedLens {
            filter: self.name.clone(),
            reason,
        }
    }
}

impl fmt::Debug for CallableFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableFilter")
            .field("name", &self.name)
            .field("applies_per_row", &self.applies_per_row)
            .finish_non_exhaustive()
    }
}

impl Filter for CallableFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, data: &Dataset) -> Result<Matrix, MapperError> {
        let rows: Vec<&[f64]> = data.rows().collect();
        let output: Vec<Vec<f64>> = if self.applies_per_row {
            let mut out = Vec::with_capacity(rows.len());
            for (i, row) in rows.iter().enumerate() {
                let mut produced = (self.func)(std::slice::from_ref(row));
                if produced.len() != 1 {
                    return Err(self.malformed(format!(
                        "row {i}: expected 1 output row, got {}",
                        produced.len()
                    )));
                }
                out.append(&mut produced);
            }
            out
        } else {
            (self.func)(&rows)
        };

        if output.len() != rows.len() {
            return Err(self.malformed(format!(
                "expected {} output rows, got {}",
                rows.len(),
                output.len()
            )));
        }
        if output.is_empty() {
            return Ok(Matrix::from_vec(Vec::new(), 0, 0)?);
        }

        let width = output[0].len();
        if width == 0 {
            return Err(self.malformed("output rows have no values".to_string()));
        }
        if let Some(row) = output.iter().position(|r| r.len() != width) {
            return Err(self.malformed(format!("row {row} has a different width than row 0")));
        }
        if let Some(point) = output.iter().position(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(MapperError::NonFiniteLens {
                filter: self.name.clone(),
                point,
            });
        }

        let n_rows = output.len();
        Ok(Matrix::from_vec(output.into_iter().flatten().collect(), n_rows, width)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Dataset {
        Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap()
    }

    #[test]
    fn test_per_row_dispatch() {
        let sum = CallableFilter::per_row("row_sum", |row| vec![row.iter().sum()]);
        assert!(sum.applies_per_row());

        let lens = sum.apply(&data()).unwrap();
        assert_eq!(lens.column(0), vec![3.0, 7.0]);
    }

    #[test]
    fn test_whole_dataset_dispatch() {
        // Centre the first coordinate: needs the dataset mean.
        let centred = CallableFilter::new("centred_x", false, |rows: &[&[f64]]| {
            let mean = rows.iter().map(|r| r[0]).sum::<f64>() / rows.len() as f64;
            rows.iter().map(|r| vec![r[0] - mean]).collect()
        });
        assert!(!centred.applies_per_row());

        let lens = centred.apply(&data()).unwrap();
        assert_eq!(lens.column(0), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_non_finite_output_is_error() {
        let bad = CallableFilter::per_row("log_neg", |row| vec![(-row[0]).ln()]);
        let err = bad.apply(&data()).unwrap_err();
        assert!(matches!(err, MapperError::NonFiniteLens { point: 0, .. }));
    }

    #[test]
    fn test_wrong_row_count_is_error() {
        let bad = CallableFilter::new("drop_rows", false, |_rows: &[&[f64]]| vec![vec![0.0]]);
        assert!(matches!(bad.apply(&data()), Err(MapperError::MalformedLens { .. })));
    }

    #[test]
    fn test_zero_width_output_is_malformed_lens() {
        let blank = CallableFilter::per_row("blank", |_row| Vec::new());
        let err = blank.apply(&data()).unwrap_err();
        assert!(!err.is_config());
        assert!(matches!(err, MapperError::MalformedLens { ref filter, .. } if filter == "blank"));
    }
}
