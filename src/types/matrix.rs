//! Dense row-major matrices for datasets and lens values.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MapperError};

/// A dataset of points: one row per point, one column per feature.
pub type Dataset = Matrix;

/// Dense row-major `f64` matrix.
///
/// Every constructor validates its input: rows share one width and every
/// entry is finite. A matrix with zero rows is valid and keeps its width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build a matrix from row vectors.
    ///
    /// An empty row list yields a `0 x 0` matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ConfigError> {
        let Some(first) = rows.first() else {
            return Ok(Self { n_rows: 0, n_cols: 0, data: Vec::new() });
        };
        let n_cols = first.len();
        if n_cols == 0 {
            return Err(ConfigError::ZeroWidth);
        }

        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n_cols {
                return Err(ConfigError::RaggedRows {
                    row,
                    expected: n_cols,
                    found: values.len(),
                });
            }
            data.extend(values);
        }

        Self::from_vec(data, n_rows, n_cols)
    }

    /// Build a matrix from a flat row-major buffer.
    pub fn from_vec(data: Vec<f64>, n_rows: usize, n_cols: usize) -> Result<Self, ConfigError> {
        if n_cols == 0 && n_rows > 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if data.len() != n_rows * n_cols {
            return Err(ConfigError::invalid(
                "data",
                format!("buffer holds {} values, expected {}x{}", data.len(), n_rows, n_cols),
            ));
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(ConfigError::NonFiniteInput {
                row: pos / n_cols,
                column: pos % n_cols,
            });
        }
        Ok(Self { n_rows, n_cols, data })
    }

    /// Re-check shape and finiteness, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.len() != self.n_rows * self.n_cols {
            return Err(ConfigError::invalid(
                "data",
                format!("buffer holds {} values, expected {}x{}", self.data.len(), self.n_rows, self.n_cols),
            ));
        }
        if self.n_cols == 0 && self.n_rows > 0 {
            return Err(ConfigError::ZeroWidth);
        }
        match self.data.iter().position(|v| !v.is_finite()) {
            Some(pos) => Err(ConfigError::NonFiniteInput {
                row: pos / self.n_cols,
                column: pos % self.n_cols,
            }),
            None => Ok(()),
        }
    }

    /// Build a single-column matrix.
    pub fn column_vector(values: Vec<f64>) -> Result<Self, ConfigError> {
        let n = values.len();
        Self::from_vec(values, n, 1)
    }

    /// Number of rows (points).
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns (features or lens dimensions).
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Check whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    /// Panics if `i >= n_rows`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Entry at `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n_cols + j]
    }

    /// Copy column `j` out.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows().map(|r| r[j]).collect()
    }

    /// Borrow the rows at the given indices, in index order.
    pub fn select_rows(&self, indices: &[usize]) -> Vec<&[f64]> {
        indices.iter().map(|&i| self.row(i)).collect()
    }

    /// Concatenate blocks column-wise, in block order.
    ///
    /// All blocks must have `n_rows` rows. No blocks yields an `n_rows x 0`
    /// matrix.
    pub fn hstack(blocks: &[Matrix], n_rows: usize) -> Result<Self, MapperError> {
        for block in blocks {
            if block.n_rows != n_rows {
                return Err(MapperError::DimensionMismatch {
                    what: "lens rows",
                    expected: n_rows,
                    found: block.n_rows,
                });
            }
        }

        let n_cols: usize = blocks.iter().map(|b| b.n_cols).sum();
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for i in 0..n_rows {
            for block in blocks {
                data.extend_from_slice(block.row(i));
            }
        }
        Ok(Self { n_rows, n_cols, data })
    }
}
