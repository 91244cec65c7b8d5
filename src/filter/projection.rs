//! Coordinate projection lens.

use serde::{Deserialize, Serialize};

use super::Filter;
use crate::error::{ConfigError, MapperError};
use crate::types::{Dataset, Matrix};

/// Selects a fixed subset (or permutation) of input coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// Columns to keep, in output order. Repeats are allowed.
    pub columns: Vec<usize>,
}

impl Projection {
    /// Project onto the given columns.
    pub fn new(columns: Vec<usize>) -> Self {
        Self { columns }
    }

    /// Project onto a single column.
    pub fn column(column: usize) -> Self {
        Self { columns: vec![column] }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::column(0)
    }
}

impl Filter for Projection {
    fn name(&self) -> &str {
        "projection"
    }

    fn validate_params(&self) -> Result<(), ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::invalid("columns", "projection needs at least one column"));
        }
        Ok(())
    }

    fn validate_input(&self, n_features: usize) -> Result<(), ConfigError> {
        match self.columns.iter().find(|&&c| c >= n_features) {
            Some(&column) => Err(ConfigError::ColumnOutOfRange { column, n_features }),
            None => Ok(()),
        }
    }

    fn apply(&self, data: &Dataset) -> Result<Matrix, MapperError> {
        let values: Vec<f64> = data
            .rows()
            .flat_map(|row| self.columns.iter().map(move |&c| row[c]))
            .collect();
        Ok(Matrix::from_vec(values, data.n_rows(), self.columns.len())?)
    }
}
