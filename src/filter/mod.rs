//! Filter functions (lenses) mapping each point to one or more lens values.
//!
//! A filter sees the whole dataset at once, so it may use global statistics
//! such as pairwise distances. Outputs of several filters are concatenated
//! column-wise in configuration order by the pipeline.

pub mod metric;
pub mod projection;
pub mod eccentricity;
pub mod entropy;
pub mod callable;

pub use metric::Metric;
pub use projection::Projection;
pub use eccentricity::{Eccentricity, Exponent};
pub use entropy::Entropy;
pub use callable::{CallableFilter, LensFn};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MapperError};
use crate::types::{Dataset, Matrix};

/// A lens over a dataset.
pub trait Filter: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Check parameters that do not depend on the data.
    fn validate_params(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Check that the filter can run on data with `n_features` columns.
    fn validate_input(&self, _n_features: usize) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Compute lens values, one row per point.
    fn apply(&self, data: &Dataset) -> Result<Matrix, MapperError>;
}

/// The filter functions a pipeline can be configured with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterFunction {
    /// Every input column, unchanged.
    Identity,
    /// Subset or permutation of input columns.
    Projection(Projection),
    /// Norm of distances to all points.
    Eccentricity(Eccentricity),
    /// Entropy of local distance distributions.
    Entropy(Entropy),
    /// User closure; not serializable.
    #[serde(skip)]
    Callable(CallableFilter),
}

impl Default for FilterFunction {
    fn default() -> Self {
        Self::Projection(Projection::default())
    }
}

impl From<Projection> for FilterFunction {
    fn from(f: Projection) -> Self {
        Self::Projection(f)
    }
}

impl From<Eccentricity> for FilterFunction {
    fn from(f: Eccentricity) -> Self {
        Self::Eccentricity(f)
    }
}

impl From<Entropy> for FilterFunction {
    fn from(f: Entropy) -> Self {
        Self::Entropy(f)
    }
}

impl From<CallableFilter> for FilterFunction {
    fn from(f: CallableFilter) -> Self {
        Self::Callable(f)
    }
}

impl FilterFunction {
    fn inner(&self) -> Option<&dyn Filter> {
        match self {
            Self::Identity => None,
            Self::Projection(f) => Some(f),
            Self::Eccentricity(f) => Some(f),
            Self::Entropy(f) => Some(f),
            Self::Callable(f) => Some(f),
        }
    }
}

impl Filter for FilterFunction {
    fn name(&self) -> &str {
        self.inner().map_or("identity", |f| f.name())
    }

    fn validate_params(&self) -> Result<(), ConfigError> {
        self.inner().map_or(Ok(()), |f| f.validate_params())
    }

    fn validate_input(&self, n_features: usize) -> Result<(), ConfigError> {
        self.inner().map_or(Ok(()), |f| f.validate_input(n_features))
    }

    fn apply(&self, data: &Dataset) -> Result<Matrix, MapperError> {
        match self.inner() {
            Some(f) => f.apply(data),
            None => Ok(data.clone()),
        }
    }
}

/// Run a filter and check its output: one row per point, all values finite.
pub fn compute_lens(filter: &dyn Filter, data: &Dataset) -> Result<Matrix, MapperError> {
    let lens = filter.apply(data)?;

    if lens.n_rows() != data.n_rows() {
        return Err(MapperError::MalformedLens {
            filter: filter.name().to_string(),
            reason: format!("expected {} rows, got {}", data.n_rows(), lens.n_rows()),
        });
    }
    if let Some(point) = lens.rows().position(|r| r.iter().any(|v| !v.is_finite())) {
        return Err(MapperError::NonFiniteLens {
            filter: filter.name().to_string(),
            point,
        });
    }
    Ok(lens)
}
