//! Error taxonomy for Mapper runs.
//!
//! Configuration errors are detected before any computation starts and are
//! never retried. Computation errors abort the whole run: a graph built from a
//! subset of cover sets is not a meaningful summary, so no partial result is
//! ever returned.

/// Invalid configuration or input, reported before computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Cover needs at least one interval per dimension.
    #[error("n_intervals must be at least 1, got {0}")]
    InvalidIntervalCount(usize),
    /// Overlap fraction outside `[0, 1)`.
    #[error("overlap_frac must lie in [0, 1), got {0}")]
    OverlapOutOfRange(f64),
    /// No filter function was configured.
    #[error("at least one filter function is required")]
    EmptyFilterList,
    /// A filter or clusterer parameter is out of its domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable constraint that was violated.
        reason: String,
    },
    /// Rows of the dataset do not share one width.
    #[error("ragged dataset: row {row} has {found} features, expected {expected}")]
    RaggedRows {
        /// Offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// Points must have at least one coordinate.
    #[error("dataset rows must have at least one feature")]
    ZeroWidth,
    /// NaN or infinite input coordinate.
    #[error("non-finite value at row {row}, column {column}")]
    NonFiniteInput {
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
    },
    /// Projection references a column the dataset does not have.
    #[error("projection column {column} out of range for {n_features} features")]
    ColumnOutOfRange {
        /// Requested column.
        column: usize,
        /// Dataset width.
        n_features: usize,
    },
    /// The worker pool could not be created.
    #[error("thread pool construction failed: {0}")]
    ThreadPool(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Error type for pipeline runs.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// Configuration or input validation failure.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// A filter produced NaN or an infinite value.
    #[error("filter `{filter}` produced a non-finite lens value for point {point}")]
    NonFiniteLens {
        /// Filter name.
        filter: String,
        /// Point index.
        point: usize,
    },
    /// A filter returned a lens with the wrong number of rows or columns.
    #[error("filter `{filter}` returned malformed output: {reason}")]
    MalformedLens {
        /// Filter name.
        filter: String,
        /// What was wrong with the output.
        reason: String,
    },
    /// Local clustering failed inside one cover set.
    #[error("clustering failed in cover set {cover_set}: {reason}")]
    Clustering {
        /// Cover set index.
        cover_set: usize,
        /// Failure description.
        reason: String,
    },
    /// Data width differs from what the fitted state expects.
    #[error("{what} dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Which dimension (input features, lens columns).
        what: &'static str,
        /// Expected width.
        expected: usize,
        /// Observed width.
        found: usize,
    },
    /// A fan-in received a branch output of another kind.
    #[error("branch {index} returned {found} output, expected {expected}")]
    UnexpectedBranchOutput {
        /// Branch position.
        index: usize,
        /// Expected output kind.
        expected: &'static str,
        /// Observed output kind.
        found: &'static str,
    },
    /// `transform` was called before `fit`.
    #[error("pipeline has not been fitted")]
    NotFitted,
    /// Persisted state could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MapperError {
    /// Whether this error was raised by configuration validation.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
