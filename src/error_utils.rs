// error_utils.rs
use thiserror::Error;

/// Represents the error taxonomy of the simulation core. Configuration mistakes are reported
/// synchronously and are never retried: a batch either completes with valid statistics, or it
/// fails outright and the caller must treat the whole batch as invalid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// A sample size, repetition count, or distribution parameter is out of domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A statistic was requested on fewer observations than it is defined for, e.g. the
    /// unbiased sample variance on fewer than 2 observations.
    #[error("insufficient sample size: requires at least {required} observations, got {actual}")]
    InsufficientSampleSize { required: usize, actual: usize },

    /// A tabular operation referenced a column that is not present in the table headers.
    #[error("column '{0}' not found in headers")]
    ColumnNotFound(String),
}
