use thiserror::Error;

/// Errors surfaced by the estimators.
///
/// Rank deficiency on the QR/SVD paths and empty k-means clusters are handled
/// numerically and never show up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported solver `{solver}` for {model}")]
    UnsupportedSolver { solver: String, model: &'static str },

    #[error("singular matrix: {0}")]
    SingularMatrix(String),

    #[error("matrix is not positive definite (pivot {index} = {pivot:e})")]
    NotPositiveDefinite { index: usize, pivot: f64 },

    #[error("invalid target at row {index}: {value} (expected 0 or 1)")]
    InvalidTarget { index: usize, value: f64 },

    #[error("non-finite value in {0}")]
    NonFiniteInput(&'static str),

    #[error("model is not fitted")]
    NotFitted,

    #[error("decomposition failed: {0}")]
    DecompositionFailed(&'static str),
}

impl EstimatorError {
    pub fn dimension_mismatch(message: impl Into<String>) -> Self {
        Self::DimensionMismatch(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
