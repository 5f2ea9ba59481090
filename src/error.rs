use thiserror::Error;

/// Failures raised by the clustering core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClusterError {
    /// Max and min absolute value of a feature coincide, so the feature cannot be scaled.
    #[error("feature {feature} has a degenerate range (max |x| == min |x| == {value})")]
    DegenerateRange { feature: usize, value: f64 },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, ClusterError>;

pub(crate) fn invalid<T>(msg: impl Into<String>) -> Result<T> {
    Err(ClusterError::InvalidConfiguration(msg.into()))
}
