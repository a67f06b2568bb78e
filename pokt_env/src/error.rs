//! Error types for the simulation environment layer.

use thiserror::Error;

/// Errors that can occur while drawing from the randomness service.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    /// Distribution parameters were rejected (non-positive or non-finite)
    #[error("Invalid {distribution} distribution parameters: {detail}")]
    InvalidDistribution {
        distribution: &'static str,
        detail: String,
    },
}

impl EnvError {
    /// Creates an invalid-distribution error.
    pub fn invalid_distribution(distribution: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidDistribution {
            distribution,
            detail: detail.into(),
        }
    }
}
