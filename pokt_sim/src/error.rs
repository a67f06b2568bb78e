//! Error types for the simulation pipeline.

use pokt_core::{ConfigurationError, StateInvariantError};
use pokt_env::EnvError;
use thiserror::Error;

/// Errors that abort an action chain.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Parameter set could not be loaded or resolved
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A mechanism refused to break a world-state invariant
    #[error("State invariant violated: {0}")]
    StateInvariant(#[from] StateInvariantError),

    /// The randomness service rejected a draw
    #[error("Randomness error: {0}")]
    Randomness(#[from] EnvError),

    /// Reading or writing a run artifact failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        Self::Io(e.to_string())
    }
}
