//! Error types for the taste model and scoring core.
//!
//! Missing data (no genres, no lyrics, no clusters) is never an error here;
//! it flows through scoring as absent values. Everything in [`TasteError`]
//! is a contract violation by the caller and is propagated, not recovered.

use thiserror::Error;

/// Errors raised by the scoring and clustering core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TasteError {
    /// An operation that needs at least one element received none.
    #[error("`{operation}` requires at least one input, got none")]
    EmptyInput { operation: &'static str },

    /// Two vectors of different length met in the same computation.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// No profile is registered under this listener id.
    #[error("unknown listener `{0}`")]
    UnknownListener(String),

    /// A profile is already registered under this listener id.
    #[error("listener `{0}` already exists")]
    DuplicateListener(String),

    /// Scoring was cancelled between two listeners.
    #[error("scoring cancelled after {scored} of {total} listeners")]
    Cancelled { scored: usize, total: usize },

    /// A stored profile whose clusters do not describe its embeddings.
    #[error("inconsistent profile: {0}")]
    InconsistentProfile(String),

    /// Configuration values that would break scoring or clustering.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TasteError>;
