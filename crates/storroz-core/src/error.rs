//! Error taxonomy for core operations.
//!
//! Every operation returns one of these kinds. The boundary layer
//! maps them to user-visible responses; inside the core they are
//! terminal for the call, except `Busy` which is safe to retry with
//! backoff.

use thiserror::Error;

/// Failure kinds reported by core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed or self-referential input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced id is absent.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// Uniqueness or duplicate-edge violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller lacks rights over the target.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Lock acquisition timed out. Retryable.
    #[error("busy: {0}")]
    Busy(&'static str),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing-entity failure.
    pub fn not_found(entity: &'static str, id: impl Into<u64>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// True if the caller may retry the operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Busy(_))
    }
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, CoreError>;
