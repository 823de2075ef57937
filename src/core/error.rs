//! Engine capability errors.
//!
//! Bounded and stable: these represent domain refusal states, not library
//! implementation details.

use thiserror::Error;

use super::ItemId;
use crate::error::{Effect, Transience};
use crate::store::PersistError;

/// Canonical error enum for the engine capability.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// Operation against an id outside the universe.
    #[error("item not found: {0}")]
    NotFound(ItemId),

    /// Reorder payloads must carry at least one id; clearing the order goes
    /// through the explicit reset operation instead.
    #[error("reorder payload is empty")]
    EmptyOrder,

    /// Pagination with a zero page size could never report a last page.
    #[error("page size must be positive")]
    InvalidPageSize,

    /// Durable write failed; in-memory state was rolled back first.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl CoreError {
    /// Wire/protocol error code.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "not_found",
            CoreError::EmptyOrder | CoreError::InvalidPageSize => "invalid_request",
            CoreError::Persist(_) => "persist_failed",
        }
    }

    pub fn transience(&self) -> Transience {
        match self {
            CoreError::NotFound(_) | CoreError::EmptyOrder | CoreError::InvalidPageSize => {
                Transience::Permanent
            }
            CoreError::Persist(e) => e.transience(),
        }
    }

    /// Rollback-before-propagate means a failed call left no visible effect.
    pub fn effect(&self) -> Effect {
        Effect::None
    }
}
