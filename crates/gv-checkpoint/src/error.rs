// error.rs — Error types for the checkpoint subsystem.

use thiserror::Error;
use uuid::Uuid;

/// Errors from checkpoint validation and rollback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    /// The requested checkpoint id is not in the store.
    #[error("checkpoint '{id}' not found")]
    NotFound { id: Uuid },

    /// The checkpoint's recomputed hash no longer matches the stored one.
    #[error("checkpoint '{id}' hash mismatch - state may be corrupted")]
    Corrupted { id: Uuid },

    /// The checkpoint's learning-state blob failed to parse during
    /// rollback. The rollback marker taken beforehand is retained.
    #[error("failed to restore learning state: {reason} (rollback marker {marker_id})")]
    RestoreFailed { marker_id: Uuid, reason: String },

    /// Auto-rollback was required but the store is empty.
    #[error("no checkpoint available for auto-rollback")]
    NoCheckpoints,
}
