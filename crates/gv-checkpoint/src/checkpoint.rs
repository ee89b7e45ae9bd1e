// checkpoint.rs — Checkpoint data model and integrity hashing.
//
// A checkpoint carries the learning state as a verbatim serialized blob
// plus a SHA-256 hash over that blob. The hash is recomputed on validation;
// any drift between blob and hash means corruption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Why a checkpoint was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckpointType {
    /// Operator-requested snapshot.
    Manual,
    /// Taken automatically before a guarded modification.
    AutoPreModify,
    /// Taken on a periodic schedule by the host.
    AutoPeriodic,
    /// Inserted by rollback to preserve the pre-rollback state.
    RollbackMarker,
}

/// An immutable, hash-verified snapshot of the learning state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub checkpoint_type: CheckpointType,
    pub description: String,
    /// The learning state exactly as the engine exported it.
    pub learning_state: String,
    /// `sha256:<hex>` over `learning_state`.
    pub hash: String,
    /// The previously latest checkpoint, forming a linear history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

impl Checkpoint {
    /// Whether the stored hash still matches the blob.
    pub fn integrity_ok(&self) -> bool {
        hash_blob(&self.learning_state) == self.hash
    }
}

/// SHA-256 over a learning-state blob, in the `sha256:<hex>` tagged form.
pub(crate) fn hash_blob(blob: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(blob.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}
