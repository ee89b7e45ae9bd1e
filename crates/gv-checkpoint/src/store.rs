// store.rs — Append-only checkpoint log with marker-then-restore rollback.
//
// The log is never truncated; an id index gives keyed access and a latest
// pointer tracks the head of the linear history. Rollback order matters:
// the target is resolved first (unknown ids create nothing), then the
// marker is taken, then the learning state is overwritten. A marker taken
// for a rollback whose blob fails to parse is retained — the failed
// attempt is itself part of history.

use std::collections::HashMap;

use uuid::Uuid;

use gv_learning::LearningEngine;

use crate::checkpoint::{hash_blob, Checkpoint, CheckpointType};
use crate::error::CheckpointError;

/// A successful rollback: which checkpoint was restored and which marker
/// preserved the pre-rollback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rollback {
    pub checkpoint_restored: Uuid,
    pub rollback_marker_id: Uuid,
}

/// Append-only store of checkpoints.
#[derive(Debug, Default)]
pub struct CheckpointStore {
    log: Vec<Checkpoint>,
    index: HashMap<Uuid, usize>,
    latest: Option<Uuid>,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the engine's current state. The new checkpoint links to the
    /// previously latest one and becomes the new head of the history.
    pub fn create(
        &mut self,
        engine: &LearningEngine,
        checkpoint_type: CheckpointType,
        description: impl Into<String>,
    ) -> &Checkpoint {
        let blob = engine.export_state();
        let checkpoint = Checkpoint {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            checkpoint_type,
            description: description.into(),
            hash: hash_blob(&blob),
            learning_state: blob,
            parent_id: self.latest,
        };

        self.latest = Some(checkpoint.id);
        self.index.insert(checkpoint.id, self.log.len());
        self.log.push(checkpoint);
        self.log.last().expect("just pushed")
    }

    pub fn get(&self, id: &Uuid) -> Option<&Checkpoint> {
        self.index.get(id).map(|&pos| &self.log[pos])
    }

    /// All checkpoints, newest first.
    pub fn all(&self) -> Vec<&Checkpoint> {
        self.log.iter().rev().collect()
    }

    /// The head of the history.
    pub fn latest(&self) -> Option<&Checkpoint> {
        self.latest.as_ref().and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Recompute the checkpoint's hash and compare against the stored one.
    pub fn validate(&self, id: &Uuid) -> Result<(), CheckpointError> {
        let checkpoint = self.get(id).ok_or(CheckpointError::NotFound { id: *id })?;
        if !checkpoint.integrity_ok() {
            return Err(CheckpointError::Corrupted { id: *id });
        }
        Ok(())
    }

    /// Roll the learning engine back to a checkpoint.
    ///
    /// The target is resolved before anything else: an unknown id returns
    /// `NotFound` and creates no marker. Otherwise a rollback marker is
    /// taken first, then the engine's state is wholesale-replaced from the
    /// target's blob. A blob that fails to parse returns `RestoreFailed`
    /// carrying the marker id; the marker stays in the log.
    pub fn rollback(
        &mut self,
        id: &Uuid,
        engine: &mut LearningEngine,
    ) -> Result<Rollback, CheckpointError> {
        if !self.index.contains_key(id) {
            return Err(CheckpointError::NotFound { id: *id });
        }

        let marker_id = self
            .create(
                engine,
                CheckpointType::RollbackMarker,
                format!("Rollback marker before restoring to {id}"),
            )
            .id;

        let blob = self
            .get(id)
            .ok_or(CheckpointError::NotFound { id: *id })?
            .learning_state
            .clone();

        engine
            .import_state(&blob)
            .map_err(|err| CheckpointError::RestoreFailed {
                marker_id,
                reason: err.to_string(),
            })?;

        tracing::info!("rolled back learning state to checkpoint {id}");
        Ok(Rollback {
            checkpoint_restored: *id,
            rollback_marker_id: marker_id,
        })
    }
}
