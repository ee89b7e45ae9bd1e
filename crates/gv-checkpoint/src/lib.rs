//! # gv-checkpoint
//!
//! Snapshots and restores the learning engine's state under guard rules.
//!
//! Checkpoints form an append-only, singly-linked history: each checkpoint
//! records a SHA-256 integrity hash over its serialized learning-state blob
//! and a link to its predecessor. Rolling back never deletes history — a
//! rollback-marker checkpoint is inserted first, so the pre-rollback state
//! is itself recoverable.
//!
//! ## Key invariants
//!
//! - **History is never destructive**: rollback inserts a marker; nothing
//!   is removed.
//! - **Unknown rollback targets create nothing**: the target is resolved
//!   before the marker is taken.
//! - **Integrity failures are loud**: hash mismatches and unparsable blobs
//!   surface as explicit errors, never silently absorbed.

pub mod checkpoint;
pub mod error;
pub mod guard;
pub mod health;
pub mod store;

pub use checkpoint::{Checkpoint, CheckpointType};
pub use error::CheckpointError;
pub use guard::{GuardAction, GuardCheckResult, GuardTable, GuardType, ModificationGuard};
pub use health::{auto_rollback_if_needed, run_health_check, HealthCheck, HealthCheckResult};
pub use store::{CheckpointStore, Rollback};
