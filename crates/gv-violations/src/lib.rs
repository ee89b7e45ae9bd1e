//! # gv-violations
//!
//! Capture and analysis of policy violations.
//!
//! Violations are produced by the policy validator and persisted here as a
//! side channel feeding both the enforcer and the learning engine. The store
//! is append-only and keyed by violation id; attaching a resolution is the
//! only mutation after capture.
//!
//! ## Key invariants
//!
//! - **Append-only, no dedupe**: every captured violation is kept; re-capture
//!   of an existing id replaces that record in place.
//! - **Insertion order is export order**: the JSONL export is deterministic
//!   for a given capture history.
//! - **Best-effort import**: malformed JSONL lines are skipped, never fatal.

pub mod store;
pub mod violation;

pub use store::{ViolationPattern, ViolationStats, ViolationStore};
pub use violation::{
    ResolutionType, Violation, ViolationContext, ViolationResolution, ViolationSeverity,
    ViolationType,
};
