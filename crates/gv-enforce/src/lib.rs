//! # gv-enforce
//!
//! Turns validation results into enforcement outcomes.
//!
//! Every enforcement produces an [`AuditEvent`] — including blocked ones —
//! and persists the validation's violations into the injected
//! [`ViolationStore`](gv_violations::ViolationStore). Cross-domain
//! enforcement arbitrates between multiple governance domains by priority,
//! letting a higher-priority domain veto what a lower one would allow.
//!
//! ## Key invariants
//!
//! - **Invalid beats RESTRICTED**: a failing validation blocks (or escalates
//!   via `escalates_to`) even when the action's status alone would merely
//!   require approval.
//! - **Checkpoint at classification ≥ 2**: `checkpoint_required` is computed
//!   from the action's CAES independent of the outcome.
//! - **Counting is explicit**: enforcement counters only move when the
//!   caller records a result.

pub mod counters;
pub mod enforcer;
pub mod event;

pub use counters::{EnforcementCounters, EnforcementSummary};
pub use enforcer::{
    enforce_action, enforce_actions, enforce_cross_domain, DomainPolicy, EnforcementResult,
    EnforcerConfig,
};
pub use event::{AuditEvent, EnforcementOutcome, Provenance};
