//! # gv-policy
//!
//! The action-space data model and the policy validator.
//!
//! An [`ActionSpace`] is supplied fully parsed by an external config layer
//! and is read-only to this crate. [`validate_action`] runs one action
//! through an ordered list of checks — existence, status, CAES bounds
//! against the MRCC, forbidden-list membership, caller-supplied rate
//! counters, and epoch monotonic properties — producing a pass/fail record
//! per check plus violation records for the failures that warrant them.
//!
//! ## Key invariants
//!
//! - **Unknown actions short-circuit**: nothing else is checked.
//! - **MRCC blocks, NCC advises**: NCC membership only ever adds a
//!   recommendation string, never a failure.
//! - **Unparsable CAES fails closed for MRCC bounds only**: the remaining
//!   checks (forbidden list, rate limits, epoch) still run.
//! - **Rate counters come from the caller**: the validator holds no
//!   cross-call state.

pub mod space;
pub mod validator;

pub use space::{
    ActionDefinition, ActionSpace, ActionStatus, ConstraintSet, Epoch,
    AUDIT_CANNOT_DISABLE, AUTONOMY_EXPANSION_ACTION, AUTONOMY_LEVEL_CANNOT_INCREASE,
    FORBIDDEN_STAYS_FORBIDDEN,
};
pub use validator::{
    allowed_actions, validate_action, validate_actions, PolicyCheck, ValidationResult,
    ValidatorContext,
};
