//! # gv-learning
//!
//! Learns from recurring violations and proposes policy changes.
//!
//! The [`LearningEngine`] is the sole owner of the mutable
//! [`LearningState`]: learned patterns mined from the violation store,
//! operator feedback with per-action weight adjustments, generated policy
//! proposals, and structural benchmark results. The whole state serializes
//! as one pretty-printed JSON document, which is what the checkpoint system
//! snapshots and restores.
//!
//! ## Key invariants
//!
//! - **Patterns are keyed**: re-learning replaces any pattern with the same
//!   `(action_id, violation_type)` key instead of accumulating duplicates.
//! - **Weights stay in [-1, 1]**: feedback deltas clamp, never overflow.
//! - **Proposals need confidence**: below 0.5, or for actions outside the
//!   given action space, no proposal is generated.

pub mod engine;
pub mod state;

pub use engine::LearningEngine;
pub use state::{
    BenchmarkGap, BenchmarkResult, BenchmarkType, FeedbackRecord, FeedbackType, GapSeverity,
    LearnedPattern, LearningState, PatternType, PolicyProposal, ProposalStatus, ProposalType,
    SuggestedAction, WeightAdjustments,
};
