// event.rs — Audit event data model.
//
// Every enforcement emits exactly one audit event, whatever the outcome.
// Events are append-only: once created they are never mutated, and the
// ledger in gv-audit stores them verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The decision an enforcement reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnforcementOutcome {
    /// The action may proceed.
    Allowed,
    /// The action must not proceed.
    Blocked,
    /// The action needs approval before proceeding.
    Escalated,
}

/// Input/output lineage attached to an audit event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_hash: Option<String>,
    /// Checkpoint taken in connection with this action, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<String>,
}

/// One record in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this event.
    pub id: Uuid,
    /// When the enforcement happened (UTC).
    pub timestamp: DateTime<Utc>,
    /// The action that was enforced.
    pub action_id: String,
    /// The action's CAES string, or `"UNKNOWN"` for actions outside the
    /// catalog.
    pub caes: String,
    /// Who attempted the action.
    pub actor: String,
    /// The resource affected, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub outcome: EnforcementOutcome,
    /// Policies consulted for this decision.
    pub policy_refs: Vec<String>,
    #[serde(default)]
    pub provenance: Provenance,
}

impl AuditEvent {
    /// Create an event with a fresh id and the current timestamp.
    pub fn new(
        action_id: impl Into<String>,
        caes: impl Into<String>,
        actor: impl Into<String>,
        outcome: EnforcementOutcome,
        policy_refs: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action_id: action_id.into(),
            caes: caes.into(),
            actor: actor.into(),
            target: None,
            outcome,
            policy_refs,
            provenance: Provenance::default(),
        }
    }

    /// Set the target URI and return self (builder pattern).
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set provenance and return self.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}
