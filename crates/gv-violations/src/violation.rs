// violation.rs — Violation record data model.
//
// A violation is created when a policy check fails. It is immutable after
// capture except for the optional resolution attached later by a reviewer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of policy breach occurred.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    /// Action CAES exceeded an MRCC classification ceiling.
    MrccExceeded,
    /// Action is forbidden by status or by the MRCC forbidden list.
    ForbiddenAction,
    /// Action was attempted without the required authority.
    AuthorityMissing,
    /// Action CAES exceeded an MRCC scope ceiling.
    ScopeExceeded,
    /// A rate limit was breached.
    RateLimit,
    /// An epoch monotonic property would be violated.
    EpochViolation,
    /// Action disagrees with its declared policy.
    PolicyMismatch,
}

impl ViolationType {
    /// Every variant, for zero-filled statistics.
    pub const ALL: [ViolationType; 7] = [
        ViolationType::MrccExceeded,
        ViolationType::ForbiddenAction,
        ViolationType::AuthorityMissing,
        ViolationType::ScopeExceeded,
        ViolationType::RateLimit,
        ViolationType::EpochViolation,
        ViolationType::PolicyMismatch,
    ];
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ViolationType::MrccExceeded => "MRCC_EXCEEDED",
            ViolationType::ForbiddenAction => "FORBIDDEN_ACTION",
            ViolationType::AuthorityMissing => "AUTHORITY_MISSING",
            ViolationType::ScopeExceeded => "SCOPE_EXCEEDED",
            ViolationType::RateLimit => "RATE_LIMIT",
            ViolationType::EpochViolation => "EPOCH_VIOLATION",
            ViolationType::PolicyMismatch => "POLICY_MISMATCH",
        };
        f.write_str(name)
    }
}

/// How serious the breach is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ViolationSeverity {
    /// Every variant, for zero-filled statistics.
    pub const ALL: [ViolationSeverity; 4] = [
        ViolationSeverity::Low,
        ViolationSeverity::Medium,
        ViolationSeverity::High,
        ViolationSeverity::Critical,
    ];
}

/// Where and under what policy the violation occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationContext {
    /// Who attempted the action.
    pub actor: String,
    /// The resource the action targeted, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// The CAES the actor requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_caes: Option<String>,
    /// The CAES ceiling that applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_caes: Option<String>,
    /// Reference to the policy clause that was breached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_ref: Option<String>,
    /// The epoch in force at the time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch_id: Option<String>,
}

impl ViolationContext {
    pub fn for_actor(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            ..Self::default()
        }
    }
}

/// How a violation was ultimately disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionType {
    Approved,
    Blocked,
    Escalated,
    Exception,
}

/// The resolution record attached to a violation by a reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationResolution {
    pub resolved_at: DateTime<Utc>,
    pub resolved_by: String,
    pub resolution_type: ResolutionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A single policy violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Unique identifier for this violation.
    pub id: Uuid,
    /// When the violation occurred (UTC).
    pub timestamp: DateTime<Utc>,
    /// The action that triggered it.
    pub action_id: String,
    /// The action's CAES string at the time.
    pub caes: String,
    pub violation_type: ViolationType,
    pub severity: ViolationSeverity,
    pub context: ViolationContext,
    /// Attached once a reviewer disposes of the violation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ViolationResolution>,
}

impl Violation {
    /// Create a new, unresolved violation with a fresh id and the current
    /// timestamp.
    pub fn new(
        action_id: impl Into<String>,
        caes: impl Into<String>,
        violation_type: ViolationType,
        severity: ViolationSeverity,
        context: ViolationContext,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action_id: action_id.into(),
            caes: caes.into(),
            violation_type,
            severity,
            context,
            resolution: None,
        }
    }

    /// Whether a resolution has been attached.
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}
