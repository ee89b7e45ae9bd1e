// space.rs — Action-space data model.
//
// The action space is the governance configuration an external config layer
// loads, merges, and hands to the core: the catalog of known actions, the
// hard MRCC ceiling, the advisory NCC preferences, and the active epoch.
// The core never reads files; it only consumes these structures.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static disposition of an action in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    /// May proceed without ceremony.
    Allowed,
    /// May proceed only with approval from the action's authority.
    Restricted,
    /// Never proceeds.
    Forbidden,
    /// Never proceeds without an explicit override.
    ForbiddenWithoutOverride,
}

impl ActionStatus {
    /// Whether this status forbids the action outright.
    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            ActionStatus::Forbidden | ActionStatus::ForbiddenWithoutOverride
        )
    }
}

/// One action in the governed catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Catalog identifier, e.g. `"deploy_service"`.
    pub id: String,
    /// The action's CAES string, e.g. `"C2-A1-E2-S2"`.
    pub caes: String,
    /// What the action does.
    #[serde(default)]
    pub description: String,
    /// Authority level required to approve the action, e.g. `"A3-APPROVE"`.
    pub authority: String,
    pub status: ActionStatus,
    /// Action id this one escalates to when validation fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalates_to: Option<String>,
}

/// A constraint set — the MRCC (hard, blocking) and NCC (advisory) share
/// this shape; only the enforcement differs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Maximum classification level, e.g. `"C3"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_classification: Option<String>,
    /// Maximum scope level, e.g. `"S2-DOMAIN"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scope: Option<String>,
    /// Maximum effect level, e.g. `"E3-COMPENSATE"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_effect: Option<String>,
    /// Action ids that are never allowed under this set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbidden_actions: Vec<String>,
    /// Action ids preferred over their alternatives.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_actions: Vec<String>,
    /// Action ids to steer away from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discouraged_actions: Vec<String>,
    /// Rate-limit ceilings keyed by counter name, e.g. `"C2_per_hour"` or
    /// `"total_per_minute"`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rate_limits: BTreeMap<String, u32>,
}

/// Monotonic property: the agent's autonomy level must not grow while the
/// epoch is active.
pub const AUTONOMY_LEVEL_CANNOT_INCREASE: &str = "autonomy_level_cannot_increase";
/// Monotonic property: actions forbidden at epoch start stay forbidden.
pub const FORBIDDEN_STAYS_FORBIDDEN: &str = "forbidden_stays_forbidden";
/// Monotonic property: the audit trail cannot be switched off.
pub const AUDIT_CANNOT_DISABLE: &str = "audit_cannot_disable";

/// The catalog action that widens the agent's autonomy; named here because
/// `autonomy_level_cannot_increase` forbids it by id.
pub const AUTONOMY_EXPANSION_ACTION: &str = "expand_autonomy";

/// A bounded policy regime with invariants that must hold going forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    pub id: String,
    pub started: DateTime<Utc>,
    #[serde(default)]
    pub policy_hash: String,
    /// Named invariants in force; violating one is always CRITICAL.
    #[serde(default)]
    pub monotonic_properties: Vec<String>,
}

impl Epoch {
    /// Create an epoch starting now with the given monotonic properties.
    pub fn new(
        id: impl Into<String>,
        monotonic_properties: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            id: id.into(),
            started: Utc::now(),
            policy_hash: String::new(),
            monotonic_properties: monotonic_properties.into_iter().collect(),
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.monotonic_properties.iter().any(|p| p == name)
    }
}

/// The full governance configuration consumed by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpace {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    #[serde(default)]
    pub mrcc: ConstraintSet,
    #[serde(default)]
    pub ncc: ConstraintSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_epoch: Option<Epoch>,
}

impl ActionSpace {
    /// An action space with no actions and no constraints.
    pub fn empty() -> Self {
        Self {
            version: "0".to_string(),
            description: None,
            actions: Vec::new(),
            mrcc: ConstraintSet::default(),
            ncc: ConstraintSet::default(),
            current_epoch: None,
        }
    }

    /// Look up an action definition by id.
    pub fn find(&self, action_id: &str) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| a.id == action_id)
    }
}

impl Default for ActionSpace {
    fn default() -> Self {
        Self::empty()
    }
}
