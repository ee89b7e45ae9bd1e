// guard.rs — Self-modification guards.
//
// The guard table is ordered data, not code: rules are evaluated in list
// order and the first enabled rule matching the target decides. Hosts can
// enable, disable, and append rules without touching the evaluation logic.

use serde::{Deserialize, Serialize};

/// What category of protection a guard provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardType {
    /// Allow the modification, but only after a checkpoint is taken.
    RequireCheckpoint,
    /// The modification needs human approval.
    RequireApproval,
    /// Frequency-bounded modifications; evaluated by the host's rate
    /// tracking, never decisive here.
    RateLimit,
    /// The target must never be modified.
    Forbidden,
}

/// What the guard tells the caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardAction {
    Block,
    CheckpointThenAllow,
    Escalate,
    LogOnly,
}

/// One standing rule intercepting modification of a named target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationGuard {
    pub id: String,
    pub guard_type: GuardType,
    /// The thing being protected, e.g. `"learning_state"`.
    pub target: String,
    /// Informational condition label, e.g. `"any_modification"`.
    pub condition: String,
    pub action: GuardAction,
    pub enabled: bool,
}

/// The verdict for one modification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardCheckResult {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<GuardAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_id: Option<String>,
    #[serde(default)]
    pub requires_checkpoint: bool,
}

impl GuardCheckResult {
    fn unconditionally_allowed() -> Self {
        Self {
            allowed: true,
            action: None,
            reason: None,
            guard_id: None,
            requires_checkpoint: false,
        }
    }
}

/// The ordered rule list, evaluated first-match-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardTable {
    guards: Vec<ModificationGuard>,
}

impl Default for GuardTable {
    /// The standing rule set protecting the governance core itself.
    fn default() -> Self {
        Self {
            guards: vec![
                ModificationGuard {
                    id: "guard-1".to_string(),
                    guard_type: GuardType::RequireCheckpoint,
                    target: "learning_state".to_string(),
                    condition: "any_modification".to_string(),
                    action: GuardAction::CheckpointThenAllow,
                    enabled: true,
                },
                ModificationGuard {
                    id: "guard-2".to_string(),
                    guard_type: GuardType::Forbidden,
                    target: "autonomy_boundaries".to_string(),
                    condition: "any_modification".to_string(),
                    action: GuardAction::Block,
                    enabled: true,
                },
                ModificationGuard {
                    id: "guard-3".to_string(),
                    guard_type: GuardType::RequireApproval,
                    target: "mrcc_constraints".to_string(),
                    condition: "any_modification".to_string(),
                    action: GuardAction::Escalate,
                    enabled: true,
                },
                ModificationGuard {
                    id: "guard-4".to_string(),
                    guard_type: GuardType::RateLimit,
                    target: "policy_proposals".to_string(),
                    condition: "more_than_10_per_hour".to_string(),
                    action: GuardAction::Block,
                    enabled: true,
                },
            ],
        }
    }
}

impl GuardTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with no rules at all; everything is allowed.
    pub fn unguarded() -> Self {
        Self { guards: Vec::new() }
    }

    /// Check whether a target may be modified. The first enabled rule
    /// matching the target decides; rate-limit rules are informational and
    /// never decide. With no matching enabled rule the modification is
    /// unconditionally allowed.
    pub fn check_modification(&self, target: &str) -> GuardCheckResult {
        for guard in self.guards.iter().filter(|g| g.enabled && g.target == target) {
            match guard.guard_type {
                GuardType::Forbidden => {
                    return GuardCheckResult {
                        allowed: false,
                        action: Some(GuardAction::Block),
                        reason: Some(format!("modification of '{target}' is forbidden")),
                        guard_id: Some(guard.id.clone()),
                        requires_checkpoint: false,
                    };
                }
                GuardType::RequireApproval => {
                    return GuardCheckResult {
                        allowed: false,
                        action: Some(GuardAction::Escalate),
                        reason: Some(format!("modification of '{target}' requires approval")),
                        guard_id: Some(guard.id.clone()),
                        requires_checkpoint: false,
                    };
                }
                GuardType::RequireCheckpoint => {
                    return GuardCheckResult {
                        allowed: true,
                        action: Some(GuardAction::CheckpointThenAllow),
                        reason: Some(format!(
                            "checkpoint required before modifying '{target}'"
                        )),
                        guard_id: Some(guard.id.clone()),
                        requires_checkpoint: true,
                    };
                }
                GuardType::RateLimit => continue,
            }
        }

        GuardCheckResult::unconditionally_allowed()
    }

    pub fn guards(&self) -> &[ModificationGuard] {
        &self.guards
    }

    /// Append a rule at the end of the evaluation order.
    pub fn add(&mut self, guard: ModificationGuard) {
        self.guards.push(guard);
    }

    /// Enable or disable a rule by id. Returns false for unknown ids.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.guards.iter_mut().find(|g| g.id == id) {
            Some(guard) => {
                guard.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn enabled_count(&self) -> usize {
        self.guards.iter().filter(|g| g.enabled).count()
    }
}
