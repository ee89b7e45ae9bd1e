// health.rs — Health probes and auto-rollback.
//
// Three fixed probes: the learning state is structurally valid, at least
// one checkpoint exists, and at least three guards are enabled. One failed
// probe degrades health; two or more trigger rollback to the most recent
// checkpoint.

use serde::{Deserialize, Serialize};

use gv_learning::LearningEngine;

use crate::error::CheckpointError;
use crate::guard::GuardTable;
use crate::store::{CheckpointStore, Rollback};

/// Enabled guards below this count fail the guard probe.
const MIN_ENABLED_GUARDS: usize = 3;

/// Failed probes at or above this count trigger auto-rollback.
const ROLLBACK_FAILURE_THRESHOLD: usize = 2;

/// One probe's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate health verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Every probe passed.
    pub healthy: bool,
    pub checks: Vec<HealthCheck>,
    /// Two or more probes failed.
    pub should_rollback: bool,
}

/// Run the three fixed health probes.
pub fn run_health_check(
    engine: &LearningEngine,
    store: &CheckpointStore,
    guards: &GuardTable,
) -> HealthCheckResult {
    let checks = vec![
        HealthCheck {
            name: "learning_state_valid".to_string(),
            passed: engine.state().is_structurally_valid(),
            message: None,
        },
        HealthCheck {
            name: "checkpoints_exist".to_string(),
            passed: !store.is_empty(),
            message: Some(format!("{} checkpoints available", store.len())),
        },
        HealthCheck {
            name: "guards_active".to_string(),
            passed: guards.enabled_count() >= MIN_ENABLED_GUARDS,
            message: Some(format!("{} guards active", guards.enabled_count())),
        },
    ];

    let failed = checks.iter().filter(|c| !c.passed).count();
    HealthCheckResult {
        healthy: failed == 0,
        should_rollback: failed >= ROLLBACK_FAILURE_THRESHOLD,
        checks,
    }
}

/// Roll back to the most recent checkpoint when health demands it.
///
/// Returns `None` when no rollback is needed. When rollback is needed but
/// no checkpoint exists, returns `Some(Err(NoCheckpoints))`.
pub fn auto_rollback_if_needed(
    store: &mut CheckpointStore,
    engine: &mut LearningEngine,
    guards: &GuardTable,
) -> Option<Result<Rollback, CheckpointError>> {
    let health = run_health_check(engine, store, guards);
    if !health.should_rollback {
        return None;
    }

    let Some(latest_id) = store.latest().map(|c| c.id) else {
        return Some(Err(CheckpointError::NoCheckpoints));
    };

    tracing::warn!("health degraded; auto-rolling back to checkpoint {latest_id}");
    Some(store.rollback(&latest_id, engine))
}
