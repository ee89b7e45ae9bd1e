// validator.rs — Ordered policy checks for one action.
//
// Each `validate_action` call is a single pass over the check list; no state
// survives between calls. Every check appends a pass/fail record, and the
// failing checks that represent policy breaches also emit Violation records
// for the violation store. Overall validity is the AND of the check
// outcomes — recommendations never affect it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gv_caes::{level, CaesCode};
use gv_violations::{Violation, ViolationContext, ViolationSeverity, ViolationType};

use crate::space::{
    ActionDefinition, ActionSpace, ActionStatus, ConstraintSet, Epoch,
    AUTONOMY_EXPANSION_ACTION, AUTONOMY_LEVEL_CANNOT_INCREASE, FORBIDDEN_STAYS_FORBIDDEN,
};

/// Caller-supplied context for a validation pass.
///
/// Rate counters are provided per call rather than tracked here, so the
/// validator itself has no cross-call state to race on.
#[derive(Debug, Clone, Default)]
pub struct ValidatorContext {
    /// Who is attempting the action.
    pub actor: String,
    /// The epoch the caller believes is active, recorded into violations.
    pub epoch_id: Option<String>,
    /// Current counter values keyed like the MRCC `rate_limits` map.
    /// `None` skips rate checking entirely.
    pub rate_counts: Option<BTreeMap<String, u32>>,
}

impl ValidatorContext {
    pub fn for_actor(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            ..Self::default()
        }
    }
}

/// One pass/fail record in the check list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCheck {
    /// Which check ran (e.g. `"action_status"`, `"mrcc_classification"`).
    pub check: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PolicyCheck {
    fn pass(check: &str) -> Self {
        Self {
            check: check.to_string(),
            ok: true,
            reason: None,
        }
    }

    fn pass_with(check: &str, reason: String) -> Self {
        Self {
            check: check.to_string(),
            ok: true,
            reason: Some(reason),
        }
    }

    fn fail(check: &str, reason: String) -> Self {
        Self {
            check: check.to_string(),
            ok: false,
            reason: Some(reason),
        }
    }
}

/// The outcome of validating one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// AND of all check outcomes.
    pub valid: bool,
    pub action_id: String,
    /// Every check that ran, in order.
    pub checks: Vec<PolicyCheck>,
    /// Violations emitted by failing checks.
    pub violations: Vec<Violation>,
    /// Advisory notes (NCC); never affect validity.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

/// Validate one action against the action space.
pub fn validate_action(
    action_id: &str,
    space: &ActionSpace,
    context: &ValidatorContext,
) -> ValidationResult {
    let mut checks: Vec<PolicyCheck> = Vec::new();
    let mut violations: Vec<Violation> = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();

    // Unknown actions short-circuit everything else.
    let Some(action) = space.find(action_id) else {
        checks.push(PolicyCheck::fail(
            "action_exists",
            format!("action '{action_id}' not found in action space"),
        ));
        return ValidationResult {
            valid: false,
            action_id: action_id.to_string(),
            checks,
            violations,
            recommendations,
        };
    };
    checks.push(PolicyCheck::pass("action_exists"));

    // Static status.
    let status_check = check_action_status(action);
    let status_ok = status_check.ok;
    checks.push(status_check);
    if !status_ok {
        violations.push(make_violation(
            action,
            ViolationType::ForbiddenAction,
            ViolationSeverity::High,
            context,
        ));
    }

    // MRCC ceiling and forbidden list.
    check_mrcc(action, &space.mrcc, context, &mut checks, &mut violations);

    // Rate limits, only when the caller supplied counters.
    if let Some(rate_counts) = &context.rate_counts {
        let (check, violation) = check_rate_limits(action, &space.mrcc, rate_counts);
        checks.push(check);
        violations.extend(violation);
    }

    // Epoch monotonic properties.
    if let Some(epoch) = &space.current_epoch {
        let epoch_check = check_epoch(action, epoch);
        let epoch_ok = epoch_check.ok;
        checks.push(epoch_check);
        if !epoch_ok {
            violations.push(make_violation(
                action,
                ViolationType::EpochViolation,
                ViolationSeverity::Critical,
                context,
            ));
        }
    }

    // NCC is advisory only.
    if space.ncc.discouraged_actions.iter().any(|a| a == action_id) {
        recommendations.push(format!(
            "Action '{action_id}' is discouraged by NCC. Consider alternatives."
        ));
    }

    let valid = checks.iter().all(|c| c.ok);
    ValidationResult {
        valid,
        action_id: action_id.to_string(),
        checks,
        violations,
        recommendations,
    }
}

/// Validate a batch of actions independently.
pub fn validate_actions(
    action_ids: &[&str],
    space: &ActionSpace,
    context: &ValidatorContext,
) -> Vec<ValidationResult> {
    action_ids
        .iter()
        .map(|id| validate_action(id, space, context))
        .collect()
}

/// All non-forbidden actions whose CAES parses and fits inside the MRCC
/// maxima. Absent maxima default to the top of each axis.
pub fn allowed_actions(space: &ActionSpace) -> Vec<&ActionDefinition> {
    space
        .actions
        .iter()
        .filter(|action| {
            if action.status.is_forbidden() {
                return false;
            }
            let Ok(caes) = CaesCode::parse(&action.caes) else {
                return false;
            };
            caes.is_within(
                space.mrcc.max_classification.as_deref().unwrap_or("C5"),
                space.mrcc.max_scope.as_deref().unwrap_or("S5"),
                space.mrcc.max_effect.as_deref().unwrap_or("E5"),
            )
        })
        .collect()
}

fn check_action_status(action: &ActionDefinition) -> PolicyCheck {
    match action.status {
        ActionStatus::Forbidden => PolicyCheck::fail(
            "action_status",
            format!("action '{}' is FORBIDDEN", action.id),
        ),
        ActionStatus::ForbiddenWithoutOverride => PolicyCheck::fail(
            "action_status",
            format!("action '{}' requires explicit override", action.id),
        ),
        ActionStatus::Restricted => PolicyCheck::pass_with(
            "action_status",
            format!("action '{}' is RESTRICTED (approval required)", action.id),
        ),
        ActionStatus::Allowed => PolicyCheck::pass("action_status"),
    }
}

fn check_mrcc(
    action: &ActionDefinition,
    mrcc: &ConstraintSet,
    context: &ValidatorContext,
    checks: &mut Vec<PolicyCheck>,
    violations: &mut Vec<Violation>,
) {
    let caes = match CaesCode::parse(&action.caes) {
        Ok(caes) => {
            checks.push(PolicyCheck::pass("caes_parse"));
            Some(caes)
        }
        Err(_) => {
            // An unparsable code closes the bound checks only; the
            // forbidden-list check below still runs.
            checks.push(PolicyCheck::fail(
                "caes_parse",
                format!("invalid CAES code: {}", action.caes),
            ));
            None
        }
    };

    if let Some(caes) = &caes {
        if let Some(max_c) = &mrcc.max_classification {
            let ok = level(&caes.classification) <= level(max_c);
            if ok {
                checks.push(PolicyCheck::pass("mrcc_classification"));
            } else {
                checks.push(PolicyCheck::fail(
                    "mrcc_classification",
                    format!("{} exceeds max {max_c}", caes.classification),
                ));
                violations.push(make_violation(
                    action,
                    ViolationType::MrccExceeded,
                    ViolationSeverity::High,
                    context,
                ));
            }
        }

        if let Some(max_s) = &mrcc.max_scope {
            let ok = level(&caes.scope) <= level(max_s);
            if ok {
                checks.push(PolicyCheck::pass("mrcc_scope"));
            } else {
                checks.push(PolicyCheck::fail(
                    "mrcc_scope",
                    format!("{} exceeds max {max_s}", caes.scope),
                ));
                violations.push(make_violation(
                    action,
                    ViolationType::ScopeExceeded,
                    ViolationSeverity::High,
                    context,
                ));
            }
        }

        // Effect excess fails the check but emits no violation record.
        if let Some(max_e) = &mrcc.max_effect {
            let ok = level(&caes.effect) <= level(max_e);
            if ok {
                checks.push(PolicyCheck::pass("mrcc_effect"));
            } else {
                checks.push(PolicyCheck::fail(
                    "mrcc_effect",
                    format!("{} exceeds max {max_e}", caes.effect),
                ));
            }
        }
    }

    if mrcc.forbidden_actions.iter().any(|a| a == &action.id) {
        checks.push(PolicyCheck::fail(
            "mrcc_forbidden",
            format!("action '{}' is in MRCC forbidden list", action.id),
        ));
        violations.push(make_violation(
            action,
            ViolationType::ForbiddenAction,
            ViolationSeverity::Critical,
            context,
        ));
    } else {
        checks.push(PolicyCheck::pass("mrcc_forbidden"));
    }
}

fn check_rate_limits(
    action: &ActionDefinition,
    mrcc: &ConstraintSet,
    rate_counts: &BTreeMap<String, u32>,
) -> (PolicyCheck, Option<Violation>) {
    if mrcc.rate_limits.is_empty() {
        return (PolicyCheck::pass("rate_limit"), None);
    }

    let Ok(caes) = CaesCode::parse(&action.caes) else {
        return (PolicyCheck::pass("rate_limit"), None);
    };

    // Per-classification hourly limit, then the overall per-minute limit.
    let class_key = format!("{}_per_hour", caes.classification);
    for key in [class_key.as_str(), "total_per_minute"] {
        if let Some(&limit) = mrcc.rate_limits.get(key) {
            let current = rate_counts.get(key).copied().unwrap_or(0);
            if current >= limit {
                let check = PolicyCheck::fail(
                    "rate_limit",
                    format!("rate limit exceeded: {current}/{limit} for {key}"),
                );
                let violation = Violation::new(
                    action.id.clone(),
                    action.caes.clone(),
                    ViolationType::RateLimit,
                    ViolationSeverity::Medium,
                    ViolationContext::for_actor("rate_checker"),
                );
                return (check, Some(violation));
            }
        }
    }

    (PolicyCheck::pass("rate_limit"), None)
}

fn check_epoch(action: &ActionDefinition, epoch: &Epoch) -> PolicyCheck {
    if CaesCode::parse(&action.caes).is_err() {
        return PolicyCheck::pass("epoch_monotonic");
    }

    if epoch.has_property(AUTONOMY_LEVEL_CANNOT_INCREASE)
        && action.id == AUTONOMY_EXPANSION_ACTION
    {
        return PolicyCheck::fail(
            "epoch_monotonic",
            format!("monotonic property violation: {AUTONOMY_LEVEL_CANNOT_INCREASE}"),
        );
    }

    if epoch.has_property(FORBIDDEN_STAYS_FORBIDDEN)
        && action.status == ActionStatus::Forbidden
    {
        return PolicyCheck::fail(
            "epoch_monotonic",
            format!("monotonic property violation: {FORBIDDEN_STAYS_FORBIDDEN}"),
        );
    }

    PolicyCheck::pass("epoch_monotonic")
}

fn make_violation(
    action: &ActionDefinition,
    violation_type: ViolationType,
    severity: ViolationSeverity,
    context: &ValidatorContext,
) -> Violation {
    Violation::new(
        action.id.clone(),
        action.caes.clone(),
        violation_type,
        severity,
        ViolationContext {
            actor: context.actor.clone(),
            epoch_id: context.epoch_id.clone(),
            ..ViolationContext::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::Epoch;

    fn action(id: &str, caes: &str, status: ActionStatus) -> ActionDefinition {
        ActionDefinition {
            id: id.to_string(),
            caes: caes.to_string(),
            description: String::new(),
            authority: "A1-NOTIFY".to_string(),
            status,
            escalates_to: None,
        }
    }

    fn space_with(actions: Vec<ActionDefinition>) -> ActionSpace {
        ActionSpace {
            version: "1.0.0".to_string(),
            actions,
            ..ActionSpace::empty()
        }
    }

    fn ctx() -> ValidatorContext {
        ValidatorContext::for_actor("agent-1")
    }

    fn check<'a>(result: &'a ValidationResult, name: &str) -> &'a PolicyCheck {
        result
            .checks
            .iter()
            .find(|c| c.check == name)
            .unwrap_or_else(|| panic!("missing check '{name}'"))
    }

    #[test]
    fn unknown_action_short_circuits() {
        let space = space_with(vec![]);
        let result = validate_action("missing", &space, &ctx());
        assert!(!result.valid);
        assert_eq!(result.checks.len(), 1);
        assert!(!check(&result, "action_exists").ok);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn allowed_action_passes_cleanly() {
        let space = space_with(vec![action("read_logs", "C0-A0-E0-S0", ActionStatus::Allowed)]);
        let result = validate_action("read_logs", &space, &ctx());
        assert!(result.valid);
        assert!(result.violations.is_empty());
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn forbidden_action_fails_with_high_violation() {
        let space = space_with(vec![action(
            "wipe_disk",
            "C4-A4-E5-S4",
            ActionStatus::Forbidden,
        )]);
        let result = validate_action("wipe_disk", &space, &ctx());
        assert!(!result.valid);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations[0].violation_type,
            ViolationType::ForbiddenAction
        );
        assert_eq!(result.violations[0].severity, ViolationSeverity::High);
    }

    #[test]
    fn forbidden_without_override_also_fails() {
        let space = space_with(vec![action(
            "drop_table",
            "C4-A4-E5-S3",
            ActionStatus::ForbiddenWithoutOverride,
        )]);
        let result = validate_action("drop_table", &space, &ctx());
        assert!(!result.valid);
        assert!(check(&result, "action_status")
            .reason
            .as_deref()
            .unwrap()
            .contains("override"));
    }

    #[test]
    fn restricted_action_passes_with_annotation() {
        let space = space_with(vec![action(
            "deploy_service",
            "C2-A3-E2-S2",
            ActionStatus::Restricted,
        )]);
        let result = validate_action("deploy_service", &space, &ctx());
        assert!(result.valid);
        assert!(check(&result, "action_status")
            .reason
            .as_deref()
            .unwrap()
            .contains("approval required"));
    }

    #[test]
    fn unparsable_caes_closes_bound_checks_only() {
        let mut space = space_with(vec![action("odd", "not-a-caes", ActionStatus::Allowed)]);
        space.mrcc.max_classification = Some("C3".to_string());
        let result = validate_action("odd", &space, &ctx());

        assert!(!result.valid);
        assert!(!check(&result, "caes_parse").ok);
        // Bound checks are skipped, the forbidden-list check still runs.
        assert!(result.checks.iter().all(|c| c.check != "mrcc_classification"));
        assert!(check(&result, "mrcc_forbidden").ok);
    }

    #[test]
    fn classification_excess_emits_mrcc_violation() {
        let mut space = space_with(vec![action("big", "C4-A2-E2-S2", ActionStatus::Allowed)]);
        space.mrcc.max_classification = Some("C3".to_string());
        let result = validate_action("big", &space, &ctx());

        assert!(!result.valid);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].violation_type, ViolationType::MrccExceeded);
        assert_eq!(result.violations[0].severity, ViolationSeverity::High);
    }

    #[test]
    fn scope_excess_emits_scope_violation() {
        let mut space = space_with(vec![action("wide", "C2-A2-E2-S4", ActionStatus::Allowed)]);
        space.mrcc.max_scope = Some("S2-DOMAIN".to_string());
        let result = validate_action("wide", &space, &ctx());

        assert!(!result.valid);
        assert_eq!(result.violations[0].violation_type, ViolationType::ScopeExceeded);
    }

    #[test]
    fn effect_excess_fails_check_without_violation() {
        let mut space = space_with(vec![action("perm", "C2-A2-E5-S2", ActionStatus::Allowed)]);
        space.mrcc.max_effect = Some("E3".to_string());
        let result = validate_action("perm", &space, &ctx());

        assert!(!result.valid);
        assert!(!check(&result, "mrcc_effect").ok);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn mrcc_forbidden_list_is_critical() {
        let mut space = space_with(vec![action(
            "expand_autonomy",
            "C5-A4-E5-S4",
            ActionStatus::Forbidden,
        )]);
        space.mrcc.forbidden_actions = vec!["expand_autonomy".to_string()];
        let result = validate_action("expand_autonomy", &space, &ctx());

        assert!(!result.valid);
        assert!(result.violations.iter().any(|v| {
            v.violation_type == ViolationType::ForbiddenAction
                && v.severity == ViolationSeverity::Critical
        }));
    }

    #[test]
    fn rate_checks_skip_without_counters() {
        let mut space = space_with(vec![action("chat", "C1-A0-E0-S0", ActionStatus::Allowed)]);
        space.mrcc.rate_limits.insert("C1_per_hour".to_string(), 1);
        let result = validate_action("chat", &space, &ctx());
        assert!(result.checks.iter().all(|c| c.check != "rate_limit"));
        assert!(result.valid);
    }

    #[test]
    fn classification_rate_limit_breach() {
        let mut space = space_with(vec![action("chat", "C1-A0-E0-S0", ActionStatus::Allowed)]);
        space.mrcc.rate_limits.insert("C1_per_hour".to_string(), 10);

        let mut context = ctx();
        context.rate_counts = Some(BTreeMap::from([("C1_per_hour".to_string(), 10)]));
        let result = validate_action("chat", &space, &context);

        assert!(!result.valid);
        assert_eq!(result.violations.len(), 1);
        let violation = &result.violations[0];
        assert_eq!(violation.violation_type, ViolationType::RateLimit);
        assert_eq!(violation.severity, ViolationSeverity::Medium);
        assert_eq!(violation.context.actor, "rate_checker");
    }

    #[test]
    fn total_rate_limit_breach() {
        let mut space = space_with(vec![action("chat", "C1-A0-E0-S0", ActionStatus::Allowed)]);
        space
            .mrcc
            .rate_limits
            .insert("total_per_minute".to_string(), 5);

        let mut context = ctx();
        context.rate_counts = Some(BTreeMap::from([("total_per_minute".to_string(), 6)]));
        let result = validate_action("chat", &space, &context);

        assert!(!result.valid);
        assert!(check(&result, "rate_limit")
            .reason
            .as_deref()
            .unwrap()
            .contains("total_per_minute"));
    }

    #[test]
    fn rate_limit_below_threshold_passes() {
        let mut space = space_with(vec![action("chat", "C1-A0-E0-S0", ActionStatus::Allowed)]);
        space.mrcc.rate_limits.insert("C1_per_hour".to_string(), 10);

        let mut context = ctx();
        context.rate_counts = Some(BTreeMap::from([("C1_per_hour".to_string(), 9)]));
        let result = validate_action("chat", &space, &context);
        assert!(result.valid);
    }

    #[test]
    fn epoch_forbids_autonomy_expansion() {
        let mut space = space_with(vec![action(
            "expand_autonomy",
            "C5-A4-E5-S4",
            ActionStatus::Allowed,
        )]);
        space.current_epoch = Some(Epoch::new(
            "epoch-1",
            [AUTONOMY_LEVEL_CANNOT_INCREASE.to_string()],
        ));
        let result = validate_action("expand_autonomy", &space, &ctx());

        assert!(!result.valid);
        assert!(result.violations.iter().any(|v| {
            v.violation_type == ViolationType::EpochViolation
                && v.severity == ViolationSeverity::Critical
        }));
    }

    #[test]
    fn epoch_keeps_forbidden_actions_forbidden() {
        let mut space = space_with(vec![action(
            "wipe_disk",
            "C4-A4-E5-S4",
            ActionStatus::Forbidden,
        )]);
        space.current_epoch = Some(Epoch::new(
            "epoch-1",
            [FORBIDDEN_STAYS_FORBIDDEN.to_string()],
        ));
        let result = validate_action("wipe_disk", &space, &ctx());

        assert!(!result.valid);
        assert!(result
            .violations
            .iter()
            .any(|v| v.violation_type == ViolationType::EpochViolation));
    }

    #[test]
    fn ncc_discouragement_is_advisory() {
        let mut space = space_with(vec![action("shortcut", "C1-A0-E1-S1", ActionStatus::Allowed)]);
        space.ncc.discouraged_actions = vec!["shortcut".to_string()];
        let result = validate_action("shortcut", &space, &ctx());

        assert!(result.valid);
        assert_eq!(result.recommendations.len(), 1);
        assert!(result.recommendations[0].contains("discouraged"));
    }

    #[test]
    fn batch_validation_is_independent() {
        let space = space_with(vec![
            action("ok", "C0-A0-E0-S0", ActionStatus::Allowed),
            action("bad", "C4-A4-E5-S4", ActionStatus::Forbidden),
        ]);
        let results = validate_actions(&["ok", "bad", "missing"], &space, &ctx());
        assert_eq!(results.len(), 3);
        assert!(results[0].valid);
        assert!(!results[1].valid);
        assert!(!results[2].valid);
    }

    #[test]
    fn allowed_actions_excludes_forbidden_statuses() {
        let mut space = space_with(vec![
            action("ok", "C1-A0-E1-S1", ActionStatus::Allowed),
            action("restricted", "C2-A3-E2-S2", ActionStatus::Restricted),
            action("forbidden", "C1-A0-E1-S1", ActionStatus::Forbidden),
            action("override_only", "C1-A0-E1-S1", ActionStatus::ForbiddenWithoutOverride),
        ]);
        space.mrcc.max_classification = Some("C5".to_string());

        let allowed = allowed_actions(&space);
        let ids: Vec<&str> = allowed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "restricted"]);
    }

    #[test]
    fn allowed_actions_respects_mrcc_maxima() {
        let mut space = space_with(vec![
            action("small", "C1-A0-E1-S1", ActionStatus::Allowed),
            action("large", "C4-A2-E2-S2", ActionStatus::Allowed),
            action("unparsable", "garbage", ActionStatus::Allowed),
        ]);
        space.mrcc.max_classification = Some("C2".to_string());

        let ids: Vec<&str> = allowed_actions(&space).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["small"]);
    }

    #[test]
    fn forbidden_expand_autonomy_is_critically_invalid() {
        // expand_autonomy, FORBIDDEN and MRCC-forbidden: invalid with a
        // CRITICAL forbidden-action violation.
        let mut space = space_with(vec![action(
            "expand_autonomy",
            "C5-A4-E5-S4",
            ActionStatus::Forbidden,
        )]);
        space.mrcc.forbidden_actions = vec!["expand_autonomy".to_string()];

        let result = validate_action("expand_autonomy", &space, &ctx());
        assert!(!result.valid);
        assert!(result.violations.iter().any(|v| {
            v.violation_type == ViolationType::ForbiddenAction
                && v.severity == ViolationSeverity::Critical
        }));
    }
}
