// enforcer.rs — Enforcement decisions and cross-domain arbitration.
//
// Outcome rules, in precedence order:
//
//   1. Validation failed → ESCALATED if the action declares escalates_to,
//      otherwise BLOCKED. (Invalid beats RESTRICTED.)
//   2. Valid and RESTRICTED → ESCALATED, approval required from the
//      action's authority.
//   3. Valid otherwise → ALLOWED.
//
// checkpoint_required is orthogonal to the outcome: any action whose
// classification level is 2 or higher needs a checkpoint before it runs.

use gv_caes::{level, CaesCode};
use gv_policy::{validate_action, ActionSpace, ActionStatus, ValidatorContext};
use gv_violations::{Violation, ViolationStore};
use serde::{Deserialize, Serialize};

use crate::event::{AuditEvent, EnforcementOutcome};

/// Classification level at which a pre-action checkpoint becomes mandatory.
const CHECKPOINT_CLASSIFICATION_LEVEL: i8 = 2;

/// CAES placeholder for actions outside the catalog.
const UNKNOWN_CAES: &str = "UNKNOWN";

/// What to enforce against: one action space plus the policy references
/// recorded into the audit trail.
#[derive(Debug, Clone)]
pub struct EnforcerConfig<'a> {
    pub action_space: &'a ActionSpace,
    pub policy_refs: Vec<String>,
}

/// The auditable outcome of enforcing one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementResult {
    pub action_id: String,
    pub outcome: EnforcementOutcome,
    pub audit_event: AuditEvent,
    /// Violations found during validation (also persisted to the store).
    pub violations: Vec<Violation>,
    /// Authority levels that must approve before the action proceeds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_approval: Vec<String>,
    /// Whether a checkpoint must be taken before the action runs.
    pub checkpoint_required: bool,
}

/// Enforce one action: validate, persist violations, decide the outcome,
/// and emit an audit event.
pub fn enforce_action(
    action_id: &str,
    config: &EnforcerConfig<'_>,
    context: &ValidatorContext,
    store: &mut ViolationStore,
) -> EnforcementResult {
    let validation = validate_action(action_id, config.action_space, context);

    for violation in &validation.violations {
        store.capture(violation.clone());
    }

    let action = config.action_space.find(action_id);
    let mut requires_approval: Vec<String> = Vec::new();

    let outcome = if !validation.valid {
        if action.is_some_and(|a| a.escalates_to.is_some()) {
            EnforcementOutcome::Escalated
        } else {
            EnforcementOutcome::Blocked
        }
    } else {
        match action {
            Some(a) if a.status == ActionStatus::Restricted => {
                requires_approval.push(a.authority.clone());
                EnforcementOutcome::Escalated
            }
            Some(_) => EnforcementOutcome::Allowed,
            // A valid result implies the action exists; fail closed anyway.
            None => EnforcementOutcome::Blocked,
        }
    };

    let checkpoint_required = action
        .and_then(|a| CaesCode::parse(&a.caes).ok())
        .is_some_and(|caes| level(&caes.classification) >= CHECKPOINT_CLASSIFICATION_LEVEL);

    match outcome {
        EnforcementOutcome::Blocked => {
            tracing::info!("action '{}' blocked for actor '{}'", action_id, context.actor);
        }
        EnforcementOutcome::Escalated => {
            tracing::info!(
                "action '{}' escalated for actor '{}'",
                action_id,
                context.actor
            );
        }
        EnforcementOutcome::Allowed => {}
    }

    let audit_event = AuditEvent::new(
        action_id,
        action.map_or(UNKNOWN_CAES, |a| a.caes.as_str()),
        context.actor.clone(),
        outcome,
        config.policy_refs.clone(),
    );

    EnforcementResult {
        action_id: action_id.to_string(),
        outcome,
        audit_event,
        violations: validation.violations,
        requires_approval,
        checkpoint_required,
    }
}

/// Enforce a batch of actions independently.
pub fn enforce_actions(
    action_ids: &[&str],
    config: &EnforcerConfig<'_>,
    context: &ValidatorContext,
    store: &mut ViolationStore,
) -> Vec<EnforcementResult> {
    action_ids
        .iter()
        .map(|id| enforce_action(id, config, context, store))
        .collect()
}

/// One governance domain participating in cross-domain enforcement.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    pub domain: String,
    pub action_space: ActionSpace,
    /// Higher priority is consulted first and can veto lower priorities.
    pub priority: i32,
}

/// Enforce an action across multiple governance domains.
///
/// Domains are consulted in descending priority (stable: ties keep input
/// order). A BLOCKED verdict anywhere wins immediately. The first ESCALATED
/// verdict stands unless a remaining domain blocks. When every domain
/// allows, the action is re-enforced against the highest-priority domain's
/// space with policy references aggregated across all domains.
pub fn enforce_cross_domain(
    action_id: &str,
    domains: &[DomainPolicy],
    context: &ValidatorContext,
    store: &mut ViolationStore,
) -> EnforcementResult {
    let mut sorted: Vec<&DomainPolicy> = domains.iter().collect();
    sorted.sort_by(|a, b| b.priority.cmp(&a.priority));

    for (position, domain) in sorted.iter().enumerate() {
        let result = enforce_domain(action_id, domain, context, store);
        match result.outcome {
            EnforcementOutcome::Blocked => return result,
            EnforcementOutcome::Escalated => {
                // A lower-priority domain may still hold a harder veto.
                for remaining in &sorted[position + 1..] {
                    let remaining_result = enforce_domain(action_id, remaining, context, store);
                    if remaining_result.outcome == EnforcementOutcome::Blocked {
                        return remaining_result;
                    }
                }
                return result;
            }
            EnforcementOutcome::Allowed => {}
        }
    }

    let aggregated_refs: Vec<String> = sorted
        .iter()
        .map(|d| format!("{}:policy", d.domain))
        .collect();
    let empty = ActionSpace::empty();
    let space = sorted.first().map_or(&empty, |d| &d.action_space);
    enforce_action(
        action_id,
        &EnforcerConfig {
            action_space: space,
            policy_refs: aggregated_refs,
        },
        context,
        store,
    )
}

fn enforce_domain(
    action_id: &str,
    domain: &DomainPolicy,
    context: &ValidatorContext,
    store: &mut ViolationStore,
) -> EnforcementResult {
    enforce_action(
        action_id,
        &EnforcerConfig {
            action_space: &domain.action_space,
            policy_refs: vec![format!("{}:policy", domain.domain)],
        },
        context,
        store,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_policy::ActionDefinition;
    use gv_violations::{ViolationSeverity, ViolationType};

    fn action(id: &str, caes: &str, status: ActionStatus) -> ActionDefinition {
        ActionDefinition {
            id: id.to_string(),
            caes: caes.to_string(),
            description: String::new(),
            authority: "A3-APPROVE".to_string(),
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

    fn config(space: &ActionSpace) -> EnforcerConfig<'_> {
        EnforcerConfig {
            action_space: space,
            policy_refs: vec!["core:policy".to_string()],
        }
    }

    fn ctx() -> ValidatorContext {
        ValidatorContext::for_actor("agent-1")
    }

    #[test]
    fn forbidden_action_is_blocked_with_audit_and_persisted_violations() {
        let mut space = space_with(vec![action(
            "expand_autonomy",
            "C5-A4-E5-S4",
            ActionStatus::Forbidden,
        )]);
        space.mrcc.forbidden_actions = vec!["expand_autonomy".to_string()];
        let mut store = ViolationStore::new();

        let result = enforce_action("expand_autonomy", &config(&space), &ctx(), &mut store);

        assert_eq!(result.outcome, EnforcementOutcome::Blocked);
        assert_eq!(result.audit_event.outcome, EnforcementOutcome::Blocked);
        assert_eq!(result.audit_event.caes, "C5-A4-E5-S4");
        // Status violation (HIGH) and MRCC forbidden-list violation (CRITICAL).
        assert_eq!(result.violations.len(), 2);
        assert_eq!(store.len(), 2);
        assert!(store.all().iter().any(|v| {
            v.violation_type == ViolationType::ForbiddenAction
                && v.severity == ViolationSeverity::Critical
        }));
    }

    #[test]
    fn allowed_action_with_c2_requires_checkpoint() {
        let mut space = space_with(vec![action(
            "flag_violation",
            "C2-A1-E2-S2",
            ActionStatus::Allowed,
        )]);
        space.mrcc.max_classification = Some("C3".to_string());
        let mut store = ViolationStore::new();

        let result = enforce_action("flag_violation", &config(&space), &ctx(), &mut store);

        assert_eq!(result.outcome, EnforcementOutcome::Allowed);
        assert!(result.checkpoint_required);
        assert!(result.requires_approval.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn low_classification_needs_no_checkpoint() {
        let space = space_with(vec![action("read_logs", "C1-A0-E0-S0", ActionStatus::Allowed)]);
        let mut store = ViolationStore::new();
        let result = enforce_action("read_logs", &config(&space), &ctx(), &mut store);
        assert!(!result.checkpoint_required);
    }

    #[test]
    fn checkpoint_required_is_independent_of_outcome() {
        // Even a blocked C5 action reports checkpoint_required.
        let space = space_with(vec![action(
            "self_modify",
            "C5-A5-E5-S5",
            ActionStatus::Forbidden,
        )]);
        let mut store = ViolationStore::new();
        let result = enforce_action("self_modify", &config(&space), &ctx(), &mut store);
        assert_eq!(result.outcome, EnforcementOutcome::Blocked);
        assert!(result.checkpoint_required);
    }

    #[test]
    fn restricted_action_escalates_with_required_authority() {
        let space = space_with(vec![action(
            "deploy_service",
            "C2-A3-E2-S2",
            ActionStatus::Restricted,
        )]);
        let mut store = ViolationStore::new();

        let result = enforce_action("deploy_service", &config(&space), &ctx(), &mut store);

        assert_eq!(result.outcome, EnforcementOutcome::Escalated);
        assert_eq!(result.requires_approval, vec!["A3-APPROVE".to_string()]);
    }

    #[test]
    fn invalid_action_with_escalation_path_escalates() {
        let mut forbidden = action("risky_rollout", "C4-A4-E4-S3", ActionStatus::Forbidden);
        forbidden.escalates_to = Some("staged_rollout".to_string());
        let space = space_with(vec![forbidden]);
        let mut store = ViolationStore::new();

        let result = enforce_action("risky_rollout", &config(&space), &ctx(), &mut store);

        assert_eq!(result.outcome, EnforcementOutcome::Escalated);
        // Invalid path: approval list stays empty even though an authority exists.
        assert!(result.requires_approval.is_empty());
    }

    #[test]
    fn invalid_restricted_action_is_blocked() {
        // Invalid beats RESTRICTED: a restricted action in the MRCC
        // forbidden list blocks rather than escalating for approval.
        let mut space = space_with(vec![action(
            "deploy_service",
            "C2-A3-E2-S2",
            ActionStatus::Restricted,
        )]);
        space.mrcc.forbidden_actions = vec!["deploy_service".to_string()];
        let mut store = ViolationStore::new();

        let result = enforce_action("deploy_service", &config(&space), &ctx(), &mut store);

        assert_eq!(result.outcome, EnforcementOutcome::Blocked);
        assert!(result.requires_approval.is_empty());
    }

    #[test]
    fn unknown_action_is_blocked_with_unknown_caes() {
        let space = space_with(vec![]);
        let mut store = ViolationStore::new();
        let result = enforce_action("ghost", &config(&space), &ctx(), &mut store);

        assert_eq!(result.outcome, EnforcementOutcome::Blocked);
        assert_eq!(result.audit_event.caes, "UNKNOWN");
        assert!(!result.checkpoint_required);
    }

    #[test]
    fn repeat_enforcement_produces_independent_audit_events() {
        let space = space_with(vec![action(
            "wipe_disk",
            "C4-A4-E5-S4",
            ActionStatus::Forbidden,
        )]);
        let mut store = ViolationStore::new();

        let first = enforce_action("wipe_disk", &config(&space), &ctx(), &mut store);
        let second = enforce_action("wipe_disk", &config(&space), &ctx(), &mut store);

        assert_ne!(first.audit_event.id, second.audit_event.id);
        assert_eq!(first.audit_event.outcome, EnforcementOutcome::Blocked);
        assert_eq!(second.audit_event.outcome, EnforcementOutcome::Blocked);
    }

    #[test]
    fn batch_enforcement_maps_each_action() {
        let space = space_with(vec![
            action("read_logs", "C0-A0-E0-S0", ActionStatus::Allowed),
            action("wipe_disk", "C4-A4-E5-S4", ActionStatus::Forbidden),
        ]);
        let mut store = ViolationStore::new();

        let results = enforce_actions(&["read_logs", "wipe_disk"], &config(&space), &ctx(), &mut store);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].outcome, EnforcementOutcome::Allowed);
        assert_eq!(results[1].outcome, EnforcementOutcome::Blocked);
    }

    // ── Cross-domain enforcement ──

    fn permissive_domain(priority: i32) -> DomainPolicy {
        DomainPolicy {
            domain: "permissive".to_string(),
            action_space: space_with(vec![action(
                "flag_violation",
                "C2-A1-E2-S2",
                ActionStatus::Allowed,
            )]),
            priority,
        }
    }

    fn restrictive_domain(priority: i32) -> DomainPolicy {
        let mut space = space_with(vec![action(
            "flag_violation",
            "C2-A1-E2-S2",
            ActionStatus::Forbidden,
        )]);
        space.mrcc.forbidden_actions = vec!["flag_violation".to_string()];
        DomainPolicy {
            domain: "restrictive".to_string(),
            action_space: space,
            priority,
        }
    }

    #[test]
    fn higher_priority_domain_vetoes() {
        let domains = vec![permissive_domain(1), restrictive_domain(10)];
        let mut store = ViolationStore::new();

        let result = enforce_cross_domain("flag_violation", &domains, &ctx(), &mut store);

        assert_eq!(result.outcome, EnforcementOutcome::Blocked);
        assert_eq!(
            result.audit_event.policy_refs,
            vec!["restrictive:policy".to_string()]
        );
    }

    #[test]
    fn escalation_yields_to_a_later_block() {
        let restricted = DomainPolicy {
            domain: "staging".to_string(),
            action_space: space_with(vec![action(
                "flag_violation",
                "C2-A3-E2-S2",
                ActionStatus::Restricted,
            )]),
            priority: 10,
        };
        let domains = vec![restricted, restrictive_domain(1)];
        let mut store = ViolationStore::new();

        let result = enforce_cross_domain("flag_violation", &domains, &ctx(), &mut store);

        assert_eq!(result.outcome, EnforcementOutcome::Blocked);
        assert_eq!(
            result.audit_event.policy_refs,
            vec!["restrictive:policy".to_string()]
        );
    }

    #[test]
    fn escalation_stands_when_no_domain_blocks() {
        let restricted = DomainPolicy {
            domain: "staging".to_string(),
            action_space: space_with(vec![action(
                "flag_violation",
                "C2-A3-E2-S2",
                ActionStatus::Restricted,
            )]),
            priority: 10,
        };
        let domains = vec![restricted, permissive_domain(1)];
        let mut store = ViolationStore::new();

        let result = enforce_cross_domain("flag_violation", &domains, &ctx(), &mut store);

        assert_eq!(result.outcome, EnforcementOutcome::Escalated);
        assert_eq!(
            result.audit_event.policy_refs,
            vec!["staging:policy".to_string()]
        );
    }

    #[test]
    fn all_allowing_domains_aggregate_policy_refs() {
        let other_permissive = DomainPolicy {
            domain: "secondary".to_string(),
            action_space: space_with(vec![action(
                "flag_violation",
                "C2-A1-E2-S2",
                ActionStatus::Allowed,
            )]),
            priority: 1,
        };
        let domains = vec![other_permissive, permissive_domain(5)];
        let mut store = ViolationStore::new();

        let result = enforce_cross_domain("flag_violation", &domains, &ctx(), &mut store);

        assert_eq!(result.outcome, EnforcementOutcome::Allowed);
        assert_eq!(
            result.audit_event.policy_refs,
            vec!["permissive:policy".to_string(), "secondary:policy".to_string()]
        );
    }

    #[test]
    fn empty_domain_list_blocks() {
        let mut store = ViolationStore::new();
        let result = enforce_cross_domain("flag_violation", &[], &ctx(), &mut store);
        assert_eq!(result.outcome, EnforcementOutcome::Blocked);
        assert!(result.audit_event.policy_refs.is_empty());
    }
}
