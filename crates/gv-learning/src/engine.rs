// engine.rs — The learning engine.
//
// Mines the violation store for escalating patterns, folds in operator
// feedback, drafts policy proposals, and benchmarks the action space
// against fixed structural controls. All mutation goes through the engine;
// the state itself is only handed out by reference (or wholesale, for
// checkpointing).

use chrono::Utc;
use uuid::Uuid;

use gv_caes::level;
use gv_policy::{ActionDefinition, ActionSpace, AUDIT_CANNOT_DISABLE, AUTONOMY_EXPANSION_ACTION};
use gv_violations::{ViolationPattern, ViolationStore, ViolationType};

use crate::state::{
    BenchmarkGap, BenchmarkResult, BenchmarkType, FeedbackRecord, FeedbackType, GapSeverity,
    LearnedPattern, LearningState, PatternType, PolicyProposal, ProposalStatus, ProposalType,
    SuggestedAction,
};

/// Minimum confidence for a pattern to yield a proposal.
const PROPOSAL_CONFIDENCE_FLOOR: f64 = 0.5;

/// Owns and evolves the learning state.
#[derive(Debug, Default)]
pub struct LearningEngine {
    state: LearningState,
}

impl LearningEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the current state.
    pub fn state(&self) -> &LearningState {
        &self.state
    }

    /// Throw everything away and start from the initial state.
    pub fn reset(&mut self) {
        self.state = LearningState::initial();
    }

    /// Mine the violation store for escalating patterns and fold them into
    /// the state. An existing learned pattern with the same
    /// `(action_id, violation_type)` key is replaced, not duplicated.
    /// Returns the patterns learned by this pass.
    pub fn learn_from_violations(&mut self, store: &ViolationStore) -> Vec<LearnedPattern> {
        let learned: Vec<LearnedPattern> = store
            .analyze_patterns()
            .into_iter()
            .filter(|p| p.should_escalate)
            .map(|p| LearnedPattern {
                id: Uuid::new_v4(),
                pattern_type: pattern_type_for(p.violation_type),
                action_id: p.action_id.clone(),
                violation_type: p.violation_type,
                frequency: p.count,
                first_seen: p.first_occurrence,
                last_seen: p.last_occurrence,
                confidence: confidence_for(&p),
                suggested_action: suggested_action_for(&p),
            })
            .collect();

        self.state.patterns.retain(|existing| {
            !learned
                .iter()
                .any(|l| l.action_id == existing.action_id
                    && l.violation_type == existing.violation_type)
        });
        self.state.patterns.extend(learned.iter().cloned());
        self.touch();

        learned
    }

    /// Record feedback and apply its weight delta to the action's
    /// tolerance, clamped to [-1, 1].
    pub fn record_feedback(
        &mut self,
        action_id: impl Into<String>,
        feedback_type: FeedbackType,
        source: impl Into<String>,
        reason: Option<String>,
    ) -> FeedbackRecord {
        let action_id = action_id.into();
        let delta = weight_delta(feedback_type);

        let record = FeedbackRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action_id: action_id.clone(),
            feedback_type,
            source: source.into(),
            reason,
            weight_adjustment: delta,
        };
        self.state.feedback.push(record.clone());

        let weight = self.state.weights.actions.entry(action_id).or_insert(0.0);
        *weight = (*weight + delta).clamp(-1.0, 1.0);

        self.touch();
        record
    }

    /// Draft a policy proposal from a learned pattern.
    ///
    /// Returns `None` when the pattern's confidence is below 0.5, the
    /// referenced action is not in the action space, or the suggested
    /// action has no proposal shape.
    pub fn generate_proposal(
        &mut self,
        pattern: &LearnedPattern,
        space: &ActionSpace,
    ) -> Option<PolicyProposal> {
        if pattern.confidence < PROPOSAL_CONFIDENCE_FLOOR {
            return None;
        }
        let action = space.find(&pattern.action_id)?;

        let proposal = match pattern.suggested_action {
            SuggestedAction::UpdatePolicy => classification_proposal(pattern, action),
            SuggestedAction::AdjustThreshold => threshold_proposal(pattern, action),
            SuggestedAction::AddException => exception_proposal(pattern, action),
            SuggestedAction::EscalateToOwner | SuggestedAction::NoAction => return None,
        };

        self.state.proposals.push(proposal.clone());
        self.touch();
        Some(proposal)
    }

    /// Evaluate the action space against the fixed structural controls of
    /// the given standard and record the result.
    pub fn run_benchmark(
        &mut self,
        space: &ActionSpace,
        benchmark_type: BenchmarkType,
    ) -> BenchmarkResult {
        let gaps = identify_gaps(space, benchmark_type);
        let deductions: u32 = gaps.iter().map(|g| g.severity.deduction()).sum();

        let result = BenchmarkResult {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            benchmark_type,
            standard: benchmark_type.standard_name().to_string(),
            score: 100u32.saturating_sub(deductions),
            gaps,
        };

        self.state.benchmarks.push(result.clone());
        self.touch();
        result
    }

    pub fn proposals_by_status(&self, status: ProposalStatus) -> Vec<&PolicyProposal> {
        self.state
            .proposals
            .iter()
            .filter(|p| p.status == status)
            .collect()
    }

    /// Move a proposal to a new status. Returns false for unknown ids.
    pub fn update_proposal_status(&mut self, proposal_id: &Uuid, status: ProposalStatus) -> bool {
        match self
            .state
            .proposals
            .iter_mut()
            .find(|p| &p.id == proposal_id)
        {
            Some(proposal) => {
                proposal.status = status;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Serialize the whole state as a single pretty-printed JSON document —
    /// the blob the checkpoint system snapshots.
    pub fn export_state(&self) -> String {
        serde_json::to_string_pretty(&self.state).expect("learning state serializes")
    }

    /// Wholesale-replace the state from a serialized document. On parse
    /// failure the current state is left untouched.
    pub fn import_state(&mut self, json: &str) -> Result<(), serde_json::Error> {
        self.state = serde_json::from_str(json)?;
        Ok(())
    }

    fn touch(&mut self) {
        self.state.updated_at = Utc::now();
    }
}

fn pattern_type_for(violation_type: ViolationType) -> PatternType {
    match violation_type {
        ViolationType::MrccExceeded | ViolationType::ScopeExceeded => PatternType::ScopeCreep,
        ViolationType::AuthorityMissing => PatternType::AuthorityMismatch,
        ViolationType::RateLimit => PatternType::RateAbuse,
        ViolationType::PolicyMismatch => PatternType::PolicyGap,
        ViolationType::ForbiddenAction | ViolationType::EpochViolation => {
            PatternType::RecurringViolation
        }
    }
}

/// confidence = 0.6·frequency + 0.4·recency, rounded to two decimals.
/// Frequency saturates at 10 occurrences; recency decays to zero over 30
/// days since the pattern was last seen.
fn confidence_for(pattern: &ViolationPattern) -> f64 {
    let frequency_score = (pattern.count as f64 / 10.0).min(1.0);

    let days_since = (Utc::now() - pattern.last_occurrence).num_seconds() as f64 / 86_400.0;
    let recency_score = (1.0 - days_since / 30.0).max(0.0);

    ((frequency_score * 0.6 + recency_score * 0.4) * 100.0).round() / 100.0
}

fn suggested_action_for(pattern: &ViolationPattern) -> SuggestedAction {
    if pattern.count >= 10 {
        return SuggestedAction::UpdatePolicy;
    }
    if pattern.count >= 5 {
        return SuggestedAction::EscalateToOwner;
    }
    match pattern.violation_type {
        ViolationType::RateLimit => SuggestedAction::AdjustThreshold,
        ViolationType::AuthorityMissing => SuggestedAction::AddException,
        _ => SuggestedAction::NoAction,
    }
}

fn weight_delta(feedback_type: FeedbackType) -> f64 {
    match feedback_type {
        FeedbackType::OverrideApproved => 0.1,
        FeedbackType::OverrideRejected => -0.1,
        FeedbackType::FalsePositive => 0.2,
        FeedbackType::TruePositive => -0.2,
        FeedbackType::PolicyUpdated | FeedbackType::EscalationResolved => 0.0,
    }
}

fn classification_proposal(pattern: &LearnedPattern, action: &ActionDefinition) -> PolicyProposal {
    PolicyProposal {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        status: ProposalStatus::Draft,
        proposal_type: ProposalType::AdjustClassification,
        action_id: Some(action.id.clone()),
        current_value: Some(action.caes.clone()),
        proposed_value: Some(downgrade_classification(&action.caes)),
        rationale: format!(
            "Action '{}' has {} violations of type {}. Adjusting classification to reduce friction.",
            action.id, pattern.frequency, pattern.violation_type
        ),
        evidence: vec![
            format!("Violation frequency: {}", pattern.frequency),
            format!("Pattern type: {}", pattern.pattern_type),
            format!("First seen: {}", pattern.first_seen),
            format!("Last seen: {}", pattern.last_seen),
        ],
        confidence: pattern.confidence,
    }
}

fn threshold_proposal(pattern: &LearnedPattern, action: &ActionDefinition) -> PolicyProposal {
    PolicyProposal {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        status: ProposalStatus::Draft,
        proposal_type: ProposalType::UpdateMrcc,
        action_id: Some(action.id.clone()),
        current_value: None,
        proposed_value: None,
        rationale: format!(
            "Rate limit violations for '{}' suggest threshold may be too restrictive.",
            action.id
        ),
        evidence: vec![
            format!("Violation count: {}", pattern.frequency),
            format!("Pattern: {}", pattern.pattern_type),
        ],
        confidence: pattern.confidence,
    }
}

fn exception_proposal(pattern: &LearnedPattern, action: &ActionDefinition) -> PolicyProposal {
    PolicyProposal {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        status: ProposalStatus::Draft,
        proposal_type: ProposalType::AddException,
        action_id: Some(action.id.clone()),
        current_value: None,
        proposed_value: None,
        rationale: format!(
            "Authority violations for '{}' may warrant an exception for certain actors.",
            action.id
        ),
        evidence: vec![
            format!("Violation count: {}", pattern.frequency),
            format!("Pattern: {}", pattern.pattern_type),
        ],
        confidence: pattern.confidence,
    }
}

/// Lower a CAES string's classification by one level, when possible.
fn downgrade_classification(caes: &str) -> String {
    let current = level(caes);
    if current > 0 {
        format!("C{}{}", current - 1, &caes[2..])
    } else {
        caes.to_string()
    }
}

fn identify_gaps(space: &ActionSpace, benchmark_type: BenchmarkType) -> Vec<BenchmarkGap> {
    let mut gaps = Vec::new();

    let audit_protected = space
        .current_epoch
        .as_ref()
        .is_some_and(|e| e.has_property(AUDIT_CANNOT_DISABLE));
    if !audit_protected {
        gaps.push(BenchmarkGap {
            control_id: format!("{benchmark_type}-AUDIT-01"),
            description: "Audit trail must be immutable and cannot be disabled".to_string(),
            severity: GapSeverity::High,
            remediation: Some(
                "Add \"audit_cannot_disable\" to epoch monotonic properties".to_string(),
            ),
        });
    }

    let autonomy_forbidden = space
        .mrcc
        .forbidden_actions
        .iter()
        .any(|a| a == AUTONOMY_EXPANSION_ACTION);
    if !autonomy_forbidden {
        gaps.push(BenchmarkGap {
            control_id: format!("{benchmark_type}-AUTH-01"),
            description: "Autonomy expansion must be explicitly forbidden".to_string(),
            severity: GapSeverity::High,
            remediation: Some(
                "Add \"expand_autonomy\" to MRCC forbidden_actions".to_string(),
            ),
        });
    }

    if space.mrcc.rate_limits.is_empty() {
        gaps.push(BenchmarkGap {
            control_id: format!("{benchmark_type}-RATE-01"),
            description: "Rate limits must be defined to prevent abuse".to_string(),
            severity: GapSeverity::Medium,
            remediation: Some("Define rate_limits in MRCC constraints".to_string()),
        });
    }

    gaps
}
