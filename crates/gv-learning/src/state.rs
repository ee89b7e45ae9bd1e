// state.rs — Learning state data model.
//
// Everything the engine learns lives in one LearningState value so it can
// be serialized wholesale into a checkpoint and overwritten wholesale on
// rollback.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gv_violations::ViolationType;

/// What kind of behavior a learned pattern describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternType {
    RecurringViolation,
    PolicyGap,
    AuthorityMismatch,
    ScopeCreep,
    RateAbuse,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternType::RecurringViolation => "RECURRING_VIOLATION",
            PatternType::PolicyGap => "POLICY_GAP",
            PatternType::AuthorityMismatch => "AUTHORITY_MISMATCH",
            PatternType::ScopeCreep => "SCOPE_CREEP",
            PatternType::RateAbuse => "RATE_ABUSE",
        };
        f.write_str(name)
    }
}

/// What the engine suggests doing about a learned pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestedAction {
    UpdatePolicy,
    AdjustThreshold,
    AddException,
    EscalateToOwner,
    NoAction,
}

/// A violation pattern that recurred often enough to learn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub id: Uuid,
    pub pattern_type: PatternType,
    pub action_id: String,
    pub violation_type: ViolationType,
    /// How many times the pattern occurred.
    pub frequency: usize,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// 0.0–1.0, combining frequency and recency.
    pub confidence: f64,
    pub suggested_action: SuggestedAction,
}

/// Operator feedback on an enforcement decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackType {
    OverrideApproved,
    OverrideRejected,
    EscalationResolved,
    PolicyUpdated,
    FalsePositive,
    TruePositive,
}

/// One recorded piece of feedback and the weight delta it applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action_id: String,
    pub feedback_type: FeedbackType,
    /// Who gave the feedback.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub weight_adjustment: f64,
}

/// Per-action and per-type tolerance weights, each clamped to [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightAdjustments {
    pub actions: BTreeMap<String, f64>,
    pub types: BTreeMap<ViolationType, f64>,
}

impl Default for WeightAdjustments {
    fn default() -> Self {
        Self {
            actions: BTreeMap::new(),
            types: ViolationType::ALL.iter().map(|t| (*t, 0.0)).collect(),
        }
    }
}

/// Lifecycle of a policy proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Draft,
    PendingReview,
    Approved,
    Rejected,
    Implemented,
}

/// What a proposal wants to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalType {
    AdjustClassification,
    AdjustAuthority,
    AddAction,
    RemoveAction,
    UpdateMrcc,
    UpdateNcc,
    AddException,
}

/// A generated policy change proposal with rationale and evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyProposal {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: ProposalStatus,
    pub proposal_type: ProposalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_value: Option<String>,
    pub rationale: String,
    pub evidence: Vec<String>,
    pub confidence: f64,
}

/// External standard a benchmark evaluates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BenchmarkType {
    Soc2,
    Iso27001,
    Nist,
    Custom,
}

impl BenchmarkType {
    /// The full name of the standard.
    pub fn standard_name(&self) -> &'static str {
        match self {
            BenchmarkType::Soc2 => "SOC 2 Type II",
            BenchmarkType::Iso27001 => "ISO 27001:2022",
            BenchmarkType::Nist => "NIST CSF 2.0",
            BenchmarkType::Custom => "Custom Benchmark",
        }
    }
}

impl fmt::Display for BenchmarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            BenchmarkType::Soc2 => "SOC2",
            BenchmarkType::Iso27001 => "ISO27001",
            BenchmarkType::Nist => "NIST",
            BenchmarkType::Custom => "CUSTOM",
        };
        f.write_str(tag)
    }
}

/// How much a benchmark gap costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapSeverity {
    Low,
    Medium,
    High,
}

impl GapSeverity {
    /// Points deducted from the benchmark score.
    pub fn deduction(&self) -> u32 {
        match self {
            GapSeverity::High => 20,
            GapSeverity::Medium => 10,
            GapSeverity::Low => 5,
        }
    }
}

/// A missing control found by a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkGap {
    pub control_id: String,
    pub description: String,
    pub severity: GapSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// The outcome of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub benchmark_type: BenchmarkType,
    pub standard: String,
    /// 0–100.
    pub score: u32,
    pub gaps: Vec<BenchmarkGap>,
}

/// The learning engine's whole mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningState {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    pub patterns: Vec<LearnedPattern>,
    pub feedback: Vec<FeedbackRecord>,
    pub weights: WeightAdjustments,
    pub proposals: Vec<PolicyProposal>,
    pub benchmarks: Vec<BenchmarkResult>,
}

impl LearningState {
    /// Fresh state at schema version 1.0.0.
    pub fn initial() -> Self {
        Self {
            version: "1.0.0".to_string(),
            updated_at: Utc::now(),
            patterns: Vec::new(),
            feedback: Vec::new(),
            weights: WeightAdjustments::default(),
            proposals: Vec::new(),
            benchmarks: Vec::new(),
        }
    }

    /// Structural sanity: a state without a version is not usable.
    pub fn is_structurally_valid(&self) -> bool {
        !self.version.is_empty()
    }
}

impl Default for LearningState {
    fn default() -> Self {
        Self::initial()
    }
}
