// compliance.rs — Weighted compliance scoring.
//
// Four sub-scores, each 0–100, combined with fixed weights:
//
//   overall = 0.35·policy_adherence + 0.25·violation_rate
//           + 0.20·resolution_rate + 0.20·audit_coverage
//
// An empty history scores 100 on every axis: a system that has enforced
// nothing has violated nothing.

use serde::{Deserialize, Serialize};

use gv_enforce::EnforcementSummary;
use gv_violations::ViolationStore;

use crate::ledger::AuditLedger;

/// Letter grade for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Grade thresholds: A≥90, B≥80, C≥70, D≥60, else F.
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

/// The four sub-scores behind an overall compliance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceBreakdown {
    pub policy_adherence: u32,
    pub violation_rate: u32,
    pub resolution_rate: u32,
    pub audit_coverage: u32,
}

/// A weighted compliance score with grade and recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceScore {
    /// 0–100.
    pub overall: u32,
    pub breakdown: ComplianceBreakdown,
    pub grade: Grade,
    pub recommendations: Vec<String>,
}

/// Sub-score below which a recommendation is emitted.
const RECOMMENDATION_THRESHOLD: u32 = 80;

/// Compute the compliance score from the ledger, the violation store, and
/// the enforcement summary.
pub fn compliance_score(
    ledger: &AuditLedger,
    violations: &ViolationStore,
    enforcement: &EnforcementSummary,
) -> ComplianceScore {
    let breakdown = ComplianceBreakdown {
        policy_adherence: policy_adherence(enforcement),
        violation_rate: violation_rate(violations, enforcement),
        resolution_rate: resolution_rate(violations),
        audit_coverage: audit_coverage(ledger, enforcement),
    };

    let overall = (f64::from(breakdown.policy_adherence) * 0.35
        + f64::from(breakdown.violation_rate) * 0.25
        + f64::from(breakdown.resolution_rate) * 0.20
        + f64::from(breakdown.audit_coverage) * 0.20)
        .round() as u32;

    ComplianceScore {
        overall,
        grade: Grade::from_score(overall),
        recommendations: recommendations(&breakdown),
        breakdown,
    }
}

fn policy_adherence(enforcement: &EnforcementSummary) -> u32 {
    if enforcement.total_enforced == 0 {
        return 100;
    }
    let adhered = enforcement.allowed + enforcement.escalated;
    ratio_score(adhered as f64 / enforcement.total_enforced as f64)
}

fn violation_rate(violations: &ViolationStore, enforcement: &EnforcementSummary) -> u32 {
    if enforcement.total_enforced == 0 {
        return 100;
    }
    let rate = violations.len() as f64 / enforcement.total_enforced as f64;
    (100.0 - rate * 100.0).max(0.0).round() as u32
}

fn resolution_rate(violations: &ViolationStore) -> u32 {
    if violations.is_empty() {
        return 100;
    }
    ratio_score(violations.resolved().len() as f64 / violations.len() as f64)
}

fn audit_coverage(ledger: &AuditLedger, enforcement: &EnforcementSummary) -> u32 {
    if enforcement.total_enforced == 0 {
        return 100;
    }
    let coverage = ledger.len() as f64 / enforcement.total_enforced as f64;
    (coverage * 100.0).min(100.0).round() as u32
}

fn ratio_score(ratio: f64) -> u32 {
    (ratio * 100.0).round() as u32
}

fn recommendations(breakdown: &ComplianceBreakdown) -> Vec<String> {
    let mut recommendations = Vec::new();

    if breakdown.policy_adherence < RECOMMENDATION_THRESHOLD {
        recommendations.push("Review and update policies to reduce blocked actions".to_string());
    }
    if breakdown.violation_rate < RECOMMENDATION_THRESHOLD {
        recommendations
            .push("Investigate recurring violations and address root causes".to_string());
    }
    if breakdown.resolution_rate < RECOMMENDATION_THRESHOLD {
        recommendations.push("Resolve outstanding violations to improve compliance".to_string());
    }
    if breakdown.audit_coverage < RECOMMENDATION_THRESHOLD {
        recommendations.push("Ensure all actions have corresponding audit events".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push("Maintain current compliance practices".to_string());
    }

    recommendations
}
