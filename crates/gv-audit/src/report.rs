// report.rs — Compliance report assembly.
//
// The report is pure data: score, summary counts, the five most-violating
// actions, and a SHA-256 hash over the exported audit trail. Rendering it
// for humans is the caller's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gv_enforce::EnforcementSummary;
use gv_violations::{ViolationStore, ViolationType};

use crate::compliance::{compliance_score, ComplianceScore};
use crate::hasher;
use crate::ledger::AuditLedger;

/// How many top violating actions the report carries.
const TOP_VIOLATION_LIMIT: usize = 5;

/// The reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Headline counts for the reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_actions: usize,
    pub allowed: usize,
    pub blocked: usize,
    pub escalated: usize,
    pub violations: usize,
    pub unresolved_violations: usize,
}

/// One entry in the top-violations table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopViolation {
    pub action_id: String,
    pub count: usize,
    /// The violation type first recorded for this action.
    pub violation_type: ViolationType,
}

/// A complete compliance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub generated_at: DateTime<Utc>,
    pub period: ReportPeriod,
    pub score: ComplianceScore,
    pub summary: ReportSummary,
    pub top_violations: Vec<TopViolation>,
    /// `sha256:<hex>` over the exported audit trail.
    pub audit_trail_hash: String,
}

/// Generate a compliance report for the given window.
pub fn compliance_report(
    ledger: &AuditLedger,
    violations: &ViolationStore,
    enforcement: &EnforcementSummary,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ComplianceReport {
    let score = compliance_score(ledger, violations, enforcement);
    let stats = violations.stats();

    ComplianceReport {
        generated_at: Utc::now(),
        period: ReportPeriod { start, end },
        score,
        summary: ReportSummary {
            total_actions: enforcement.total_enforced,
            allowed: enforcement.allowed,
            blocked: enforcement.blocked,
            escalated: enforcement.escalated,
            violations: stats.total,
            unresolved_violations: stats.unresolved,
        },
        top_violations: top_violations(violations),
        audit_trail_hash: hasher::hash_str_prefixed(&ledger.export_jsonl()),
    }
}

fn top_violations(violations: &ViolationStore) -> Vec<TopViolation> {
    let mut by_action: Vec<TopViolation> = Vec::new();

    for violation in violations.all() {
        match by_action
            .iter_mut()
            .find(|entry| entry.action_id == violation.action_id)
        {
            Some(entry) => entry.count += 1,
            None => by_action.push(TopViolation {
                action_id: violation.action_id.clone(),
                count: 1,
                violation_type: violation.violation_type,
            }),
        }
    }

    by_action.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.action_id.cmp(&b.action_id))
    });
    by_action.truncate(TOP_VIOLATION_LIMIT);
    by_action
}
