//! # gv-audit
//!
//! Audit ledger, compliance scoring, and report generation.
//!
//! The ledger stores the audit events the enforcer emits and is the basis
//! for the weighted compliance score (policy adherence, violation rate,
//! resolution rate, audit coverage) and the compliance report.
//!
//! ## Key invariants
//!
//! - **Events are append-only**: the ledger never mutates a stored event.
//! - **Scores degrade gracefully**: with no enforcement history every
//!   sub-score is 100, not a division by zero.
//! - **The trail hash is cryptographic**: SHA-256 over the JSONL export,
//!   rendered `sha256:<hex>`.

pub mod compliance;
pub mod hasher;
pub mod ledger;
pub mod report;

pub use compliance::{compliance_score, ComplianceBreakdown, ComplianceScore, Grade};
pub use ledger::AuditLedger;
pub use report::{compliance_report, ComplianceReport, ReportPeriod, ReportSummary, TopViolation};
