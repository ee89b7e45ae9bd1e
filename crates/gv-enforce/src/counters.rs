// counters.rs — Running totals over enforcement results.
//
// Counters are an owned value the host injects and threads through, not a
// process-wide static. They only move on an explicit `record` call so the
// caller decides which enforcements count — probes and dry runs stay out of
// the compliance math.

use serde::{Deserialize, Serialize};

use crate::enforcer::EnforcementResult;
use crate::event::EnforcementOutcome;

/// A point-in-time snapshot of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementSummary {
    pub total_enforced: usize,
    pub allowed: usize,
    pub blocked: usize,
    pub escalated: usize,
    pub violations_captured: usize,
}

/// Mutable enforcement counters.
#[derive(Debug, Default)]
pub struct EnforcementCounters {
    total: usize,
    allowed: usize,
    blocked: usize,
    escalated: usize,
    violations: usize,
}

impl EnforcementCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one enforcement result.
    pub fn record(&mut self, result: &EnforcementResult) {
        self.total += 1;
        match result.outcome {
            EnforcementOutcome::Allowed => self.allowed += 1,
            EnforcementOutcome::Blocked => self.blocked += 1,
            EnforcementOutcome::Escalated => self.escalated += 1,
        }
        self.violations += result.violations.len();
    }

    pub fn summary(&self) -> EnforcementSummary {
        EnforcementSummary {
            total_enforced: self.total,
            allowed: self.allowed,
            blocked: self.blocked,
            escalated: self.escalated,
            violations_captured: self.violations,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
