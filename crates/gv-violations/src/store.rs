// store.rs — Append-only violation store and pattern analyzer.
//
// The store is an owned value injected wherever violations are captured —
// there is no process-wide singleton. Internally it keeps an append-only log
// (which fixes the JSONL export order) plus an id index for keyed access.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::violation::{
    Violation, ViolationResolution, ViolationSeverity, ViolationType,
};

/// Aggregate counts over the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationStats {
    pub total: usize,
    pub unresolved: usize,
    /// Counts per violation type; every type is present, zero-filled.
    pub by_type: BTreeMap<ViolationType, usize>,
    /// Counts per severity; every severity is present, zero-filled.
    pub by_severity: BTreeMap<ViolationSeverity, usize>,
}

/// A recurring `(action, violation type)` grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationPattern {
    pub action_id: String,
    pub violation_type: ViolationType,
    pub count: usize,
    pub first_occurrence: DateTime<Utc>,
    pub last_occurrence: DateTime<Utc>,
    /// Set once the pattern recurs three or more times.
    pub should_escalate: bool,
}

/// Occurrences at which a pattern is flagged for escalation.
const ESCALATION_THRESHOLD: usize = 3;

/// Append-only store of violations, keyed by id.
#[derive(Debug, Default)]
pub struct ViolationStore {
    log: Vec<Violation>,
    index: HashMap<Uuid, usize>,
}

impl ViolationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a violation. Re-capturing an existing id replaces that
    /// record in place; otherwise the violation is appended.
    pub fn capture(&mut self, violation: Violation) -> Uuid {
        let id = violation.id;
        match self.index.get(&id) {
            Some(&pos) => self.log[pos] = violation,
            None => {
                self.index.insert(id, self.log.len());
                self.log.push(violation);
            }
        }
        id
    }

    /// Look up a violation by id.
    pub fn get(&self, id: &Uuid) -> Option<&Violation> {
        self.index.get(id).map(|&pos| &self.log[pos])
    }

    /// All violations in capture order.
    pub fn all(&self) -> &[Violation] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn by_type(&self, violation_type: ViolationType) -> Vec<&Violation> {
        self.log
            .iter()
            .filter(|v| v.violation_type == violation_type)
            .collect()
    }

    pub fn by_severity(&self, severity: ViolationSeverity) -> Vec<&Violation> {
        self.log.iter().filter(|v| v.severity == severity).collect()
    }

    pub fn by_action(&self, action_id: &str) -> Vec<&Violation> {
        self.log
            .iter()
            .filter(|v| v.action_id == action_id)
            .collect()
    }

    pub fn resolved(&self) -> Vec<&Violation> {
        self.log.iter().filter(|v| v.is_resolved()).collect()
    }

    pub fn unresolved(&self) -> Vec<&Violation> {
        self.log.iter().filter(|v| !v.is_resolved()).collect()
    }

    /// Violations with `start <= timestamp <= end`.
    pub fn in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&Violation> {
        self.log
            .iter()
            .filter(|v| v.timestamp >= start && v.timestamp <= end)
            .collect()
    }

    /// Attach a resolution to a violation. This is the only mutation path
    /// after capture. Returns false when the id is unknown.
    pub fn resolve(&mut self, id: &Uuid, resolution: ViolationResolution) -> bool {
        match self.index.get(id) {
            Some(&pos) => {
                self.log[pos].resolution = Some(resolution);
                true
            }
            None => false,
        }
    }

    /// Aggregate counts by type and severity.
    pub fn stats(&self) -> ViolationStats {
        let mut by_type: BTreeMap<ViolationType, usize> =
            ViolationType::ALL.iter().map(|t| (*t, 0)).collect();
        let mut by_severity: BTreeMap<ViolationSeverity, usize> =
            ViolationSeverity::ALL.iter().map(|s| (*s, 0)).collect();

        for violation in &self.log {
            *by_type.entry(violation.violation_type).or_default() += 1;
            *by_severity.entry(violation.severity).or_default() += 1;
        }

        ViolationStats {
            total: self.log.len(),
            unresolved: self.log.iter().filter(|v| !v.is_resolved()).count(),
            by_type,
            by_severity,
        }
    }

    /// Group violations by `(action_id, violation_type)`, flagging groups
    /// that recur three or more times. Results are sorted by count
    /// descending (ties by action id for a stable report).
    pub fn analyze_patterns(&self) -> Vec<ViolationPattern> {
        let mut groups: BTreeMap<(String, ViolationType), ViolationPattern> = BTreeMap::new();

        for violation in &self.log {
            let key = (violation.action_id.clone(), violation.violation_type);
            match groups.get_mut(&key) {
                Some(pattern) => {
                    pattern.count += 1;
                    pattern.first_occurrence = pattern.first_occurrence.min(violation.timestamp);
                    pattern.last_occurrence = pattern.last_occurrence.max(violation.timestamp);
                }
                None => {
                    groups.insert(
                        key,
                        ViolationPattern {
                            action_id: violation.action_id.clone(),
                            violation_type: violation.violation_type,
                            count: 1,
                            first_occurrence: violation.timestamp,
                            last_occurrence: violation.timestamp,
                            should_escalate: false,
                        },
                    );
                }
            }
        }

        let mut patterns: Vec<ViolationPattern> = groups.into_values().collect();
        for pattern in &mut patterns {
            pattern.should_escalate = pattern.count >= ESCALATION_THRESHOLD;
        }
        patterns.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.action_id.cmp(&b.action_id))
        });
        patterns
    }

    /// Export the store as JSONL, one violation per line, in capture order.
    pub fn export_jsonl(&self) -> String {
        self.log
            .iter()
            .filter_map(|v| serde_json::to_string(v).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Import violations from JSONL. Malformed lines are skipped; returns
    /// the number of violations actually imported.
    pub fn import_jsonl(&mut self, jsonl: &str) -> usize {
        let mut imported = 0;
        for line in jsonl.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Violation>(line) {
                Ok(violation) => {
                    self.capture(violation);
                    imported += 1;
                }
                Err(err) => {
                    tracing::debug!("skipping malformed violation line: {err}");
                }
            }
        }
        imported
    }

    /// Drop everything. Intended for tests and host-controlled resets.
    pub fn clear(&mut self) {
        self.log.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violation::{ResolutionType, ViolationContext};
    use chrono::Duration;

    fn violation(action_id: &str, violation_type: ViolationType) -> Violation {
        Violation::new(
            action_id,
            "C2-A1-E2-S2",
            violation_type,
            ViolationSeverity::High,
            ViolationContext::for_actor("agent-1"),
        )
    }

    #[test]
    fn capture_and_get() {
        let mut store = ViolationStore::new();
        let v = violation("deploy_service", ViolationType::MrccExceeded);
        let id = store.capture(v.clone());
        assert_eq!(store.get(&id), Some(&v));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn capture_does_not_dedupe_distinct_violations() {
        let mut store = ViolationStore::new();
        store.capture(violation("deploy_service", ViolationType::MrccExceeded));
        store.capture(violation("deploy_service", ViolationType::MrccExceeded));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn recapturing_the_same_id_replaces_in_place() {
        let mut store = ViolationStore::new();
        let mut v = violation("deploy_service", ViolationType::MrccExceeded);
        store.capture(v.clone());
        v.severity = ViolationSeverity::Critical;
        store.capture(v.clone());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&v.id).unwrap().severity, ViolationSeverity::Critical);
    }

    #[test]
    fn filters_by_type_severity_and_action() {
        let mut store = ViolationStore::new();
        store.capture(violation("a", ViolationType::MrccExceeded));
        store.capture(violation("b", ViolationType::RateLimit));
        store.capture(violation("b", ViolationType::MrccExceeded));

        assert_eq!(store.by_type(ViolationType::MrccExceeded).len(), 2);
        assert_eq!(store.by_type(ViolationType::RateLimit).len(), 1);
        assert_eq!(store.by_severity(ViolationSeverity::High).len(), 3);
        assert_eq!(store.by_severity(ViolationSeverity::Low).len(), 0);
        assert_eq!(store.by_action("b").len(), 2);
    }

    #[test]
    fn resolve_is_the_only_mutation() {
        let mut store = ViolationStore::new();
        let id = store.capture(violation("a", ViolationType::MrccExceeded));
        assert_eq!(store.unresolved().len(), 1);
        assert!(store.resolved().is_empty());

        let resolved = store.resolve(
            &id,
            ViolationResolution {
                resolved_at: Utc::now(),
                resolved_by: "owner".to_string(),
                resolution_type: ResolutionType::Approved,
                notes: Some("approved after review".to_string()),
            },
        );
        assert!(resolved);
        assert!(store.unresolved().is_empty());
        assert_eq!(store.resolved().len(), 1);
    }

    #[test]
    fn resolve_unknown_id_returns_false() {
        let mut store = ViolationStore::new();
        let resolved = store.resolve(
            &Uuid::new_v4(),
            ViolationResolution {
                resolved_at: Utc::now(),
                resolved_by: "owner".to_string(),
                resolution_type: ResolutionType::Blocked,
                notes: None,
            },
        );
        assert!(!resolved);
    }

    #[test]
    fn stats_are_zero_filled() {
        let store = ViolationStore::new();
        let stats = store.stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.by_type.len(), ViolationType::ALL.len());
        assert_eq!(stats.by_severity.len(), ViolationSeverity::ALL.len());
        assert!(stats.by_type.values().all(|&c| c == 0));
    }

    #[test]
    fn stats_count_by_type_and_severity() {
        let mut store = ViolationStore::new();
        store.capture(violation("a", ViolationType::MrccExceeded));
        store.capture(violation("a", ViolationType::MrccExceeded));
        store.capture(violation("b", ViolationType::EpochViolation));

        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.unresolved, 3);
        assert_eq!(stats.by_type[&ViolationType::MrccExceeded], 2);
        assert_eq!(stats.by_type[&ViolationType::EpochViolation], 1);
        assert_eq!(stats.by_severity[&ViolationSeverity::High], 3);
    }

    #[test]
    fn in_range_is_inclusive() {
        let mut store = ViolationStore::new();
        let id = store.capture(violation("a", ViolationType::MrccExceeded));
        let ts = store.get(&id).unwrap().timestamp;

        assert_eq!(store.in_range(ts, ts).len(), 1);
        assert_eq!(
            store
                .in_range(ts + Duration::seconds(1), ts + Duration::seconds(2))
                .len(),
            0
        );
    }

    #[test]
    fn five_recurrences_form_an_escalating_pattern() {
        let mut store = ViolationStore::new();
        for _ in 0..5 {
            store.capture(violation("risky_action", ViolationType::MrccExceeded));
        }

        let patterns = store.analyze_patterns();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].action_id, "risky_action");
        assert_eq!(patterns[0].violation_type, ViolationType::MrccExceeded);
        assert_eq!(patterns[0].count, 5);
        assert!(patterns[0].should_escalate);
    }

    #[test]
    fn patterns_below_threshold_do_not_escalate() {
        let mut store = ViolationStore::new();
        store.capture(violation("quiet_action", ViolationType::RateLimit));
        store.capture(violation("quiet_action", ViolationType::RateLimit));

        let patterns = store.analyze_patterns();
        assert_eq!(patterns[0].count, 2);
        assert!(!patterns[0].should_escalate);
    }

    #[test]
    fn patterns_sort_by_count_descending() {
        let mut store = ViolationStore::new();
        store.capture(violation("rare", ViolationType::RateLimit));
        for _ in 0..4 {
            store.capture(violation("frequent", ViolationType::MrccExceeded));
        }

        let patterns = store.analyze_patterns();
        assert_eq!(patterns[0].action_id, "frequent");
        assert_eq!(patterns[1].action_id, "rare");
    }

    #[test]
    fn patterns_track_first_and_last_occurrence() {
        let mut store = ViolationStore::new();
        let mut early = violation("a", ViolationType::MrccExceeded);
        early.timestamp = Utc::now() - Duration::hours(2);
        let mut late = violation("a", ViolationType::MrccExceeded);
        late.timestamp = Utc::now();
        let early_ts = early.timestamp;
        let late_ts = late.timestamp;

        // Capture out of chronological order.
        store.capture(late);
        store.capture(early);

        let patterns = store.analyze_patterns();
        assert_eq!(patterns[0].first_occurrence, early_ts);
        assert_eq!(patterns[0].last_occurrence, late_ts);
    }

    #[test]
    fn jsonl_round_trip() {
        let mut source = ViolationStore::new();
        source.capture(violation("a", ViolationType::MrccExceeded));
        source.capture(violation("b", ViolationType::RateLimit));

        let mut target = ViolationStore::new();
        let imported = target.import_jsonl(&source.export_jsonl());
        assert_eq!(imported, 2);
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn import_skips_malformed_lines() {
        let mut store = ViolationStore::new();
        let good = serde_json::to_string(&violation("a", ViolationType::MrccExceeded)).unwrap();
        let jsonl = format!("{good}\nnot json\n\n{{\"partial\": true}}");
        let imported = store.import_jsonl(&jsonl);
        assert_eq!(imported, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = ViolationStore::new();
        store.capture(violation("a", ViolationType::MrccExceeded));
        store.clear();
        assert!(store.is_empty());
        assert!(store.all().is_empty());
    }
}
