// ledger.rs — Append-only audit event ledger.
//
// Same storage discipline as the violation store: an append-only log fixes
// the export order, an id index gives keyed access. Events are never
// mutated once stored.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use gv_enforce::{AuditEvent, EnforcementOutcome};

/// Append-only store of audit events, keyed by event id.
#[derive(Debug, Default)]
pub struct AuditLedger {
    log: Vec<AuditEvent>,
    index: HashMap<Uuid, usize>,
}

impl AuditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an event. Re-storing an existing id replaces that record in
    /// place; otherwise the event is appended.
    pub fn store(&mut self, event: AuditEvent) -> Uuid {
        let id = event.id;
        match self.index.get(&id) {
            Some(&pos) => self.log[pos] = event,
            None => {
                self.index.insert(id, self.log.len());
                self.log.push(event);
            }
        }
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&AuditEvent> {
        self.index.get(id).map(|&pos| &self.log[pos])
    }

    /// All events in storage order.
    pub fn all(&self) -> &[AuditEvent] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn by_actor(&self, actor: &str) -> Vec<&AuditEvent> {
        self.log.iter().filter(|e| e.actor == actor).collect()
    }

    pub fn by_action(&self, action_id: &str) -> Vec<&AuditEvent> {
        self.log
            .iter()
            .filter(|e| e.action_id == action_id)
            .collect()
    }

    pub fn by_outcome(&self, outcome: EnforcementOutcome) -> Vec<&AuditEvent> {
        self.log.iter().filter(|e| e.outcome == outcome).collect()
    }

    /// Events with `start <= timestamp <= end`.
    pub fn in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&AuditEvent> {
        self.log
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .collect()
    }

    /// Export the ledger as JSONL, one event per line, in storage order.
    pub fn export_jsonl(&self) -> String {
        self.log
            .iter()
            .filter_map(|e| serde_json::to_string(e).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Import events from JSONL. Malformed lines are skipped; returns the
    /// number of events actually imported.
    pub fn import_jsonl(&mut self, jsonl: &str) -> usize {
        let mut imported = 0;
        for line in jsonl.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEvent>(line) {
                Ok(event) => {
                    self.store(event);
                    imported += 1;
                }
                Err(err) => {
                    tracing::debug!("skipping malformed audit line: {err}");
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
    use chrono::Duration;

    fn event(action_id: &str, actor: &str, outcome: EnforcementOutcome) -> AuditEvent {
        AuditEvent::new(action_id, "C1-A0-E1-S1", actor, outcome, vec![])
    }

    #[test]
    fn store_and_get() {
        let mut ledger = AuditLedger::new();
        let e = event("read_logs", "agent-1", EnforcementOutcome::Allowed);
        let id = ledger.store(e.clone());
        assert_eq!(ledger.get(&id), Some(&e));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn filters_by_actor_action_and_outcome() {
        let mut ledger = AuditLedger::new();
        ledger.store(event("read_logs", "agent-1", EnforcementOutcome::Allowed));
        ledger.store(event("wipe_disk", "agent-1", EnforcementOutcome::Blocked));
        ledger.store(event("read_logs", "agent-2", EnforcementOutcome::Allowed));

        assert_eq!(ledger.by_actor("agent-1").len(), 2);
        assert_eq!(ledger.by_action("read_logs").len(), 2);
        assert_eq!(ledger.by_outcome(EnforcementOutcome::Blocked).len(), 1);
    }

    #[test]
    fn in_range_is_inclusive() {
        let mut ledger = AuditLedger::new();
        let id = ledger.store(event("read_logs", "agent-1", EnforcementOutcome::Allowed));
        let ts = ledger.get(&id).unwrap().timestamp;
        assert_eq!(ledger.in_range(ts, ts).len(), 1);
        assert!(ledger
            .in_range(ts + Duration::seconds(1), ts + Duration::seconds(2))
            .is_empty());
    }

    #[test]
    fn jsonl_round_trip() {
        let mut source = AuditLedger::new();
        source.store(event("read_logs", "agent-1", EnforcementOutcome::Allowed));
        source.store(event("wipe_disk", "agent-1", EnforcementOutcome::Blocked));

        let mut target = AuditLedger::new();
        assert_eq!(target.import_jsonl(&source.export_jsonl()), 2);
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn import_skips_malformed_lines() {
        let mut ledger = AuditLedger::new();
        let good =
            serde_json::to_string(&event("read_logs", "agent-1", EnforcementOutcome::Allowed))
                .unwrap();
        let imported = ledger.import_jsonl(&format!("{good}\n{{broken\n\n"));
        assert_eq!(imported, 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn export_order_is_storage_order() {
        let mut ledger = AuditLedger::new();
        ledger.store(event("first", "agent-1", EnforcementOutcome::Allowed));
        ledger.store(event("second", "agent-1", EnforcementOutcome::Allowed));

        let exported = ledger.export_jsonl();
        let lines: Vec<&str> = exported.lines().collect();
        assert!(lines[0].contains("first"));
        assert!(lines[1].contains("second"));
    }
}
