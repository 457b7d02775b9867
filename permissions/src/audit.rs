use std::collections::VecDeque;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

/// Outcome of an enforced authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditDecision {
    Allowed,
    Denied,
}

/// A single recorded authorization decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub actor: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub decision: AuditDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub const DEFAULT_AUDIT_CAPACITY: usize = 1_000;

/// Bounded buffer of authorization decisions; the oldest entry is dropped
/// once `max_entries` is exceeded.
#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
    max_entries: usize,
    next_id: u64,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
            next_id: 0,
        }
    }

    pub fn record(
        &mut self,
        actor: &str,
        action: &str,
        target: Option<&str>,
        decision: AuditDecision,
        reason: Option<&str>,
    ) -> &AuditEntry {
        self.next_id += 1;
        let id = format!("audit-{}", self.next_id);
        info!(
            actor,
            action,
            target = target.unwrap_or("-"),
            ?decision,
            reason = reason.unwrap_or("-"),
            "authorization decision"
        );
        self.entries.push_back(AuditEntry {
            id,
            actor: actor.into(),
            action: action.into(),
            target: target.map(Into::into),
            decision,
            reason: reason.map(Into::into),
            timestamp: Utc::now(),
        });
        while self.entries.len() > self.max_entries.max(1) {
            self.entries.pop_front();
        }
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    pub fn denials(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries
            .iter()
            .filter(|e| e.decision == AuditDecision::Denied)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
