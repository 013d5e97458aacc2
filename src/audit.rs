//! Audit trail of quotes, rate edits and user switches.
//!
//! Entries are kept newest first and capped; the oldest fall off the end.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::access::{Role, User};
use crate::error::Result;
use crate::store::{self, KeyValueStore, AUDIT_LOG_KEY};

pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "Rate Calculation")]
    RateCalculation,
    #[serde(rename = "Rates Updated")]
    RatesUpdated,
    #[serde(rename = "Rates Reset")]
    RatesReset,
    #[serde(rename = "User Switch")]
    UserSwitch,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditAction::RateCalculation => "Rate Calculation",
            AuditAction::RatesUpdated => "Rates Updated",
            AuditAction::RatesReset => "Rates Reset",
            AuditAction::UserSwitch => "User Switch",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user_id: u32,
    pub user_name: String,
    pub user_role: Role,
    pub action: AuditAction,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_data: Option<Value>,
}

impl AuditEntry {
    pub fn new(
        actor: &User,
        action: AuditAction,
        details: impl Into<String>,
        calculation_data: Option<Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_id: actor.id,
            user_name: actor.name.clone(),
            user_role: actor.role,
            action,
            details: details.into(),
            calculation_data,
        }
    }
}

/// Bounded, newest-first audit log
#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Load the persisted log. An unreadable log starts over empty.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, capacity: usize) -> Self {
        let mut entries = match store::load_json::<Vec<AuditEntry>, S>(store, AUDIT_LOG_KEY) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                warn!("Discarding unreadable audit log: {}", e);
                Vec::new()
            }
        };
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store::save_json(store, AUDIT_LOG_KEY, &self.entries)
    }

    /// Prepend an entry, dropping the oldest past capacity
    pub fn record(&mut self, entry: AuditEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
    }

    /// Up to `limit` most recent entries
    pub fn latest(&self, limit: usize) -> &[AuditEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::UserDirectory;
    use crate::store::MemoryStore;

    fn admin() -> User {
        UserDirectory::default().find(1).cloned().unwrap()
    }

    #[test]
    fn test_record_is_newest_first_and_capped() {
        let actor = admin();
        let mut log = AuditLog::new(3);

        for i in 0..5 {
            log.record(AuditEntry::new(
                &actor,
                AuditAction::RateCalculation,
                format!("quote {}", i),
                None,
            ));
        }

        assert_eq!(log.len(), 3);
        let details: Vec<&str> = log.latest(log.len()).iter().map(|e| e.details.as_str()).collect();
        assert_eq!(details, vec!["quote 4", "quote 3", "quote 2"]);
        assert_eq!(log.latest(1)[0].details, "quote 4");
        assert_eq!(log.latest(10).len(), 3);
    }

    #[test]
    fn test_entry_captures_actor() {
        let actor = admin();
        let entry = AuditEntry::new(
            &actor,
            AuditAction::RatesUpdated,
            "Updated rate table",
            Some(serde_json::json!({"deadheadRate": "1.25"})),
        );

        assert_eq!(entry.user_id, 1);
        assert_eq!(entry.user_name, "John Smith");
        assert_eq!(entry.user_role, Role::Admin);
        assert!(entry.calculation_data.is_some());
    }

    #[test]
    fn test_save_and_load() {
        let actor = admin();
        let mut store = MemoryStore::new();
        let mut log = AuditLog::default();
        log.record(AuditEntry::new(&actor, AuditAction::UserSwitch, "Switched", None));
        log.save(&mut store).unwrap();

        let value = store.get(AUDIT_LOG_KEY).unwrap().unwrap();
        assert_eq!(value[0]["action"], serde_json::json!("User Switch"));
        assert_eq!(value[0]["userRole"], serde_json::json!("Admin"));

        let loaded = AuditLog::load(&store, 10);
        assert_eq!(loaded.latest(loaded.len()), log.latest(log.len()));
    }

    #[test]
    fn test_load_discards_unreadable_log() {
        let mut store = MemoryStore::new();
        store.set(AUDIT_LOG_KEY, serde_json::json!("garbage")).unwrap();

        let log = AuditLog::load(&store, 10);
        assert!(log.is_empty());
    }
}
