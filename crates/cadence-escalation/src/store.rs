//! Rule and log persistence.

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};

use super::error::{Error, Result};
use super::log::{EscalationLogEntry, EscalationStatus, LogId};
use super::rule::{EscalationRule, RuleId};
use super::target::TargetRef;

// Table definitions
const RULE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("escalation_rules");
const LOG_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("escalation_logs");
const CHAIN_INDEX_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("chain_logs");
const TARGET_INDEX_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("target_logs");

fn chain_key(rule_id: &RuleId, target: &TargetRef) -> String {
    format!("chain:{}:{}:{}", rule_id, target.kind, target.id)
}

fn target_key(target: &TargetRef) -> String {
    format!("target:{}:{}", target.kind, target.id)
}

/// Store for escalation rule definitions.
pub struct RuleStore {
    db: Arc<Database>,
    /// Storage path for singleton
    path: String,
}

/// Global rule store singleton (thread-safe).
static RULE_STORE_SINGLETON: StdMutex<Option<Arc<RuleStore>>> = StdMutex::new(None);

impl RuleStore {
    /// Open or create a rule store.
    /// Uses a singleton pattern to prevent multiple opens of the same database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        {
            let singleton = RULE_STORE_SINGLETON.lock().unwrap();
            if let Some(store) = singleton.as_ref() {
                if store.path == path_str {
                    return Ok(store.clone());
                }
            }
        }

        let path_ref = path.as_ref();
        let db = if path_ref.exists() {
            Database::open(path_ref)?
        } else {
            Database::create(path_ref)?
        };

        let store = Arc::new(RuleStore {
            db: Arc::new(db),
            path: path_str,
        });

        *RULE_STORE_SINGLETON.lock().unwrap() = Some(store.clone());
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn memory() -> Result<Arc<Self>> {
        let temp_path =
            std::env::temp_dir().join(format!("escalation_rules_{}.redb", uuid::Uuid::new_v4()));
        Self::open(temp_path)
    }

    /// Save a rule.
    pub fn save(&self, rule: &EscalationRule) -> Result<()> {
        let key = format!("rule:{}", rule.id);
        let value = serde_json::to_vec(rule)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RULE_TABLE)?;
            table.insert(key.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load a rule.
    pub fn load(&self, id: &RuleId) -> Result<Option<EscalationRule>> {
        let key = format!("rule:{}", id);

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RULE_TABLE)?;

        match table.get(key.as_str())? {
            Some(value) => {
                let rule = serde_json::from_slice(value.value())?;
                Ok(Some(rule))
            }
            None => Ok(None),
        }
    }

    /// Delete a rule.
    pub fn delete(&self, id: &RuleId) -> Result<bool> {
        let key = format!("rule:{}", id);

        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(RULE_TABLE)?;
            let existed = table.remove(key.as_str())?.is_some();
            existed
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// List rules owned by a user.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<EscalationRule>> {
        let mut rules = Vec::new();

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RULE_TABLE)?;

        let mut iter: redb::Range<&str, &[u8]> = table.iter()?;
        while let Some(result) = iter.next() {
            let (_, value) = result?;
            let rule: EscalationRule = serde_json::from_slice(value.value())?;
            if rule.user_id == user_id {
                rules.push(rule);
            }
        }

        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rules)
    }
}

/// Store for the append-only escalation log.
///
/// Rows are indexed per (rule, target) chain and per target; both indices
/// preserve append order, which is the chronological order chain derivation
/// relies on.
pub struct LogStore {
    db: Arc<Database>,
    /// Storage path for singleton
    path: String,
}

/// Global log store singleton (thread-safe).
static LOG_STORE_SINGLETON: StdMutex<Option<Arc<LogStore>>> = StdMutex::new(None);

impl LogStore {
    /// Open or create a log store.
    /// Uses a singleton pattern to prevent multiple opens of the same database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        {
            let singleton = LOG_STORE_SINGLETON.lock().unwrap();
            if let Some(store) = singleton.as_ref() {
                if store.path == path_str {
                    return Ok(store.clone());
                }
            }
        }

        let path_ref = path.as_ref();
        let db = if path_ref.exists() {
            Database::open(path_ref)?
        } else {
            Database::create(path_ref)?
        };

        // Create tables if they don't exist (redb creates them on first open_table)
        // so read transactions on a fresh database don't fail with a missing table.
        {
            let write_txn = db.begin_write()?;
            {
                let _ = write_txn.open_table(LOG_TABLE)?;
                let _ = write_txn.open_table(CHAIN_INDEX_TABLE)?;
                let _ = write_txn.open_table(TARGET_INDEX_TABLE)?;
            }
            write_txn.commit()?;
        }

        let store = Arc::new(LogStore {
            db: Arc::new(db),
            path: path_str,
        });

        *LOG_STORE_SINGLETON.lock().unwrap() = Some(store.clone());
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn memory() -> Result<Arc<Self>> {
        let temp_path =
            std::env::temp_dir().join(format!("escalation_logs_{}.redb", uuid::Uuid::new_v4()));
        Self::open(temp_path)
    }

    /// Append a log entry, updating both indices in the same transaction.
    pub fn append(&self, entry: &EscalationLogEntry) -> Result<()> {
        let key = format!("log:{}", entry.id);
        let value = serde_json::to_vec(entry)?;
        let chain_key = chain_key(&entry.rule_id, &entry.target);
        let target_key = target_key(&entry.target);

        let write_txn = self.db.begin_write()?;
        {
            let mut log_table = write_txn.open_table(LOG_TABLE)?;
            log_table.insert(key.as_str(), value.as_slice())?;

            let mut chain_index = write_txn.open_table(CHAIN_INDEX_TABLE)?;
            let mut ids: Vec<String> = match chain_index.get(chain_key.as_str())? {
                Some(v) => serde_json::from_slice(v.value())?,
                None => Vec::new(),
            };
            ids.push(entry.id.to_string());
            chain_index.insert(chain_key.as_str(), serde_json::to_vec(&ids)?.as_slice())?;

            let mut target_index = write_txn.open_table(TARGET_INDEX_TABLE)?;
            let mut ids: Vec<String> = match target_index.get(target_key.as_str())? {
                Some(v) => serde_json::from_slice(v.value())?,
                None => Vec::new(),
            };
            ids.push(entry.id.to_string());
            target_index.insert(target_key.as_str(), serde_json::to_vec(&ids)?.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load a log entry by id.
    pub fn get(&self, id: &LogId) -> Result<Option<EscalationLogEntry>> {
        let key = format!("log:{}", id);

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LOG_TABLE)?;

        match table.get(key.as_str())? {
            Some(value) => {
                let entry = serde_json::from_slice(value.value())?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// All entries for a (rule, target) chain, in append order.
    pub fn chain_entries(
        &self,
        rule_id: &RuleId,
        target: &TargetRef,
    ) -> Result<Vec<EscalationLogEntry>> {
        let key = chain_key(rule_id, target);
        self.entries_by_index(CHAIN_INDEX_TABLE, &key)
    }

    /// All entries for a target across rules, in append order.
    pub fn target_entries(&self, target: &TargetRef) -> Result<Vec<EscalationLogEntry>> {
        let key = target_key(target);
        self.entries_by_index(TARGET_INDEX_TABLE, &key)
    }

    fn entries_by_index(
        &self,
        index: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
    ) -> Result<Vec<EscalationLogEntry>> {
        let read_txn = self.db.begin_read()?;

        let ids: Vec<String> = {
            let index_table = read_txn.open_table(index)?;
            match index_table.get(key)? {
                Some(v) => serde_json::from_slice(v.value())?,
                None => return Ok(Vec::new()),
            }
        };

        let mut entries = Vec::new();
        let log_table = read_txn.open_table(LOG_TABLE)?;
        for id in ids {
            let log_key = format!("log:{}", id);
            if let Some(value) = log_table.get(log_key.as_str())? {
                let entry: EscalationLogEntry = serde_json::from_slice(value.value())?;
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// Mark a row responded, recording timestamp and optional content.
    pub fn mark_responded(
        &self,
        id: &LogId,
        at: DateTime<Utc>,
        content: Option<String>,
    ) -> Result<EscalationLogEntry> {
        self.update_row(id, |entry| {
            entry.status = EscalationStatus::Responded;
            entry.response_received_at = Some(at);
            entry.response_content = content.clone();
        })
    }

    /// Mark a row delivered (channel confirmed).
    pub fn mark_delivered(&self, id: &LogId) -> Result<EscalationLogEntry> {
        self.update_row(id, |entry| {
            entry.status = EscalationStatus::Delivered;
        })
    }

    fn update_row(
        &self,
        id: &LogId,
        mutate: impl Fn(&mut EscalationLogEntry),
    ) -> Result<EscalationLogEntry> {
        let key = format!("log:{}", id);

        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(LOG_TABLE)?;
            let mut entry: EscalationLogEntry = match table.get(key.as_str())? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(Error::LogEntryNotFound(id.to_string())),
            };
            mutate(&mut entry);
            table.insert(key.as_str(), serde_json::to_vec(&entry)?.as_slice())?;
            entry
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Entries for a user with `sent_at >= since`, in timestamp order.
    pub fn entries_for_user_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<EscalationLogEntry>> {
        let mut entries = Vec::new();

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LOG_TABLE)?;

        let mut iter: redb::Range<&str, &[u8]> = table.iter()?;
        while let Some(result) = iter.next() {
            let (_, value) = result?;
            let entry: EscalationLogEntry = serde_json::from_slice(value.value())?;
            if entry.user_id == user_id && entry.sent_at >= since {
                entries.push(entry);
            }
        }

        entries.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{EscalationStep, Tone, TriggerType};
    use cadence_notify::DeliveryChannel;

    fn test_rule() -> EscalationRule {
        EscalationRule::new(
            "user-1",
            "Overdue",
            TriggerType::Overdue,
            vec![
                EscalationStep::new(1, DeliveryChannel::Email, 0, Tone::Warm),
                EscalationStep::new(2, DeliveryChannel::Sms, 60, Tone::Direct),
            ],
            1,
            120,
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_rule_store_round_trip() {
        let store = RuleStore::memory().unwrap();
        let rule = test_rule();

        store.save(&rule).unwrap();

        let loaded = store.load(&rule.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Overdue");
        assert_eq!(loaded.total_steps(), 2);

        assert_eq!(store.list_for_user("user-1").unwrap().len(), 1);
        assert!(store.list_for_user("user-2").unwrap().is_empty());

        assert!(store.delete(&rule.id).unwrap());
        assert!(store.load(&rule.id).unwrap().is_none());
    }

    #[test]
    fn test_log_store_chain_index_preserves_order() {
        let store = LogStore::memory().unwrap();
        let rule = test_rule();
        let target = TargetRef::commitment("c-1");

        for step in 1..=3u32 {
            let entry = EscalationLogEntry::sent(
                rule.id.clone(),
                target.clone(),
                "user-1",
                step,
                DeliveryChannel::Email,
                Tone::Warm,
                format!("step {}", step),
                "a@example.com",
            );
            store.append(&entry).unwrap();
        }

        let entries = store.chain_entries(&rule.id, &target).unwrap();
        assert_eq!(entries.len(), 3);
        let orders: Vec<u32> = entries.iter().map(|e| e.step_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);

        // a different chain shares nothing
        let other = TargetRef::commitment("c-2");
        assert!(store.chain_entries(&rule.id, &other).unwrap().is_empty());
    }

    #[test]
    fn test_target_index_spans_rules() {
        let store = LogStore::memory().unwrap();
        let target = TargetRef::action_item("a-1");

        for rule_id in [RuleId::new(), RuleId::new()] {
            let entry = EscalationLogEntry::marker(
                rule_id,
                target.clone(),
                "user-1",
                EscalationStatus::Cancelled,
            );
            store.append(&entry).unwrap();
        }

        assert_eq!(store.target_entries(&target).unwrap().len(), 2);
    }

    #[test]
    fn test_mark_responded_updates_row() {
        let store = LogStore::memory().unwrap();
        let rule = test_rule();
        let target = TargetRef::commitment("c-1");
        let entry = EscalationLogEntry::sent(
            rule.id.clone(),
            target.clone(),
            "user-1",
            1,
            DeliveryChannel::Email,
            Tone::Warm,
            "msg",
            "a@example.com",
        );
        store.append(&entry).unwrap();

        let at = Utc::now();
        let updated = store
            .mark_responded(&entry.id, at, Some("on it".to_string()))
            .unwrap();
        assert_eq!(updated.status, EscalationStatus::Responded);

        // the chain view sees the update
        let entries = store.chain_entries(&rule.id, &target).unwrap();
        assert_eq!(entries[0].status, EscalationStatus::Responded);
        assert_eq!(entries[0].response_content.as_deref(), Some("on it"));

        assert!(matches!(
            store.mark_responded(&LogId::new(), at, None),
            Err(Error::LogEntryNotFound(_))
        ));
    }

    #[test]
    fn test_entries_for_user_since_filters() {
        let store = LogStore::memory().unwrap();
        let rule = test_rule();
        let entry = EscalationLogEntry::sent(
            rule.id.clone(),
            TargetRef::commitment("c-1"),
            "user-1",
            1,
            DeliveryChannel::Email,
            Tone::Warm,
            "msg",
            "a@example.com",
        );
        store.append(&entry).unwrap();

        let since = Utc::now() - chrono::Duration::days(1);
        assert_eq!(store.entries_for_user_since("user-1", since).unwrap().len(), 1);
        assert!(store.entries_for_user_since("user-2", since).unwrap().is_empty());

        let future = Utc::now() + chrono::Duration::days(1);
        assert!(store.entries_for_user_since("user-1", future).unwrap().is_empty());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.redb");
        let store = LogStore::open(&path).unwrap();
        let rule = test_rule();
        let entry = EscalationLogEntry::marker(
            rule.id.clone(),
            TargetRef::meeting("m-1"),
            "user-1",
            EscalationStatus::Paused,
        );
        store.append(&entry).unwrap();
        assert!(store.get(&entry.id).unwrap().is_some());
    }
}
