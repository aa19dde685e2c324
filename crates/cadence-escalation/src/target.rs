//! Escalation targets.
//!
//! A target is whatever an escalation chain is chasing: a commitment, an
//! action item, or a meeting needing acknowledgment or prep. Business
//! entities live elsewhere; the engine only sees the small capability set
//! below, plus the two fields it owns on each target: the escalation level
//! pointer and the last-escalated timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::error::{Error, Result};
use super::rule::RuleId;

/// Kind of entity being escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A commitment made to someone
    Commitment,
    /// An action item from a meeting
    ActionItem,
    /// A meeting needing acknowledgment or pre-read
    Meeting,
}

impl TargetKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Commitment => "commitment",
            Self::ActionItem => "action_item",
            Self::Meeting => "meeting",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Polymorphic reference to an escalation target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub kind: TargetKind,
    pub id: String,
}

impl TargetRef {
    pub fn new(kind: TargetKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn commitment(id: impl Into<String>) -> Self {
        Self::new(TargetKind::Commitment, id)
    }

    pub fn action_item(id: impl Into<String>) -> Self {
        Self::new(TargetKind::ActionItem, id)
    }

    pub fn meeting(id: impl Into<String>) -> Self {
        Self::new(TargetKind::Meeting, id)
    }
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// The engine's view of a target at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSnapshot {
    /// Reference back to the entity
    pub reference: TargetRef,
    /// Owning user
    pub user_id: String,
    /// Human-readable title, used in rendered messages
    pub title: String,
    /// Rule assigned to this target, if any
    pub escalation_rule_id: Option<RuleId>,
    /// Step last successfully sent; 0 = not yet escalated
    pub current_escalation_level: u32,
    /// When the last step was sent
    pub last_escalated_at: Option<DateTime<Utc>>,
    /// Whether the entity reached a terminal business state (e.g. completed)
    pub terminal: bool,
}

impl TargetSnapshot {
    pub fn new(reference: TargetRef, user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            reference,
            user_id: user_id.into(),
            title: title.into(),
            escalation_rule_id: None,
            current_escalation_level: 0,
            last_escalated_at: None,
            terminal: false,
        }
    }

    pub fn with_rule(mut self, rule_id: RuleId) -> Self {
        self.escalation_rule_id = Some(rule_id);
        self
    }
}

/// Capability set the engine needs from target storage.
///
/// Implemented once per deployment over the real entity tables; the in-memory
/// implementation below serves tests and embedded use.
#[async_trait]
pub trait TargetRepository: Send + Sync {
    /// Load a target's snapshot, `None` if it does not exist.
    async fn load(&self, target: &TargetRef) -> Option<TargetSnapshot>;

    /// Record that the step at `level` was sent at `at`.
    ///
    /// The level pointer only moves forward here; resets go through
    /// [`reset_level`](Self::reset_level).
    async fn advance_level(&self, target: &TargetRef, level: u32, at: DateTime<Utc>) -> Result<()>;

    /// Reset the level pointer to 0 (chain cancelled).
    async fn reset_level(&self, target: &TargetRef) -> Result<()>;

    /// All of a user's targets, for reporting views.
    async fn list_for_user(&self, user_id: &str) -> Vec<TargetSnapshot>;
}

/// In-memory target repository.
pub struct MemoryTargetRepository {
    targets: RwLock<HashMap<TargetRef, TargetSnapshot>>,
}

impl MemoryTargetRepository {
    pub fn new() -> Self {
        Self {
            targets: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a target.
    pub async fn upsert(&self, snapshot: TargetSnapshot) {
        self.targets
            .write()
            .await
            .insert(snapshot.reference.clone(), snapshot);
    }

    /// Mark a target's business state terminal.
    pub async fn mark_terminal(&self, target: &TargetRef) {
        if let Some(snapshot) = self.targets.write().await.get_mut(target) {
            snapshot.terminal = true;
        }
    }

    pub async fn remove(&self, target: &TargetRef) {
        self.targets.write().await.remove(target);
    }
}

impl Default for MemoryTargetRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetRepository for MemoryTargetRepository {
    async fn load(&self, target: &TargetRef) -> Option<TargetSnapshot> {
        self.targets.read().await.get(target).cloned()
    }

    async fn advance_level(&self, target: &TargetRef, level: u32, at: DateTime<Utc>) -> Result<()> {
        let mut targets = self.targets.write().await;
        let snapshot = targets
            .get_mut(target)
            .ok_or_else(|| Error::TargetNotFound(target.to_string()))?;
        snapshot.current_escalation_level = level;
        snapshot.last_escalated_at = Some(at);
        Ok(())
    }

    async fn reset_level(&self, target: &TargetRef) -> Result<()> {
        let mut targets = self.targets.write().await;
        let snapshot = targets
            .get_mut(target)
            .ok_or_else(|| Error::TargetNotFound(target.to_string()))?;
        snapshot.current_escalation_level = 0;
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Vec<TargetSnapshot> {
        self.targets
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_repository_round_trip() {
        let repo = MemoryTargetRepository::new();
        let target = TargetRef::commitment("c-1");
        repo.upsert(TargetSnapshot::new(target.clone(), "user-1", "Send the deck"))
            .await;

        let snapshot = repo.load(&target).await.unwrap();
        assert_eq!(snapshot.current_escalation_level, 0);
        assert_eq!(snapshot.title, "Send the deck");

        let at = Utc::now();
        repo.advance_level(&target, 2, at).await.unwrap();
        let snapshot = repo.load(&target).await.unwrap();
        assert_eq!(snapshot.current_escalation_level, 2);
        assert_eq!(snapshot.last_escalated_at, Some(at));

        repo.reset_level(&target).await.unwrap();
        assert_eq!(repo.load(&target).await.unwrap().current_escalation_level, 0);
    }

    #[tokio::test]
    async fn test_advance_unknown_target_errors() {
        let repo = MemoryTargetRepository::new();
        let missing = TargetRef::action_item("nope");
        assert!(matches!(
            repo.advance_level(&missing, 1, Utc::now()).await,
            Err(Error::TargetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_terminal() {
        let repo = MemoryTargetRepository::new();
        let target = TargetRef::meeting("m-1");
        repo.upsert(TargetSnapshot::new(target.clone(), "user-1", "Weekly 1:1"))
            .await;
        repo.mark_terminal(&target).await;
        assert!(repo.load(&target).await.unwrap().terminal);
    }
}
