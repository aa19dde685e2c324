//! Escalation engine for Cadence.
//!
//! When a commitment, action item, or meeting goes overdue or
//! unacknowledged, a detector sweep triggers an escalation chain: a
//! rule-defined sequence of timed notification steps that tightens in tone,
//! retries after a cooldown, and halts on response, cancellation, or pause.
//!
//! The engine never blocks on time. Every delay is a queued job; every
//! execution re-reads rule, target, and log state, so at-least-once job
//! delivery and racing control calls are safe. The append-only
//! [`EscalationLogEntry`] table is the single source of truth for chain
//! status.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cadence_escalation::{
//!     EscalationEngine, EscalationRule, EscalationStep, MemoryContactDirectory,
//!     MemoryDispatch, MemoryJobQueue, MemoryTargetRepository, LogStore, RuleStore,
//!     TargetRef, TargetSnapshot, Tone, TriggerType,
//! };
//! use cadence_notify::DeliveryChannel;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let targets = Arc::new(MemoryTargetRepository::new());
//!     let contacts = Arc::new(MemoryContactDirectory::new());
//!     contacts.set_owner_email("user-1", "me@example.com").await;
//!
//!     let engine = EscalationEngine::new(
//!         RuleStore::memory()?,
//!         LogStore::memory()?,
//!         targets.clone(),
//!         contacts,
//!         Arc::new(MemoryDispatch::new()),
//!         Arc::new(MemoryJobQueue::new()),
//!     );
//!
//!     let rule = EscalationRule::new(
//!         "user-1",
//!         "Overdue commitments",
//!         TriggerType::Overdue,
//!         vec![
//!             EscalationStep::new(1, DeliveryChannel::Email, 0, Tone::Warm),
//!             EscalationStep::new(2, DeliveryChannel::Sms, 60, Tone::Urgent),
//!         ],
//!         2,
//!         240,
//!         true,
//!     )?;
//!     engine.rules().save(&rule)?;
//!
//!     let target = TargetRef::commitment("c-1");
//!     targets
//!         .upsert(TargetSnapshot::new(target.clone(), "user-1", "Send the deck")
//!             .with_rule(rule.id.clone()))
//!         .await;
//!
//!     engine.trigger("user-1", &target, &rule.id).await?;
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod chain;
pub mod contact;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod log;
pub mod queue;
pub mod resolver;
pub mod rule;
pub mod store;
pub mod target;
pub mod worker;

pub use analytics::{ActiveChain, EscalationAnalytics};
pub use chain::{ChainState, ChainStatus};
pub use contact::{Contact, ContactDirectory, ContactId, MemoryContactDirectory, RelationshipTier};
pub use dispatch::{MemoryDispatch, NotificationDispatch};
pub use engine::EscalationEngine;
pub use error::{Error, Result};
pub use log::{EscalationLogEntry, EscalationStatus, LogId};
pub use queue::{EscalationJob, JobQueue, MemoryJobQueue, RedbJobQueue, ScheduledJob};
pub use rule::{EscalationRule, EscalationStep, RuleId, StepRecipient, Tone, TriggerType};
pub use store::{LogStore, RuleStore};
pub use target::{
    MemoryTargetRepository, TargetKind, TargetRef, TargetRepository, TargetSnapshot,
};
pub use worker::QueueWorker;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
