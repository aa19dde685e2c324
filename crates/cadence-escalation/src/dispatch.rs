//! Notification submission seam.
//!
//! The engine submits messages and learns only whether delivery happened.
//! Undelivered messages are not retried here; the chain's own cooldown cycle
//! governs re-attempts.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use cadence_notify::{Dispatcher, Notification};

/// What the engine needs from the notification subsystem.
#[async_trait]
pub trait NotificationDispatch: Send + Sync {
    /// Submit a notification; returns whether a channel accepted it.
    async fn submit(&self, notification: &Notification) -> bool;
}

#[async_trait]
impl NotificationDispatch for Dispatcher {
    async fn submit(&self, notification: &Notification) -> bool {
        Dispatcher::submit(self, notification).await.unwrap_or(false)
    }
}

/// In-memory dispatch recording submissions (for testing).
pub struct MemoryDispatch {
    delivered: bool,
    submitted: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryDispatch {
    /// Dispatch that reports every submission as delivered.
    pub fn new() -> Self {
        Self {
            delivered: true,
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Dispatch that accepts submissions but reports them undelivered.
    pub fn undeliverable() -> Self {
        Self {
            delivered: false,
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Notifications submitted so far.
    pub async fn submitted(&self) -> Vec<Notification> {
        self.submitted.lock().await.clone()
    }
}

impl Default for MemoryDispatch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationDispatch for MemoryDispatch {
    async fn submit(&self, notification: &Notification) -> bool {
        self.submitted.lock().await.push(notification.clone());
        self.delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_notify::{DeliveryChannel, Priority};

    #[tokio::test]
    async fn test_memory_dispatch_records() {
        let dispatch = MemoryDispatch::new();
        let n = Notification::new(
            "user-1",
            DeliveryChannel::Email,
            Priority::Normal,
            "Hello",
            "World",
            "a@example.com",
        );
        assert!(dispatch.submit(&n).await);
        assert_eq!(dispatch.submitted().await.len(), 1);

        let dropped = MemoryDispatch::undeliverable();
        assert!(!dropped.submit(&n).await);
        assert_eq!(dropped.submitted().await.len(), 1);
    }
}
