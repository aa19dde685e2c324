//! Memory channel (for testing).

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::super::{DeliveryChannel, Error, Notification, Result};
use super::NotificationChannel;

/// In-memory channel that records every notification it receives.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    name: String,
    kind: DeliveryChannel,
    enabled: bool,
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryChannel {
    pub fn new(name: impl Into<String>, kind: DeliveryChannel) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Notifications sent through this channel so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl NotificationChannel for MemoryChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn delivery_kind(&self) -> DeliveryChannel {
        self.kind
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Priority;

    #[tokio::test]
    async fn test_memory_records_sends() {
        let channel = MemoryChannel::new("mem", DeliveryChannel::Sms);
        let n = Notification::new(
            "user-1",
            DeliveryChannel::Sms,
            Priority::Urgent,
            "Ping",
            "Pong",
            "+15550100",
        );

        channel.send(&n).await.unwrap();
        channel.send(&n).await.unwrap();

        assert_eq!(channel.sent().await.len(), 2);
        channel.clear().await;
        assert!(channel.sent().await.is_empty());
    }
}
