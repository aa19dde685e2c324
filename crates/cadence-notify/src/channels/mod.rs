//! Delivery channels for sending notifications.

pub mod console;
pub mod memory;

#[cfg(feature = "webhook")]
pub mod webhook;

#[cfg(feature = "email")]
pub mod email;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{DeliveryChannel, Error, Notification, Result};

pub use console::ConsoleChannel;
pub use memory::MemoryChannel;

#[cfg(feature = "webhook")]
pub use webhook::WebhookChannel;

#[cfg(feature = "email")]
pub use email::EmailChannel;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel name.
    fn name(&self) -> &str;

    /// The delivery kind this channel serves.
    fn delivery_kind(&self) -> DeliveryChannel;

    /// Check if the channel is enabled.
    fn is_enabled(&self) -> bool;

    /// Send a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Channel registry keyed by delivery kind.
pub struct ChannelRegistry {
    channels: RwLock<HashMap<DeliveryChannel, Arc<dyn NotificationChannel>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Register a channel for its delivery kind, replacing any previous one.
    pub async fn register(&self, channel: Arc<dyn NotificationChannel>) {
        let kind = channel.delivery_kind();
        self.channels.write().await.insert(kind, channel);
    }

    /// Unregister the channel for a delivery kind.
    pub async fn unregister(&self, kind: DeliveryChannel) -> bool {
        self.channels.write().await.remove(&kind).is_some()
    }

    /// Get the channel for a delivery kind.
    pub async fn get(&self, kind: DeliveryChannel) -> Option<Arc<dyn NotificationChannel>> {
        self.channels.read().await.get(&kind).cloned()
    }

    /// List registered delivery kinds.
    pub async fn list_kinds(&self) -> Vec<DeliveryChannel> {
        self.channels.read().await.keys().copied().collect()
    }

    /// Get the number of registered channels.
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Check if empty.
    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }

    /// Test a channel by sending a probe notification.
    pub async fn test(&self, kind: DeliveryChannel) -> Result<bool> {
        let channel = self
            .get(kind)
            .await
            .ok_or_else(|| Error::NoChannel(kind.to_string()))?;

        let probe = Notification::new(
            "system",
            kind,
            crate::Priority::Normal,
            "Test notification",
            "Verifying this channel is reachable.",
            "test@localhost",
        );

        Ok(channel.send(&probe).await.is_ok())
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
