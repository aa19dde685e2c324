//! Console channel that logs notifications via tracing.

use async_trait::async_trait;

use super::super::{DeliveryChannel, Error, Notification, Result};
use super::NotificationChannel;

/// Channel that writes notifications to the process log.
///
/// Serves as the in-app delivery path in single-node deployments.
#[derive(Debug, Clone)]
pub struct ConsoleChannel {
    name: String,
    kind: DeliveryChannel,
    enabled: bool,
}

impl ConsoleChannel {
    pub fn new(name: impl Into<String>, kind: DeliveryChannel) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[async_trait]
impl NotificationChannel for ConsoleChannel {
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

        tracing::info!(
            channel = %self.kind,
            recipient = %notification.recipient,
            priority = %notification.priority,
            "[{}] {}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}
