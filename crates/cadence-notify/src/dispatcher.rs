//! Notification dispatcher.
//!
//! Routes a notification to the channel registered for its delivery kind and
//! reports whether delivery happened. Delivery is best-effort: failures and
//! suppressions are logged, never escalated to the caller as errors.

use chrono::{Timelike, Utc};
use std::sync::Arc;

use super::channels::{ChannelRegistry, NotificationChannel};
use super::{Notification, Result};

/// Hours during which outbound delivery is suppressed (focus window).
///
/// Covers wrap-around windows: `start_hour = 22, end_hour = 7` suppresses
/// overnight. `start_hour == end_hour` is an empty window. Suppressed
/// notifications report `delivered = false`.
#[derive(Debug, Clone, Copy)]
pub struct QuietHours {
    /// First suppressed hour (0-23)
    pub start_hour: u32,
    /// First hour delivery resumes (0-23)
    pub end_hour: u32,
}

impl QuietHours {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour: start_hour % 24,
            end_hour: end_hour % 24,
        }
    }

    /// Whether the given hour falls inside the window.
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Dispatcher that submits notifications to delivery channels.
pub struct Dispatcher {
    channels: Arc<ChannelRegistry>,
    quiet_hours: Option<QuietHours>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(ChannelRegistry::new()),
            quiet_hours: None,
        }
    }

    /// Suppress delivery during the given window.
    pub fn with_quiet_hours(mut self, quiet_hours: QuietHours) -> Self {
        self.quiet_hours = Some(quiet_hours);
        self
    }

    /// Register a channel for its delivery kind.
    pub async fn register(&self, channel: Arc<dyn NotificationChannel>) {
        self.channels.register(channel).await;
    }

    /// The underlying channel registry.
    pub fn channels(&self) -> Arc<ChannelRegistry> {
        self.channels.clone()
    }

    /// Submit a notification for delivery.
    ///
    /// Returns `Ok(true)` when a channel accepted the notification,
    /// `Ok(false)` when it was suppressed, no channel was registered for the
    /// kind, or the channel failed. Errors are reserved for conditions the
    /// caller could act on; there are none today.
    pub async fn submit(&self, notification: &Notification) -> Result<bool> {
        if let Some(window) = self.quiet_hours {
            let hour = Utc::now().hour();
            if window.contains(hour) {
                tracing::debug!(
                    recipient = %notification.recipient,
                    "Suppressing notification during quiet hours"
                );
                return Ok(false);
            }
        }

        let Some(channel) = self.channels.get(notification.channel).await else {
            tracing::warn!(
                kind = %notification.channel,
                "No channel registered for delivery kind"
            );
            return Ok(false);
        };

        if !channel.is_enabled() {
            tracing::debug!(channel = channel.name(), "Channel disabled, skipping");
            return Ok(false);
        }

        match channel.send(notification).await {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::warn!(
                    channel = channel.name(),
                    recipient = %notification.recipient,
                    "Delivery failed: {}",
                    e
                );
                Ok(false)
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::MemoryChannel;
    use crate::{DeliveryChannel, Priority};

    fn notification(channel: DeliveryChannel) -> Notification {
        Notification::new(
            "user-1",
            channel,
            Priority::Normal,
            "Reminder",
            "You have an overdue action item.",
            "user@example.com",
        )
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_kind() {
        let dispatcher = Dispatcher::new();
        let email = Arc::new(MemoryChannel::new("email", DeliveryChannel::Email));
        let sms = Arc::new(MemoryChannel::new("sms", DeliveryChannel::Sms));
        dispatcher.register(email.clone()).await;
        dispatcher.register(sms.clone()).await;

        let delivered = dispatcher
            .submit(&notification(DeliveryChannel::Email))
            .await
            .unwrap();

        assert!(delivered);
        assert_eq!(email.sent().await.len(), 1);
        assert!(sms.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_without_channel_is_not_delivered() {
        let dispatcher = Dispatcher::new();
        let delivered = dispatcher
            .submit(&notification(DeliveryChannel::PhoneCall))
            .await
            .unwrap();
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_quiet_hours_suppress() {
        // Window built around the current hour, so the test is time-independent.
        let hour = Utc::now().hour();
        let window = QuietHours::new(hour, (hour + 1) % 24);
        assert!(window.contains(hour));

        let dispatcher = Dispatcher::new().with_quiet_hours(window);
        let email = Arc::new(MemoryChannel::new("email", DeliveryChannel::Email));
        dispatcher.register(email.clone()).await;

        let delivered = dispatcher
            .submit(&notification(DeliveryChannel::Email))
            .await
            .unwrap();
        assert!(!delivered);
        assert!(email.sent().await.is_empty());
    }

    #[test]
    fn test_quiet_hours_wraparound() {
        let overnight = QuietHours::new(22, 7);
        assert!(overnight.contains(23));
        assert!(overnight.contains(3));
        assert!(!overnight.contains(12));

        let daytime = QuietHours::new(9, 17);
        assert!(daytime.contains(9));
        assert!(!daytime.contains(17));
        assert!(!daytime.contains(3));
    }
}
