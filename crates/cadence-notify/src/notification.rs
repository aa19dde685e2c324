//! Notification types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique notification identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery channel for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    /// SMTP email
    Email,
    /// Text message
    Sms,
    /// Slack message
    Slack,
    /// Automated phone call
    PhoneCall,
    /// In-app notification center
    InApp,
}

impl DeliveryChannel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Slack => "slack",
            Self::PhoneCall => "phone_call",
            Self::InApp => "in_app",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            "slack" => Some(Self::Slack),
            "phone_call" | "phone" => Some(Self::PhoneCall),
            "in_app" | "inapp" => Some(Self::InApp),
            _ => None,
        }
    }

    /// All delivery kinds, in display order.
    pub fn all() -> [DeliveryChannel; 5] {
        [
            Self::Email,
            Self::Sms,
            Self::Slack,
            Self::PhoneCall,
            Self::InApp,
        ]
    }
}

impl std::fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Routine delivery
    #[default]
    Normal = 0,
    /// Should surface promptly
    High = 1,
    /// Bypasses batching
    Urgent = 2,
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A notification submitted for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier
    pub id: NotificationId,
    /// Owning user
    pub user_id: String,
    /// Delivery channel
    pub channel: DeliveryChannel,
    /// Priority
    pub priority: Priority,
    /// Short title
    pub title: String,
    /// Message body
    pub body: String,
    /// Recipient address (email, phone number, or handle depending on channel)
    pub recipient: String,
    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new notification.
    pub fn new(
        user_id: impl Into<String>,
        channel: DeliveryChannel,
        priority: Priority,
        title: impl Into<String>,
        body: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id: user_id.into(),
            channel,
            priority,
            title: title.into(),
            body: body.into(),
            recipient: recipient.into(),
            created_at: Utc::now(),
        }
    }
}
