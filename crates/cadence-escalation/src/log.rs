//! Append-only escalation audit log.
//!
//! One row per meaningful event: a sent step, a pause marker, a cancel
//! marker, or a response. The log is the source of truth for chain status;
//! target pointers alone cannot express "paused" or "responded".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cadence_notify::DeliveryChannel;

use super::rule::{RuleId, Tone};
use super::target::TargetRef;

/// Unique log entry identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogId(pub Uuid);

impl LogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for LogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    /// Queued but not yet handed to a channel
    Pending,
    /// Submitted to the notification subsystem
    Sent,
    /// Channel confirmed delivery
    Delivered,
    /// Recipient responded
    Responded,
    /// Chain cancelled
    Cancelled,
    /// Chain paused
    Paused,
}

impl EscalationStatus {
    /// Whether this row keeps a chain counted as running.
    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Self::Pending | Self::Sent | Self::Delivered)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Responded => "responded",
            Self::Cancelled => "cancelled",
            Self::Paused => "paused",
        }
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the escalation audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationLogEntry {
    /// Unique entry identifier
    pub id: LogId,
    /// Rule the chain runs under
    pub rule_id: RuleId,
    /// Target being escalated
    pub target: TargetRef,
    /// Owning user
    pub user_id: String,
    /// Step that fired; 0 for pause/cancel markers
    pub step_order: u32,
    /// Channel used, when a step fired
    pub channel: Option<DeliveryChannel>,
    /// Tone used, when a step fired
    pub tone: Option<Tone>,
    /// Rendered message, when a step fired
    pub message: Option<String>,
    /// Resolved recipient address, when a step fired
    pub recipient: Option<String>,
    /// Row status
    pub status: EscalationStatus,
    /// When the event happened
    pub sent_at: DateTime<Utc>,
    /// When a response arrived, if one did
    pub response_received_at: Option<DateTime<Utc>>,
    /// What the response said
    pub response_content: Option<String>,
}

impl EscalationLogEntry {
    /// Row for a step that was just submitted.
    #[allow(clippy::too_many_arguments)]
    pub fn sent(
        rule_id: RuleId,
        target: TargetRef,
        user_id: impl Into<String>,
        step_order: u32,
        channel: DeliveryChannel,
        tone: Tone,
        message: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            id: LogId::new(),
            rule_id,
            target,
            user_id: user_id.into(),
            step_order,
            channel: Some(channel),
            tone: Some(tone),
            message: Some(message.into()),
            recipient: Some(recipient.into()),
            status: EscalationStatus::Sent,
            sent_at: Utc::now(),
            response_received_at: None,
            response_content: None,
        }
    }

    /// Marker row (pause or cancel) carrying no step payload.
    pub fn marker(
        rule_id: RuleId,
        target: TargetRef,
        user_id: impl Into<String>,
        status: EscalationStatus,
    ) -> Self {
        Self {
            id: LogId::new(),
            rule_id,
            target,
            user_id: user_id.into(),
            step_order: 0,
            channel: None,
            tone: None,
            message: None,
            recipient: None,
            status,
            sent_at: Utc::now(),
            response_received_at: None,
            response_content: None,
        }
    }

    /// Whether this row is a marker rather than a sent step.
    pub fn is_marker(&self) -> bool {
        self.step_order == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(EscalationStatus::Pending.is_non_terminal());
        assert!(EscalationStatus::Sent.is_non_terminal());
        assert!(EscalationStatus::Delivered.is_non_terminal());
        assert!(!EscalationStatus::Responded.is_non_terminal());
        assert!(!EscalationStatus::Cancelled.is_non_terminal());
        assert!(!EscalationStatus::Paused.is_non_terminal());
    }

    #[test]
    fn test_sent_row_shape() {
        let entry = EscalationLogEntry::sent(
            RuleId::new(),
            TargetRef::commitment("c-1"),
            "user-1",
            1,
            DeliveryChannel::Email,
            Tone::Warm,
            "Friendly nudge",
            "alex@example.com",
        );
        assert_eq!(entry.status, EscalationStatus::Sent);
        assert!(!entry.is_marker());
        assert_eq!(entry.channel, Some(DeliveryChannel::Email));
    }

    #[test]
    fn test_marker_row_shape() {
        let entry = EscalationLogEntry::marker(
            RuleId::new(),
            TargetRef::meeting("m-1"),
            "user-1",
            EscalationStatus::Paused,
        );
        assert!(entry.is_marker());
        assert!(entry.channel.is_none());
        assert!(entry.message.is_none());
    }
}
