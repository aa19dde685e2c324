//! Escalation rule model.
//!
//! A rule is the immutable-per-version configuration of an escalation chain:
//! which detector it belongs to, the ordered notification steps, and the
//! retry budget applied after the sequence is exhausted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cadence_notify::{DeliveryChannel, Priority};

use super::contact::ContactId;
use super::error::{Error, Result};

/// Unique identifier for an escalation rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub Uuid);

impl RuleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::Validation(format!("Invalid rule id: {}", e)))
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Detector sweep a rule responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Item passed its due date without completion
    Overdue,
    /// Hard deadline missed
    MissedDeadline,
    /// Meeting request never acknowledged
    NoAcknowledgment,
    /// Pre-read material untouched before the meeting
    MissedPreRead,
    /// Nightly closeout found the item still open
    NightlyCloseout,
}

impl TriggerType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Overdue => "overdue",
            Self::MissedDeadline => "missed_deadline",
            Self::NoAcknowledgment => "no_acknowledgment",
            Self::MissedPreRead => "missed_pre_read",
            Self::NightlyCloseout => "nightly_closeout",
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Voice of a step's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Warm,
    Professional,
    Direct,
    Urgent,
    Final,
}

impl Tone {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Warm => "warm",
            Self::Professional => "professional",
            Self::Direct => "direct",
            Self::Urgent => "urgent",
            Self::Final => "final",
        }
    }

    /// Delivery priority implied by the tone.
    pub fn priority(&self) -> Priority {
        match self {
            Self::Warm | Self::Professional => Priority::Normal,
            Self::Direct => Priority::High,
            Self::Urgent | Self::Final => Priority::Urgent,
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Explicit recipient override on a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRecipient {
    /// Reference to a contact in the user's directory
    Contact(ContactId),
    /// Raw email address
    Email(String),
}

/// One unit of an escalation sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationStep {
    /// 1-based position in the sequence; dense and unique within a rule
    pub step_order: u32,
    /// Delivery channel for this step
    pub channel: DeliveryChannel,
    /// Delay before this step fires, relative to the previous step or chain start
    pub delay_minutes: u32,
    /// Voice of the message
    pub tone: Tone,
    /// Optional template; `{{targetTitle}}`, `{{step}}`, `{{totalSteps}}` substituted
    pub message_template: Option<String>,
    /// Optional explicit recipient; falls back to the owner's own address
    pub recipient: Option<StepRecipient>,
}

impl EscalationStep {
    /// Create a step with no template or recipient override.
    pub fn new(step_order: u32, channel: DeliveryChannel, delay_minutes: u32, tone: Tone) -> Self {
        Self {
            step_order,
            channel,
            delay_minutes,
            tone,
            message_template: None,
            recipient: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = Some(template.into());
        self
    }

    pub fn with_recipient(mut self, recipient: StepRecipient) -> Self {
        self.recipient = Some(recipient);
        self
    }
}

/// Escalation rule: an ordered, validated sequence of timed steps plus the
/// retry budget applied once the sequence is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRule {
    /// Unique rule identifier
    pub id: RuleId,
    /// Owning user
    pub user_id: String,
    /// Rule name
    pub name: String,
    /// Detector sweep this rule responds to
    pub trigger_type: TriggerType,
    /// Ordered steps, dense 1-based `step_order`
    pub steps: Vec<EscalationStep>,
    /// Whether the rule may start or continue chains
    pub is_active: bool,
    /// Full re-runs of the sequence after the first pass (>= 1)
    pub max_retries: u32,
    /// Wait between exhausting the sequence and restarting it
    pub cooldown_minutes: u32,
    /// Whether a recorded response permanently halts the chain
    pub stop_on_response: bool,
    /// When the rule was created
    pub created_at: DateTime<Utc>,
}

impl EscalationRule {
    /// Create a validated rule.
    ///
    /// Steps must form a dense, unique, 1-based sequence; they are sorted by
    /// `step_order` on acceptance so lookups are positional.
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        trigger_type: TriggerType,
        mut steps: Vec<EscalationStep>,
        max_retries: u32,
        cooldown_minutes: u32,
        stop_on_response: bool,
    ) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::Validation("Rule must have at least one step".into()));
        }
        if max_retries == 0 {
            return Err(Error::Validation("max_retries must be at least 1".into()));
        }

        steps.sort_by_key(|s| s.step_order);
        for (i, step) in steps.iter().enumerate() {
            let expected = (i + 1) as u32;
            if step.step_order != expected {
                return Err(Error::Validation(format!(
                    "Step orders must be dense and 1-based: expected {}, found {}",
                    expected, step.step_order
                )));
            }
        }

        Ok(Self {
            id: RuleId::new(),
            user_id: user_id.into(),
            name: name.into(),
            trigger_type,
            steps,
            is_active: true,
            max_retries,
            cooldown_minutes,
            stop_on_response,
            created_at: Utc::now(),
        })
    }

    /// The step at the given 1-based order, if any.
    pub fn step(&self, step_order: u32) -> Option<&EscalationStep> {
        if step_order == 0 {
            return None;
        }
        self.steps.get(step_order as usize - 1)
    }

    /// Number of steps in the sequence.
    pub fn total_steps(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn activate(&mut self) {
        self.is_active = true;
    }
}
