//! Recipient and message resolution.

use super::contact::ContactDirectory;
use super::error::{Error, Result};
use super::rule::{EscalationStep, StepRecipient, Tone};

/// Resolve the address a step should be sent to.
///
/// Precedence: the step's contact reference, then its raw email, then the
/// escalating user's own address. A contact reference that no longer
/// resolves falls through to the owner address rather than dropping the step.
pub async fn resolve_recipient(
    step: &EscalationStep,
    user_id: &str,
    contacts: &dyn ContactDirectory,
) -> Result<String> {
    match &step.recipient {
        Some(StepRecipient::Contact(id)) => {
            if let Some(email) = contacts.contact_email(id).await {
                return Ok(email);
            }
            tracing::warn!(contact = %id, "Step contact no longer resolves, using owner address");
        }
        Some(StepRecipient::Email(email)) => return Ok(email.clone()),
        None => {}
    }

    contacts
        .owner_email(user_id)
        .await
        .ok_or_else(|| Error::Validation(format!("No recipient resolvable for user {}", user_id)))
}

/// Render the message for a step.
///
/// A template substitutes `{{targetTitle}}`, `{{step}}`, `{{totalSteps}}`;
/// otherwise a canned message is selected by tone.
pub fn render_message(
    step: &EscalationStep,
    target_title: &str,
    total_steps: u32,
) -> String {
    if let Some(template) = &step.message_template {
        return template
            .replace("{{targetTitle}}", target_title)
            .replace("{{step}}", &step.step_order.to_string())
            .replace("{{totalSteps}}", &total_steps.to_string());
    }

    canned_message(step.tone, target_title, step.step_order, total_steps)
}

fn canned_message(tone: Tone, title: &str, step: u32, total: u32) -> String {
    match tone {
        Tone::Warm => format!(
            "Hi! Just a gentle nudge about \"{}\". This is reminder {} of {}.",
            title, step, total
        ),
        Tone::Professional => format!(
            "Following up on \"{}\" (reminder {} of {}). A quick status update would be appreciated.",
            title, step, total
        ),
        Tone::Direct => format!(
            "\"{}\" still needs your attention. Reminder {} of {}.",
            title, step, total
        ),
        Tone::Urgent => format!(
            "Urgent: \"{}\" remains unresolved. Reminder {} of {}. Please respond.",
            title, step, total
        ),
        Tone::Final => format!(
            "Final notice ({} of {}): \"{}\" has received no response and follow-up ends after this message.",
            step, total, title
        ),
    }
}

/// Title line for the outbound notification.
pub fn notification_title(target_title: &str, step: u32, total: u32) -> String {
    format!("Follow-up {}/{}: {}", step, total, target_title)
}
