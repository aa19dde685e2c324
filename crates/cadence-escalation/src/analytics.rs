//! Reporting views derived from the log and target pointers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::engine::EscalationEngine;
use super::error::Result;
use super::log::{EscalationLogEntry, EscalationStatus};
use super::rule::RuleId;
use super::target::TargetRef;

/// A chain currently walking its steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveChain {
    pub target: TargetRef,
    pub title: String,
    pub rule_id: RuleId,
    pub rule_name: String,
    /// Step last sent
    pub current_step: u32,
    /// Steps in the rule's sequence
    pub total_steps: u32,
    pub last_escalated_at: Option<DateTime<Utc>>,
    /// When the next step is due, by the next step's configured delay
    pub next_step_at: Option<DateTime<Utc>>,
}

/// Aggregates over a trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationAnalytics {
    /// Sent steps in the window
    pub total: usize,
    pub by_channel: HashMap<String, usize>,
    pub by_tone: HashMap<String, usize>,
    pub by_target_kind: HashMap<String, usize>,
    /// Rows that received a response
    pub responded: usize,
    /// responded / total, 0.0 when the window is empty
    pub response_rate: f64,
    /// Mean minutes from send to response, when any response exists
    pub avg_response_latency_minutes: Option<f64>,
}

/// Compute aggregates over a slice of log rows. Marker rows are skipped.
pub fn compute_analytics(entries: &[EscalationLogEntry]) -> EscalationAnalytics {
    let mut by_channel: HashMap<String, usize> = HashMap::new();
    let mut by_tone: HashMap<String, usize> = HashMap::new();
    let mut by_target_kind: HashMap<String, usize> = HashMap::new();
    let mut total = 0usize;
    let mut responded = 0usize;
    let mut latencies = Vec::new();

    for entry in entries.iter().filter(|e| !e.is_marker()) {
        total += 1;
        if let Some(channel) = entry.channel {
            *by_channel.entry(channel.to_string()).or_insert(0) += 1;
        }
        if let Some(tone) = entry.tone {
            *by_tone.entry(tone.to_string()).or_insert(0) += 1;
        }
        *by_target_kind
            .entry(entry.target.kind.to_string())
            .or_insert(0) += 1;

        if entry.status == EscalationStatus::Responded {
            responded += 1;
            if let Some(at) = entry.response_received_at {
                latencies.push((at - entry.sent_at).num_seconds() as f64 / 60.0);
            }
        }
    }

    let response_rate = if total > 0 {
        responded as f64 / total as f64
    } else {
        0.0
    };
    let avg_response_latency_minutes = if latencies.is_empty() {
        None
    } else {
        Some(latencies.iter().sum::<f64>() / latencies.len() as f64)
    };

    EscalationAnalytics {
        total,
        by_channel,
        by_tone,
        by_target_kind,
        responded,
        response_rate,
        avg_response_latency_minutes,
    }
}

impl EscalationEngine {
    /// Chains currently in progress for a user.
    pub async fn active_chains(&self, user_id: &str) -> Result<Vec<ActiveChain>> {
        let mut chains = Vec::new();

        for snapshot in self.targets().list_for_user(user_id).await {
            if snapshot.terminal || snapshot.current_escalation_level == 0 {
                continue;
            }

            let rule_id = match &snapshot.escalation_rule_id {
                Some(rule_id) => rule_id.clone(),
                None => match self
                    .logs()
                    .target_entries(&snapshot.reference)?
                    .last()
                    .map(|e| e.rule_id.clone())
                {
                    Some(rule_id) => rule_id,
                    None => continue,
                },
            };
            let Some(rule) = self.rules().load(&rule_id)? else {
                continue;
            };

            let next_step_at = rule
                .step(snapshot.current_escalation_level + 1)
                .and_then(|next| {
                    snapshot
                        .last_escalated_at
                        .map(|at| at + Duration::minutes(next.delay_minutes as i64))
                });

            chains.push(ActiveChain {
                target: snapshot.reference.clone(),
                title: snapshot.title.clone(),
                rule_id,
                rule_name: rule.name.clone(),
                current_step: snapshot.current_escalation_level,
                total_steps: rule.total_steps(),
                last_escalated_at: snapshot.last_escalated_at,
                next_step_at,
            });
        }

        chains.sort_by(|a, b| b.last_escalated_at.cmp(&a.last_escalated_at));
        Ok(chains)
    }

    /// Aggregates over the trailing `window_days` for a user.
    pub async fn analytics(&self, user_id: &str, window_days: u32) -> Result<EscalationAnalytics> {
        let since = Utc::now() - Duration::days(window_days as i64);
        let entries = self.logs().entries_for_user_since(user_id, since)?;
        Ok(compute_analytics(&entries))
    }
}
