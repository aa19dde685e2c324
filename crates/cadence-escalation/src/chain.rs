//! Chain state derivation.
//!
//! Chain state is a fold over the log rows for a (rule, target) pair. It is
//! recomputed from storage on every decision; nothing caches it, so
//! duplicate or reordered queue deliveries always see current truth.
//!
//! Rows are folded after the most recent cancel marker: a cancelled chain
//! leaves its audit trail behind, and the next chain for the same pair
//! starts a fresh window.

use serde::{Deserialize, Serialize};

use super::log::{EscalationLogEntry, EscalationStatus};

/// Derived status of an escalation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    /// No chain has run in the current window
    Idle,
    /// Steps are being sent or queued
    Active,
    /// A pause marker is the window's latest row
    Paused,
    /// The window ended with a cancel marker
    Cancelled,
    /// A response arrived and the rule stops on response
    Responded,
    /// Every step was sent and the level pointer reached the sequence end
    Exhausted,
}

/// Snapshot of a chain derived from its log window.
#[derive(Debug, Clone)]
pub struct ChainState {
    pub status: ChainStatus,
    /// Sent rows in the current window
    pub sent_steps: u32,
    /// Highest step order sent in the current window
    pub highest_step: u32,
}

impl ChainState {
    /// Fold the full (chronologically ordered) log slice for a (rule, target)
    /// pair into a chain state.
    ///
    /// `stop_on_response` comes from the rule; `current_level` and
    /// `total_steps` come from the target pointer and rule sequence and are
    /// only consulted to distinguish Active from Exhausted.
    pub fn derive(
        entries: &[EscalationLogEntry],
        stop_on_response: bool,
        current_level: u32,
        total_steps: u32,
    ) -> Self {
        let window = current_window(entries);

        let sent_steps = window.iter().filter(|e| !e.is_marker()).count() as u32;
        let highest_step = window
            .iter()
            .filter(|e| !e.is_marker())
            .map(|e| e.step_order)
            .max()
            .unwrap_or(0);

        let status = if window.is_empty() {
            if entries
                .last()
                .map(|e| e.status == EscalationStatus::Cancelled)
                .unwrap_or(false)
            {
                ChainStatus::Cancelled
            } else {
                ChainStatus::Idle
            }
        } else if stop_on_response && has_response(window) {
            ChainStatus::Responded
        } else if window.last().map(|e| e.status) == Some(EscalationStatus::Paused) {
            ChainStatus::Paused
        } else if has_live_rows(window) {
            if total_steps > 0 && current_level >= total_steps {
                ChainStatus::Exhausted
            } else {
                ChainStatus::Active
            }
        } else {
            ChainStatus::Idle
        };

        Self {
            status,
            sent_steps,
            highest_step,
        }
    }
}

/// Rows after the most recent cancel marker.
pub fn current_window(entries: &[EscalationLogEntry]) -> &[EscalationLogEntry] {
    let start = entries
        .iter()
        .rposition(|e| e.status == EscalationStatus::Cancelled)
        .map(|i| i + 1)
        .unwrap_or(0);
    &entries[start..]
}

/// Whether any row in the slice recorded a response.
pub fn has_response(entries: &[EscalationLogEntry]) -> bool {
    entries
        .iter()
        .any(|e| e.status == EscalationStatus::Responded)
}

fn has_live_rows(entries: &[EscalationLogEntry]) -> bool {
    entries.iter().any(|e| e.status.is_non_terminal())
}

/// Dedup check used at trigger time: does the current window still hold a
/// running chain?
///
/// A responded chain under `stop_on_response` is permanently halted and does
/// not block a fresh trigger; lingering sent rows from an exhausted pass do,
/// until a cancel resets the window.
pub fn is_active(entries: &[EscalationLogEntry], stop_on_response: bool) -> bool {
    let window = current_window(entries);
    if stop_on_response && has_response(window) {
        return false;
    }
    if window.last().map(|e| e.status) == Some(EscalationStatus::Paused) {
        return true;
    }
    has_live_rows(window)
}
