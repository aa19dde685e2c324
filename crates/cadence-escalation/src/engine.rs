//! Escalation engine.
//!
//! One struct owns the chain lifecycle: triggering, queue-driven stepping,
//! and the out-of-band controls (pause, resume, cancel, response recording).
//! Every operation re-reads rule, target, and log state; the engine holds no
//! chain state of its own, so duplicate or out-of-order queue deliveries and
//! racing control calls converge on the log's truth.

use chrono::Utc;
use std::sync::Arc;

use cadence_notify::Notification;

use super::chain;
use super::contact::ContactDirectory;
use super::dispatch::NotificationDispatch;
use super::error::{Error, Result};
use super::log::{EscalationLogEntry, EscalationStatus, LogId};
use super::queue::{EscalationJob, JobQueue};
use super::resolver;
use super::rule::{EscalationRule, RuleId};
use super::store::{LogStore, RuleStore};
use super::target::{TargetRef, TargetRepository, TargetSnapshot};

/// The escalation engine.
pub struct EscalationEngine {
    rules: Arc<RuleStore>,
    logs: Arc<LogStore>,
    targets: Arc<dyn TargetRepository>,
    contacts: Arc<dyn ContactDirectory>,
    dispatch: Arc<dyn NotificationDispatch>,
    queue: Arc<dyn JobQueue>,
}

impl EscalationEngine {
    pub fn new(
        rules: Arc<RuleStore>,
        logs: Arc<LogStore>,
        targets: Arc<dyn TargetRepository>,
        contacts: Arc<dyn ContactDirectory>,
        dispatch: Arc<dyn NotificationDispatch>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            rules,
            logs,
            targets,
            contacts,
            dispatch,
            queue,
        }
    }

    /// The log store backing this engine.
    pub fn logs(&self) -> Arc<LogStore> {
        self.logs.clone()
    }

    /// The rule store backing this engine.
    pub fn rules(&self) -> Arc<RuleStore> {
        self.rules.clone()
    }

    /// The target repository backing this engine.
    pub fn targets(&self) -> Arc<dyn TargetRepository> {
        self.targets.clone()
    }

    /// Start an escalation chain for a target.
    ///
    /// Entry point for detector sweeps (overdue, missed-deadline,
    /// no-acknowledgment, missed-pre-read, nightly-closeout). Enforces the
    /// one-active-chain invariant; detectors treat the conflict error as a
    /// no-op signal.
    pub async fn trigger(
        &self,
        user_id: &str,
        target: &TargetRef,
        rule_id: &RuleId,
    ) -> Result<()> {
        let rule = self.load_owned_rule(user_id, rule_id)?;
        if !rule.is_active {
            return Err(Error::RuleInactive(rule_id.to_string()));
        }

        let entries = self.logs.chain_entries(rule_id, target)?;
        if chain::is_active(&entries, rule.stop_on_response) {
            return Err(Error::ChainAlreadyActive(target.to_string()));
        }

        tracing::info!(%rule_id, %target, "Starting escalation chain");
        // The pending row is the dedup token: a second trigger arriving
        // before the first job executes already sees a live chain.
        self.logs.append(&EscalationLogEntry::marker(
            rule_id.clone(),
            target.clone(),
            user_id,
            EscalationStatus::Pending,
        ))?;
        self.queue
            .enqueue(
                EscalationJob::initial(user_id, target.clone(), rule_id.clone()),
                0,
            )
            .await
    }

    /// Execute one queued step.
    ///
    /// Invoked by the queue consumer for every scheduled job. Idempotent:
    /// safe to run more than once for the same logical step and safe to race
    /// a pause or cancel, because all state is re-read here. Conditions that
    /// end a chain return `Ok`; queue-driven stepping has no one to report
    /// errors to.
    pub async fn execute_step(&self, job: EscalationJob) -> Result<()> {
        let Some(rule) = self.rules.load(&job.rule_id)? else {
            tracing::debug!(rule_id = %job.rule_id, "Rule gone, dropping job");
            return Ok(());
        };
        if !rule.is_active || rule.user_id != job.user_id {
            tracing::debug!(rule_id = %job.rule_id, "Rule inactive, dropping job");
            return Ok(());
        }

        let Some(target) = self.targets.load(&job.target).await else {
            tracing::debug!(target = %job.target, "Target gone, dropping job");
            return Ok(());
        };
        if target.terminal {
            tracing::debug!(target = %job.target, "Target reached terminal state, dropping job");
            return Ok(());
        }

        let entries = self.logs.chain_entries(&job.rule_id, &job.target)?;
        if rule.stop_on_response && chain::has_response(chain::current_window(&entries)) {
            tracing::info!(target = %job.target, "Response recorded, chain halted");
            return Ok(());
        }
        match entries.last().map(|e| e.status) {
            Some(EscalationStatus::Cancelled) => {
                tracing::debug!(target = %job.target, "Chain cancelled, dropping job");
                return Ok(());
            }
            Some(EscalationStatus::Paused) => {
                tracing::info!(target = %job.target, "Chain paused, step skipped");
                return Ok(());
            }
            _ => {}
        }

        let next_order = target.current_escalation_level + 1;
        let Some(step) = rule.step(next_order) else {
            return self.schedule_retry_cycle(&rule, &job).await;
        };

        let recipient = match resolver::resolve_recipient(step, &job.user_id, &*self.contacts).await
        {
            Ok(recipient) => recipient,
            Err(e) => {
                tracing::warn!(target = %job.target, "Recipient unresolvable, stopping: {}", e);
                return Ok(());
            }
        };
        let message = resolver::render_message(step, &target.title, rule.total_steps());

        // Log first: a failure before the pointer update leaves a row the
        // next delivery of this job can reconcile against.
        let entry = EscalationLogEntry::sent(
            rule.id.clone(),
            job.target.clone(),
            job.user_id.clone(),
            step.step_order,
            step.channel,
            step.tone,
            message.clone(),
            recipient.clone(),
        );
        self.logs.append(&entry)?;
        self.targets
            .advance_level(&job.target, step.step_order, Utc::now())
            .await?;

        let notification = Notification::new(
            job.user_id.clone(),
            step.channel,
            step.tone.priority(),
            resolver::notification_title(&target.title, step.step_order, rule.total_steps()),
            message,
            recipient.clone(),
        );
        if self.dispatch.submit(&notification).await {
            self.logs.mark_delivered(&entry.id)?;
        } else {
            tracing::warn!(
                target = %job.target,
                step = step.step_order,
                "Notification not delivered; cooldown cycle governs any retry"
            );
        }

        match rule.step(next_order + 1) {
            Some(following) => {
                let tier_delay = self.contacts.tier_delay_minutes(&recipient).await;
                let delay = following.delay_minutes + tier_delay;
                tracing::debug!(
                    target = %job.target,
                    step = following.step_order,
                    delay_minutes = delay,
                    "Scheduling next step"
                );
                self.queue
                    .enqueue(
                        EscalationJob {
                            user_id: job.user_id.clone(),
                            target: job.target.clone(),
                            rule_id: job.rule_id.clone(),
                            step_order: following.step_order,
                            retry_count: job.retry_count,
                        },
                        delay,
                    )
                    .await
            }
            None => self.schedule_retry_cycle(&rule, &job).await,
        }
    }

    /// Schedule another full pass if the retry budget allows, else terminate.
    async fn schedule_retry_cycle(&self, rule: &EscalationRule, job: &EscalationJob) -> Result<()> {
        if job.retry_count < rule.max_retries {
            tracing::info!(
                target = %job.target,
                retry = job.retry_count + 1,
                cooldown_minutes = rule.cooldown_minutes,
                "Sequence exhausted, scheduling retry cycle"
            );
            // The next pass walks the sequence from step 1 again.
            self.targets.reset_level(&job.target).await?;
            self.queue
                .enqueue(
                    EscalationJob {
                        user_id: job.user_id.clone(),
                        target: job.target.clone(),
                        rule_id: job.rule_id.clone(),
                        step_order: 0,
                        retry_count: job.retry_count + 1,
                    },
                    rule.cooldown_minutes,
                )
                .await
        } else {
            tracing::info!(target = %job.target, "Retries exhausted, chain terminated");
            Ok(())
        }
    }

    /// Pause a chain. The already-scheduled next step still fires but
    /// no-ops on its log re-check.
    pub async fn pause(&self, user_id: &str, target: &TargetRef) -> Result<()> {
        let (snapshot, rule_id) = self.load_owned_target_with_rule(user_id, target).await?;
        tracing::info!(%target, "Pausing escalation chain");
        self.logs.append(&EscalationLogEntry::marker(
            rule_id,
            snapshot.reference,
            user_id,
            EscalationStatus::Paused,
        ))?;
        Ok(())
    }

    /// Resume a paused chain.
    ///
    /// The pause marker is superseded by a cancel marker and the chain is
    /// re-triggered from the first step; numbering restarts rather than
    /// continuing from the paused step.
    pub async fn resume(&self, user_id: &str, target: &TargetRef) -> Result<()> {
        let (snapshot, rule_id) = self.load_owned_target_with_rule(user_id, target).await?;
        if snapshot.terminal {
            return Err(Error::TargetTerminal(target.to_string()));
        }
        let rule = self.load_owned_rule(user_id, &rule_id)?;

        let entries = self.logs.chain_entries(&rule_id, target)?;
        let window = chain::current_window(&entries);
        if window.last().map(|e| e.status) != Some(EscalationStatus::Paused) {
            return Err(Error::NoPausedChain(target.to_string()));
        }

        tracing::info!(%target, "Resuming escalation chain from the top");
        self.logs.append(&EscalationLogEntry::marker(
            rule_id.clone(),
            target.clone(),
            user_id,
            EscalationStatus::Cancelled,
        ))?;
        self.targets.reset_level(target).await?;

        if !rule.is_active {
            return Err(Error::RuleInactive(rule_id.to_string()));
        }
        self.queue
            .enqueue(
                EscalationJob::initial(user_id, target.clone(), rule_id),
                0,
            )
            .await
    }

    /// Cancel a chain and reset the target's level pointer.
    pub async fn cancel(&self, user_id: &str, target: &TargetRef) -> Result<()> {
        let (_, rule_id) = self.load_owned_target_with_rule(user_id, target).await?;
        tracing::info!(%target, "Cancelling escalation chain");
        self.logs.append(&EscalationLogEntry::marker(
            rule_id,
            target.clone(),
            user_id,
            EscalationStatus::Cancelled,
        ))?;
        self.targets.reset_level(target).await?;
        Ok(())
    }

    /// Record a response against a sent step.
    ///
    /// Combined with `stop_on_response`, this halts all future stepping for
    /// the chain; already-queued jobs self-terminate on their re-check.
    pub async fn record_response(
        &self,
        user_id: &str,
        log_id: &LogId,
        content: Option<String>,
    ) -> Result<EscalationLogEntry> {
        let entry = self
            .logs
            .get(log_id)?
            .ok_or_else(|| Error::LogEntryNotFound(log_id.to_string()))?;
        if entry.user_id != user_id {
            return Err(Error::LogEntryNotFound(log_id.to_string()));
        }

        tracing::info!(target = %entry.target, step = entry.step_order, "Recording response");
        self.logs.mark_responded(log_id, Utc::now(), content)
    }

    fn load_owned_rule(&self, user_id: &str, rule_id: &RuleId) -> Result<EscalationRule> {
        let rule = self
            .rules
            .load(rule_id)?
            .ok_or_else(|| Error::RuleNotFound(rule_id.to_string()))?;
        if rule.user_id != user_id {
            return Err(Error::RuleNotFound(rule_id.to_string()));
        }
        Ok(rule)
    }

    /// Load a target with ownership check and resolve its governing rule:
    /// the target's assigned rule, falling back to the most recent log row.
    async fn load_owned_target_with_rule(
        &self,
        user_id: &str,
        target: &TargetRef,
    ) -> Result<(TargetSnapshot, RuleId)> {
        let snapshot = self
            .targets
            .load(target)
            .await
            .ok_or_else(|| Error::TargetNotFound(target.to_string()))?;
        if snapshot.user_id != user_id {
            return Err(Error::TargetNotFound(target.to_string()));
        }

        let rule_id = match &snapshot.escalation_rule_id {
            Some(rule_id) => rule_id.clone(),
            None => self
                .logs
                .target_entries(target)?
                .last()
                .map(|e| e.rule_id.clone())
                .ok_or_else(|| Error::RuleNotFound(format!("no rule for target {}", target)))?,
        };

        Ok((snapshot, rule_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::MemoryContactDirectory;
    use crate::dispatch::MemoryDispatch;
    use crate::queue::MemoryJobQueue;
    use crate::rule::{EscalationStep, Tone, TriggerType};
    use crate::target::{MemoryTargetRepository, TargetSnapshot};
    use cadence_notify::DeliveryChannel;
    use chrono::Duration;

    struct Fixture {
        engine: EscalationEngine,
        queue: Arc<MemoryJobQueue>,
        targets: Arc<MemoryTargetRepository>,
        dispatch: Arc<MemoryDispatch>,
    }

    async fn fixture() -> Fixture {
        let queue = Arc::new(MemoryJobQueue::new());
        let targets = Arc::new(MemoryTargetRepository::new());
        let dispatch = Arc::new(MemoryDispatch::new());
        let contacts = Arc::new(MemoryContactDirectory::new());
        contacts.set_owner_email("user-1", "me@example.com").await;

        let engine = EscalationEngine::new(
            RuleStore::memory().unwrap(),
            LogStore::memory().unwrap(),
            targets.clone(),
            contacts.clone(),
            dispatch.clone(),
            queue.clone(),
        );

        Fixture {
            engine,
            queue,
            targets,
            dispatch,
        }
    }

    fn two_step_rule(stop_on_response: bool) -> EscalationRule {
        EscalationRule::new(
            "user-1",
            "Overdue follow-up",
            TriggerType::Overdue,
            vec![
                EscalationStep::new(1, DeliveryChannel::Email, 0, Tone::Warm),
                EscalationStep::new(2, DeliveryChannel::Sms, 60, Tone::Direct),
            ],
            1,
            120,
            stop_on_response,
        )
        .unwrap()
    }

    async fn seed(f: &Fixture, rule: &EscalationRule) -> TargetRef {
        f.engine.rules.save(rule).unwrap();
        let target = TargetRef::commitment("c-1");
        f.targets
            .upsert(
                TargetSnapshot::new(target.clone(), "user-1", "Send the deck")
                    .with_rule(rule.id.clone()),
            )
            .await;
        target
    }

    /// Pop every due job (far future) and execute it, until the queue drains.
    async fn pump(f: &Fixture) {
        let far = Utc::now() + Duration::days(365);
        loop {
            let due = f.queue.pop_due(far).await.unwrap();
            if due.is_empty() {
                break;
            }
            for job in due {
                f.engine.execute_step(job).await.unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_trigger_enqueues_initial_job() {
        let f = fixture().await;
        let rule = two_step_rule(true);
        let target = seed(&f, &rule).await;

        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();

        let scheduled = f.queue.scheduled();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].delay_minutes, 0);
        assert_eq!(scheduled[0].job.step_order, 0);
        assert_eq!(scheduled[0].job.retry_count, 0);
    }

    #[tokio::test]
    async fn test_trigger_rejects_unknown_and_foreign_rules() {
        let f = fixture().await;
        let rule = two_step_rule(true);
        let target = seed(&f, &rule).await;

        assert!(matches!(
            f.engine.trigger("user-1", &target, &RuleId::new()).await,
            Err(Error::RuleNotFound(_))
        ));
        assert!(matches!(
            f.engine.trigger("user-2", &target, &rule.id).await,
            Err(Error::RuleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_trigger_rejects_inactive_rule() {
        let f = fixture().await;
        let mut rule = two_step_rule(true);
        rule.deactivate();
        let target = seed(&f, &rule).await;

        assert!(matches!(
            f.engine.trigger("user-1", &target, &rule.id).await,
            Err(Error::RuleInactive(_))
        ));
    }

    #[tokio::test]
    async fn test_double_trigger_conflicts() {
        let f = fixture().await;
        let rule = two_step_rule(true);
        let target = seed(&f, &rule).await;

        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();

        // second call conflicts even before the first job executes
        assert!(matches!(
            f.engine.trigger("user-1", &target, &rule.id).await,
            Err(Error::ChainAlreadyActive(_))
        ));

        // still exactly one queued job
        assert_eq!(f.queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_steps_execute_in_order_with_retry_cycle() {
        let f = fixture().await;
        let rule = two_step_rule(true);
        let target = seed(&f, &rule).await;

        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();
        pump(&f).await;

        // max_retries = 1: two full passes, then termination
        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        let orders: Vec<u32> = entries
            .iter()
            .filter(|e| !e.is_marker())
            .map(|e| e.step_order)
            .collect();
        assert_eq!(orders, vec![1, 2, 1, 2]);
        assert!(f.queue.is_empty().await);
        assert_eq!(f.dispatch.submitted().await.len(), 4);

        let snapshot = f.targets.load(&target).await.unwrap();
        assert_eq!(snapshot.current_escalation_level, 2);
        assert!(snapshot.last_escalated_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_then_trigger_starts_fresh() {
        let f = fixture().await;
        let rule = two_step_rule(true);
        let target = seed(&f, &rule).await;

        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();
        let due = f
            .queue
            .pop_due(Utc::now() + Duration::minutes(1))
            .await
            .unwrap();
        for job in due {
            f.engine.execute_step(job).await.unwrap();
        }

        f.engine.cancel("user-1", &target).await.unwrap();
        assert_eq!(
            f.targets.load(&target).await.unwrap().current_escalation_level,
            0
        );

        // the in-flight step-2 job self-terminates on its re-check
        pump(&f).await;
        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        let sent: Vec<u32> = entries
            .iter()
            .filter(|e| !e.is_marker())
            .map(|e| e.step_order)
            .collect();
        assert_eq!(sent, vec![1]);

        // fresh chain starts at step 1
        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();
        pump(&f).await;
        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        let fresh: Vec<u32> = chain::current_window(&entries)
            .iter()
            .filter(|e| !e.is_marker())
            .map(|e| e.step_order)
            .collect();
        assert_eq!(fresh[0], 1);
    }

    #[tokio::test]
    async fn test_response_with_stop_on_response_halts_queued_jobs() {
        let f = fixture().await;
        let rule = two_step_rule(true);
        let target = seed(&f, &rule).await;

        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();
        let due = f
            .queue
            .pop_due(Utc::now() + Duration::minutes(1))
            .await
            .unwrap();
        for job in due {
            f.engine.execute_step(job).await.unwrap();
        }

        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        let step1 = entries.iter().find(|e| e.step_order == 1).unwrap();
        f.engine
            .record_response("user-1", &step1.id, Some("done!".to_string()))
            .await
            .unwrap();

        // the already-queued step-2 job fires but sends nothing
        pump(&f).await;
        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        assert_eq!(entries.iter().filter(|e| !e.is_marker()).count(), 1);
        assert_eq!(f.dispatch.submitted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_response_without_stop_keeps_stepping() {
        let f = fixture().await;
        let rule = two_step_rule(false);
        let target = seed(&f, &rule).await;

        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();
        let due = f
            .queue
            .pop_due(Utc::now() + Duration::minutes(1))
            .await
            .unwrap();
        for job in due {
            f.engine.execute_step(job).await.unwrap();
        }

        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        let step1 = entries.iter().find(|e| e.step_order == 1).unwrap();
        f.engine
            .record_response("user-1", &step1.id, None)
            .await
            .unwrap();

        pump(&f).await;
        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        // step 2 still went out
        assert!(entries.iter().any(|e| e.step_order == 2));
    }

    #[tokio::test]
    async fn test_pause_no_ops_inflight_job_and_resume_restarts() {
        let f = fixture().await;
        let rule = two_step_rule(true);
        let target = seed(&f, &rule).await;

        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();
        let due = f
            .queue
            .pop_due(Utc::now() + Duration::minutes(1))
            .await
            .unwrap();
        for job in due {
            f.engine.execute_step(job).await.unwrap();
        }

        f.engine.pause("user-1", &target).await.unwrap();

        // the already-scheduled step-2 job executes but immediately no-ops
        let far = Utc::now() + Duration::days(1);
        for job in f.queue.pop_due(far).await.unwrap() {
            f.engine.execute_step(job).await.unwrap();
        }
        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        assert_eq!(entries.last().unwrap().status, EscalationStatus::Paused);
        assert_eq!(entries.iter().filter(|e| !e.is_marker()).count(), 1);

        // resume restarts numbering from step 1
        f.engine.resume("user-1", &target).await.unwrap();
        assert_eq!(
            f.targets.load(&target).await.unwrap().current_escalation_level,
            0
        );
        pump(&f).await;
        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        let fresh: Vec<u32> = chain::current_window(&entries)
            .iter()
            .filter(|e| !e.is_marker())
            .map(|e| e.step_order)
            .collect();
        assert_eq!(&fresh[..2], &[1, 2]);
    }

    #[tokio::test]
    async fn test_resume_without_pause_errors() {
        let f = fixture().await;
        let rule = two_step_rule(true);
        let target = seed(&f, &rule).await;

        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();
        assert!(matches!(
            f.engine.resume("user-1", &target).await,
            Err(Error::NoPausedChain(_))
        ));
    }

    #[tokio::test]
    async fn test_terminal_target_stops_silently() {
        let f = fixture().await;
        let rule = two_step_rule(true);
        let target = seed(&f, &rule).await;

        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();
        f.targets.mark_terminal(&target).await;

        pump(&f).await;
        assert!(f.dispatch.submitted().await.is_empty());
        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        assert!(entries.iter().all(|e| e.is_marker()));
    }

    #[tokio::test]
    async fn test_undelivered_notification_is_non_fatal() {
        let queue = Arc::new(MemoryJobQueue::new());
        let targets = Arc::new(MemoryTargetRepository::new());
        let dispatch = Arc::new(MemoryDispatch::undeliverable());
        let contacts = Arc::new(MemoryContactDirectory::new());
        contacts.set_owner_email("user-1", "me@example.com").await;

        let engine = EscalationEngine::new(
            RuleStore::memory().unwrap(),
            LogStore::memory().unwrap(),
            targets.clone(),
            contacts,
            dispatch.clone(),
            queue.clone(),
        );

        let rule = two_step_rule(true);
        engine.rules.save(&rule).unwrap();
        let target = TargetRef::commitment("c-1");
        targets
            .upsert(
                TargetSnapshot::new(target.clone(), "user-1", "Send the deck")
                    .with_rule(rule.id.clone()),
            )
            .await;

        engine.trigger("user-1", &target, &rule.id).await.unwrap();
        let due = queue
            .pop_due(Utc::now() + Duration::minutes(1))
            .await
            .unwrap();
        for job in due {
            engine.execute_step(job).await.unwrap();
        }

        // chain keeps going: sent row stays Sent (not Delivered), step 2 queued
        let entries = engine.logs.chain_entries(&rule.id, &target).unwrap();
        let sent_row = entries.iter().find(|e| !e.is_marker()).unwrap();
        assert_eq!(sent_row.status, EscalationStatus::Sent);
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_record_response_checks_ownership() {
        let f = fixture().await;
        let rule = two_step_rule(true);
        let target = seed(&f, &rule).await;

        f.engine.trigger("user-1", &target, &rule.id).await.unwrap();
        pump(&f).await;
        let entries = f.engine.logs.chain_entries(&rule.id, &target).unwrap();
        let step1 = entries.iter().find(|e| e.step_order == 1).unwrap();

        assert!(matches!(
            f.engine.record_response("user-2", &step1.id, None).await,
            Err(Error::LogEntryNotFound(_))
        ));
        assert!(matches!(
            f.engine.record_response("user-1", &LogId::new(), None).await,
            Err(Error::LogEntryNotFound(_))
        ));
    }
}
