//! Queue worker.
//!
//! Bridges a [`JobQueue`] to the engine: polls for due jobs and executes
//! each one. Job failures are logged and never stop the loop; a failed
//! execution is retried only by the chain's own schedule.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;

use super::engine::EscalationEngine;
use super::queue::JobQueue;

/// Default poll interval; minute-grained scheduling needs nothing tighter.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Polling consumer driving an [`EscalationEngine`] from a [`JobQueue`].
pub struct QueueWorker {
    engine: Arc<EscalationEngine>,
    queue: Arc<dyn JobQueue>,
    poll_interval: Duration,
    handle: RwLock<Option<JoinHandle<()>>>,
    shutdown: Arc<Notify>,
}

impl QueueWorker {
    pub fn new(engine: Arc<EscalationEngine>, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            engine,
            queue,
            poll_interval: DEFAULT_POLL_INTERVAL,
            handle: RwLock::new(None),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start the polling loop.
    pub async fn start(&self) {
        let mut handle = self.handle.write().await;
        if handle.is_some() {
            return;
        }

        let engine = self.engine.clone();
        let queue = self.queue.clone();
        let shutdown = self.shutdown.clone();
        let interval = self.poll_interval;

        *handle = Some(tokio::spawn(async move {
            tracing::info!("Escalation queue worker started");
            loop {
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                let due = match queue.pop_due(Utc::now()).await {
                    Ok(due) => due,
                    Err(e) => {
                        tracing::warn!("Queue poll failed: {}", e);
                        continue;
                    }
                };

                for job in due {
                    let target = job.target.clone();
                    if let Err(e) = engine.execute_step(job).await {
                        tracing::warn!(%target, "Step execution failed: {}", e);
                    }
                }
            }
            tracing::info!("Escalation queue worker stopped");
        }));
    }

    /// Stop the polling loop and wait for it to finish.
    pub async fn stop(&self) {
        let handle = self.handle.write().await.take();
        if let Some(handle) = handle {
            self.shutdown.notify_one();
            let _ = handle.await;
        }
    }

    /// Whether the worker loop is running.
    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }
}
