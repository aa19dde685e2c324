//! Delayed job queue.
//!
//! The engine never blocks on time: every suspension point is a queued job
//! with a future run-at. Delivery is at-least-once; the executor re-derives
//! all state from the log and target pointer, so duplicate or late jobs are
//! harmless. The `step_order` in a payload is an observability hint: the
//! executor trusts only the job identity and `retry_count`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};

use super::error::{Error, Result};
use super::rule::RuleId;
use super::target::TargetRef;

/// Queue message driving one step execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationJob {
    /// Owning user
    pub user_id: String,
    /// Target being escalated
    pub target: TargetRef,
    /// Rule the chain runs under
    pub rule_id: RuleId,
    /// 0 = "determine and send the first applicable step"
    pub step_order: u32,
    /// Completed full passes over the sequence
    pub retry_count: u32,
}

impl EscalationJob {
    /// Job starting (or restarting) a chain from the beginning.
    pub fn initial(user_id: impl Into<String>, target: TargetRef, rule_id: RuleId) -> Self {
        Self {
            user_id: user_id.into(),
            target,
            rule_id,
            step_order: 0,
            retry_count: 0,
        }
    }
}

/// A job with its scheduling envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub job: EscalationJob,
    /// Delay requested at enqueue time
    pub delay_minutes: u32,
    /// When the job becomes due
    pub run_at: DateTime<Utc>,
}

/// Producer/consumer seam between the engine and the queue backend.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job to run `delay_minutes` from now.
    async fn enqueue(&self, job: EscalationJob, delay_minutes: u32) -> Result<()>;

    /// Remove and return jobs due at `now`, ordered by run-at.
    async fn pop_due(&self, now: DateTime<Utc>) -> Result<Vec<EscalationJob>>;

    /// Number of jobs waiting.
    async fn len(&self) -> usize;

    /// Whether the queue is empty.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// In-memory job queue.
///
/// Tests pump it manually through [`pop_due`](JobQueue::pop_due) with a
/// simulated clock; deployments wrap it in a
/// [`QueueWorker`](crate::worker::QueueWorker).
pub struct MemoryJobQueue {
    jobs: StdMutex<Vec<ScheduledJob>>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self {
            jobs: StdMutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything scheduled, ordered by run-at.
    pub fn scheduled(&self) -> Vec<ScheduledJob> {
        let mut jobs = self.jobs.lock().unwrap().clone();
        jobs.sort_by(|a, b| a.run_at.cmp(&b.run_at));
        jobs
    }
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: EscalationJob, delay_minutes: u32) -> Result<()> {
        let scheduled = ScheduledJob {
            job,
            delay_minutes,
            run_at: Utc::now() + Duration::minutes(delay_minutes as i64),
        };
        self.jobs.lock().unwrap().push(scheduled);
        Ok(())
    }

    async fn pop_due(&self, now: DateTime<Utc>) -> Result<Vec<EscalationJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut due: Vec<ScheduledJob> = Vec::new();
        let mut remaining: Vec<ScheduledJob> = Vec::new();
        for scheduled in jobs.drain(..) {
            if scheduled.run_at <= now {
                due.push(scheduled);
            } else {
                remaining.push(scheduled);
            }
        }
        *jobs = remaining;

        due.sort_by(|a, b| a.run_at.cmp(&b.run_at));
        Ok(due.into_iter().map(|s| s.job).collect())
    }

    async fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

// Table definition
const JOB_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("escalation_jobs");

/// Durable job queue backed by redb.
///
/// Jobs survive process restarts; a job removed but not executed before a
/// crash is lost to this backend, which is why deployments needing strict
/// at-least-once pair it with detector sweeps that re-trigger.
pub struct RedbJobQueue {
    db: Arc<Database>,
    /// Storage path for singleton
    path: String,
}

/// Global job queue singleton (thread-safe).
static JOB_QUEUE_SINGLETON: StdMutex<Option<Arc<RedbJobQueue>>> = StdMutex::new(None);

impl RedbJobQueue {
    /// Open or create a durable queue.
    /// Uses a singleton pattern to prevent multiple opens of the same database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        {
            let singleton = JOB_QUEUE_SINGLETON.lock().unwrap();
            if let Some(queue) = singleton.as_ref() {
                if queue.path == path_str {
                    return Ok(queue.clone());
                }
            }
        }

        let path_ref = path.as_ref();
        let db = if path_ref.exists() {
            Database::open(path_ref)?
        } else {
            Database::create(path_ref)?
        };

        let queue = Arc::new(RedbJobQueue {
            db: Arc::new(db),
            path: path_str,
        });

        *JOB_QUEUE_SINGLETON.lock().unwrap() = Some(queue.clone());
        Ok(queue)
    }

    /// Create a queue on a throwaway path.
    pub fn memory() -> Result<Arc<Self>> {
        let temp_path =
            std::env::temp_dir().join(format!("escalation_jobs_{}.redb", uuid::Uuid::new_v4()));
        Self::open(temp_path)
    }
}

#[async_trait]
impl JobQueue for RedbJobQueue {
    async fn enqueue(&self, job: EscalationJob, delay_minutes: u32) -> Result<()> {
        let scheduled = ScheduledJob {
            job,
            delay_minutes,
            run_at: Utc::now() + Duration::minutes(delay_minutes as i64),
        };
        let key = format!("job:{}", uuid::Uuid::new_v4());
        let value = serde_json::to_vec(&scheduled)?;

        let write_txn = self.db.begin_write().map_err(Error::from)?;
        {
            let mut table = write_txn.open_table(JOB_TABLE)?;
            table.insert(key.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn pop_due(&self, now: DateTime<Utc>) -> Result<Vec<EscalationJob>> {
        let mut due: Vec<(String, ScheduledJob)> = Vec::new();

        let write_txn = self.db.begin_write().map_err(Error::from)?;
        {
            let mut table = write_txn.open_table(JOB_TABLE)?;

            let mut keys_to_remove = Vec::new();
            {
                let mut iter: redb::Range<&str, &[u8]> = table.iter()?;
                while let Some(result) = iter.next() {
                    let (key, value) = result?;
                    let scheduled: ScheduledJob = serde_json::from_slice(value.value())?;
                    if scheduled.run_at <= now {
                        keys_to_remove.push((key.value().to_string(), scheduled));
                    }
                }
            }

            for (key, scheduled) in keys_to_remove {
                table.remove(key.as_str())?;
                due.push((key, scheduled));
            }
        }
        write_txn.commit()?;

        due.sort_by(|a, b| a.1.run_at.cmp(&b.1.run_at));
        Ok(due.into_iter().map(|(_, s)| s.job).collect())
    }

    async fn len(&self) -> usize {
        let Ok(read_txn) = self.db.begin_read() else {
            return 0;
        };
        let Ok(table) = read_txn.open_table(JOB_TABLE) else {
            return 0;
        };
        table.len().map(|n| n as usize).unwrap_or(0)
    }
}
