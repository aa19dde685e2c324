//! Error types for the escalation engine.

use thiserror::Error;

/// Result type for escalation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the escalation engine.
///
/// Business-rule violations triggered by direct user action surface as
/// errors; failures during autonomous queue-driven stepping degrade to
/// "stop this execution" inside the engine and never reach callers.
#[derive(Debug, Error)]
pub enum Error {
    /// Rule does not exist or is not owned by the caller.
    #[error("Escalation rule not found: {0}")]
    RuleNotFound(String),

    /// Rule exists but is deactivated.
    #[error("Escalation rule is inactive: {0}")]
    RuleInactive(String),

    /// A chain for this (rule, target) pair is already running.
    #[error("Escalation chain already active for target {0}")]
    ChainAlreadyActive(String),

    /// Target does not exist or is not owned by the caller.
    #[error("Escalation target not found: {0}")]
    TargetNotFound(String),

    /// Target is in a terminal business state (e.g. completed).
    #[error("Escalation target is terminal: {0}")]
    TargetTerminal(String),

    /// Resume requested without a paused chain.
    #[error("No paused escalation chain for target {0}")]
    NoPausedChain(String),

    /// Log row not found (record_response on an unknown entry).
    #[error("Escalation log entry not found: {0}")]
    LogEntryNotFound(String),

    /// Storage operation failed.
    #[error("Storage failed: {0}")]
    Storage(String),

    /// Queue operation failed.
    #[error("Queue failed: {0}")]
    Queue(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Other error.
    #[error("Other: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<redb::Error> for Error {
    fn from(err: redb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<redb::DatabaseError> for Error {
    fn from(err: redb::DatabaseError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<redb::TransactionError> for Error {
    fn from(err: redb::TransactionError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<redb::TableError> for Error {
    fn from(err: redb::TableError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<redb::StorageError> for Error {
    fn from(err: redb::StorageError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<redb::CommitError> for Error {
    fn from(err: redb::CommitError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(format!("Serialization failed: {}", err))
    }
}
