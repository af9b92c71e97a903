//! Typed error taxonomy for the pool supervisor, grounded in
//! `airssys_rt::supervisor::error::SupervisorError`'s structure: one
//! `thiserror` enum covering every failure category the pool can surface,
//! rather than stringly-typed errors bubbling up through the control loop.

use thiserror::Error;

use crate::model::WorkerKind;

#[derive(Debug, Error)]
pub enum PoolError {
    /// Submission error: the bounded inbound queue is at capacity.
    #[error("inbound queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// Submission error: the control request named a kind this process does
    /// not serve, or an unrecognized string was supplied.
    #[error("unknown worker kind: {kind}")]
    UnknownWorkerKind { kind: String },

    /// A worker process could not be spawned (binary re-exec failed, pipe
    /// setup failed, etc.).
    #[error("failed to spawn worker {worker_id} ({kind}): {source}")]
    WorkerSpawnFailed {
        worker_id: u32,
        kind: WorkerKind,
        #[source]
        source: std::io::Error,
    },

    /// Shutdown did not complete within the configured bounded window.
    #[error("shutdown did not complete within {0:?}")]
    ShutdownTimeout(std::time::Duration),

    /// A task's payload failed to validate against its kind's schema.
    #[error("invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: WorkerKind, reason: String },

    /// Malformed control-protocol request (bad JSON, missing `type`, etc.).
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl PoolError {
    /// Maps to the `{"type": "error", "error": ...}` control-protocol frame.
    pub fn as_protocol_message(&self) -> String {
        self.to_string()
    }
}
