//! Public data model: the types a Dispatcher reasons about when it talks to
//! the pool supervisor. Wire-level framing lives in [`crate::wire`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of work a pool knows how to serve. Each kind binds to exactly
/// one [`crate::handler::HandlerFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[clap(rename_all = "snake_case")]
pub enum WorkerKind {
    Stt,
    Tts,
    HfTts,
    Vllm,
    Clone,
}

impl WorkerKind {
    /// Stable lowercase identifier used on the wire and in CLI flags.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerKind::Stt => "stt",
            WorkerKind::Tts => "tts",
            WorkerKind::HfTts => "hf_tts",
            WorkerKind::Vllm => "vllm",
            WorkerKind::Clone => "clone",
        }
    }
}

impl std::fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkerKind {
    type Err = crate::error::PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stt" => Ok(WorkerKind::Stt),
            "tts" => Ok(WorkerKind::Tts),
            "hf_tts" => Ok(WorkerKind::HfTts),
            "vllm" => Ok(WorkerKind::Vllm),
            "clone" => Ok(WorkerKind::Clone),
            other => Err(crate::error::PoolError::UnknownWorkerKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// A unit of work submitted from outside. The supervisor never inspects
/// `payload`; it is handler-defined shape validated only inside the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub kind: WorkerKind,
    pub payload: serde_json::Value,
    /// Currently informational only; FIFO ordering is never perturbed by it.
    pub priority: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Outcome of a completed task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub worker_id: u32,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Seconds from dequeue to result push, measured by the worker.
    pub processing_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Error,
}

/// Supervisor-side status of one worker slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Starting,
    Idle,
    Busy,
    Dead,
    /// Exceeded the consecutive-init-failure limit; no longer auto-restarted.
    DeadPermanently,
}

/// Supervisor-side handle description for one child process, as surfaced in
/// metrics and diagnostics. The live process state itself lives in
/// [`crate::worker_process::WorkerSlot`]; this is a point-in-time snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub worker_id: u32,
    pub kind: WorkerKind,
    pub status: WorkerStatus,
    pub tasks_processed: u64,
    pub errors: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

/// Per-pool running counters. Monotonically nondecreasing except
/// `queue_depth` and `alive_workers`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PoolState {
    pub tasks_submitted: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub queue_depth: usize,
    pub alive_workers: u32,
}
