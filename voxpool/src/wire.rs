//! Parent<->child wire types. These never cross the supervisor's external
//! stdin/stdout (that is the control protocol, see [`crate::protocol`]) —
//! they cross each worker's own piped stdin/stdout, one JSON object per
//! line, matching the external protocol's wire style so a single
//! line-at-a-time codec serves both streams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{TaskResult, TaskStatus, WorkerKind};

/// Supervisor -> worker: one unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTask {
    pub task_id: String,
    pub kind: WorkerKind,
    pub payload: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}

/// Worker -> supervisor: the outcome of one [`WireTask`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireResult {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub worker_id: u32,
    pub processing_time: f64,
}

impl From<WireResult> for TaskResult {
    fn from(w: WireResult) -> Self {
        TaskResult {
            task_id: w.task_id,
            worker_id: w.worker_id,
            status: w.status,
            result: w.result,
            error: w.error,
            processing_time: w.processing_time,
        }
    }
}
