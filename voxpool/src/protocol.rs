//! External control protocol: newline-delimited JSON on the supervisor's own
//! stdin/stdout, spoken with an external Dispatcher. Distinct from, and
//! never mixed with, the internal wire protocol in [`crate::wire`].

use serde::{Deserialize, Serialize};

use crate::model::{TaskStatus, WorkerKind};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlRequest {
    SubmitTask {
        task_id: String,
        data: serde_json::Value,
        #[serde(default)]
        priority: Option<u32>,
    },
    GetResult {
        #[serde(default)]
        timeout: Option<f64>,
    },
    GetMetrics,
    HealthCheck,
    Shutdown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlResponse {
    Ready {
        worker_type: WorkerKind,
        num_workers: u32,
    },
    TaskSubmitted {
        task_id: String,
        /// Milliseconds from request receipt to queue acceptance.
        submission_latency: f64,
    },
    TaskResult {
        task_id: String,
        status: TaskStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        worker_id: u32,
        processing_time: f64,
    },
    NoResult,
    Metrics {
        worker_type: WorkerKind,
        num_workers: u32,
        alive_workers: u32,
        tasks_submitted: u64,
        tasks_completed: u64,
        tasks_failed: u64,
        queue_depth: usize,
        worker_utilization: f64,
    },
    HealthCheckComplete,
    ShutdownComplete,
    Error {
        error: String,
    },
}

/// Serializes one response as a single newline-delimited JSON line.
pub fn encode_response(response: &ControlResponse) -> String {
    match serde_json::to_string(response) {
        Ok(mut line) => {
            line.push('\n');
            line
        }
        // A response failing to serialize is itself a bug, but the control
        // loop must still emit a well-formed line rather than panic.
        Err(e) => format!("{{\"type\":\"error\",\"error\":\"internal serialization failure: {e}\"}}\n"),
    }
}

/// Parses one control-protocol request line. Malformed JSON or an unknown
/// `type` is reported as `Err` so the caller can emit the protocol's `error`
/// frame without killing the control loop.
pub fn decode_request(line: &str) -> Result<ControlRequest, String> {
    serde_json::from_str(line).map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submit_task_round_trips() {
        let line = json!({"type": "submit_task", "task_id": "t1", "data": {"a": 1}}).to_string();
        let req = decode_request(&line).unwrap();
        assert!(matches!(req, ControlRequest::SubmitTask { task_id, .. } if task_id == "t1"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let line = json!({"type": "not_a_real_request"}).to_string();
        assert!(decode_request(&line).is_err());
    }

    #[test]
    fn ready_response_encodes_with_trailing_newline() {
        let resp = ControlResponse::Ready { worker_type: WorkerKind::Stt, num_workers: 2 };
        let encoded = encode_response(&resp);
        assert!(encoded.ends_with('\n'));
        assert!(encoded.contains("\"type\":\"ready\""));
    }

    #[test]
    fn error_response_has_error_type() {
        let resp = ControlResponse::Error { error: "boom".to_string() };
        let encoded = encode_response(&resp);
        assert!(encoded.contains("\"type\":\"error\""));
    }
}
