//! Worker-process entry point: constructs a handler, then loops pulling
//! `WireTask`s from stdin and pushing `WireResult`s to stdout until the
//! parent closes the pipe.

use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::handler::factory_for;
use crate::model::{TaskStatus, WorkerKind};
use crate::payload;
use crate::wire::{WireResult, WireTask};

/// Runs the worker read/handle/write loop. Never returns: initialization
/// failure and a closed parent pipe both end in `std::process::exit`.
pub async fn run(kind: WorkerKind, worker_id: u32) -> ! {
    let factory = factory_for(kind);
    let mut handler = match factory() {
        Ok(h) => h,
        Err(e) => {
            tracing::error!(worker_id, %kind, error = %e, "handler initialization failed, exiting");
            std::process::exit(1);
        }
    };

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();
    let mut poll = tokio::time::interval(Duration::from_millis(500));

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = poll.tick() => continue,
        };

        let line = match line {
            Ok(Some(l)) => l,
            // Parent closed stdin: the child-side mirror of a shutdown
            // signal for a pipe-based transport. Exit cleanly.
            Ok(None) => break,
            Err(e) => {
                tracing::error!(worker_id, error = %e, "error reading task stream, exiting");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let task: WireTask = match serde_json::from_str(&line) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(worker_id, error = %e, "received unparseable task line, skipping");
                continue;
            }
        };

        let result = process_one(&mut *handler, worker_id, task);

        let Ok(mut encoded) = serde_json::to_string(&result) else {
            tracing::error!(worker_id, "failed to encode result, skipping");
            continue;
        };
        encoded.push('\n');
        if stdout.write_all(encoded.as_bytes()).await.is_err() {
            break;
        }
        if stdout.flush().await.is_err() {
            break;
        }
    }

    std::process::exit(0);
}

/// Validates the payload, then invokes the handler. Any failure — bad
/// payload or handler error — becomes an `error` result; the worker never
/// exits over a single bad task.
fn process_one(handler: &mut dyn crate::handler::Handler, worker_id: u32, task: WireTask) -> WireResult {
    let dequeued_at = Instant::now();

    let outcome = payload::validate(task.kind, &task.payload).and_then(|()| handler.call(&task.payload));

    match outcome {
        Ok(value) => WireResult {
            task_id: task.task_id,
            status: TaskStatus::Success,
            result: Some(value),
            error: None,
            worker_id,
            processing_time: dequeued_at.elapsed().as_secs_f64(),
        },
        Err(e) => WireResult {
            task_id: task.task_id,
            status: TaskStatus::Error,
            result: None,
            error: Some(e.to_string()),
            worker_id,
            processing_time: dequeued_at.elapsed().as_secs_f64(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::handler::factory_for;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn bad_payload_produces_error_result_not_panic() {
        let mut handler = (factory_for(WorkerKind::Stt))().unwrap();
        let task = WireTask {
            task_id: "t1".to_string(),
            kind: WorkerKind::Stt,
            payload: json!({"language": "en"}),
            submitted_at: Utc::now(),
        };
        let result = process_one(&mut *handler, 0, task);
        assert_eq!(result.status, TaskStatus::Error);
        assert!(result.error.is_some());
    }

    #[test]
    fn good_payload_produces_success_result() {
        let mut handler = (factory_for(WorkerKind::Stt))().unwrap();
        let task = WireTask {
            task_id: "t1".to_string(),
            kind: WorkerKind::Stt,
            payload: json!({"audio": "AAAA", "language": "en"}),
            submitted_at: Utc::now(),
        };
        let result = process_one(&mut *handler, 2, task);
        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.worker_id, 2);
    }
}
