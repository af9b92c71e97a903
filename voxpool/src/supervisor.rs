//! Supervisor / control plane: the single-writer loop that reads control
//! requests from stdin, routes them to the pool, and emits one response per
//! request on stdout.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::error::PoolError;
use crate::model::{WorkerKind, WorkerStatus};
use crate::monitor::TracingMonitor;
use crate::pool::{Pool, PoolConfig};
use crate::protocol::{decode_request, encode_response, ControlRequest, ControlResponse};

pub struct SupervisorConfig {
    pub num_workers: u32,
    pub worker_type: WorkerKind,
    pub queue_capacity: usize,
    pub health_interval: Duration,
}

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Runs the supervisor to completion: startup, control loop, shutdown.
pub async fn run(config: SupervisorConfig) -> Result<(), PoolError> {
    let supervisor_id = format!("voxpool-{}", config.worker_type);
    let monitor = TracingMonitor::new();
    let pool_config = PoolConfig {
        num_workers: config.num_workers,
        kind: config.worker_type,
        queue_capacity: config.queue_capacity,
        max_init_failures: 5,
    };

    let pool = Pool::start(pool_config, monitor, supervisor_id).await?;
    let pool = Arc::new(Mutex::new(pool));

    let mut stdout = tokio::io::stdout();
    let ready = ControlResponse::Ready {
        worker_type: config.worker_type,
        num_workers: config.num_workers,
    };
    stdout.write_all(encode_response(&ready).as_bytes()).await.ok();
    stdout.flush().await.ok();
    tracing::info!(worker_type = %config.worker_type, num_workers = config.num_workers, "pool supervisor ready");

    // Independent health-sweep timer: runs even while the control loop is
    // blocked waiting on stdin, on top of the opportunistic per-frame sweep
    // below.
    let health_pool = pool.clone();
    let health_interval = config.health_interval;
    let health_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(health_interval);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            ticker.tick().await;
            health_pool.lock().await.health_check().await;
        }
    });

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => {
                tracing::info!("control stream closed (EOF), shutting down");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "error reading control stream, shutting down");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_request(&line, &pool).await;
        let shutting_down = matches!(response, ControlResponse::ShutdownComplete);

        stdout.write_all(encode_response(&response).as_bytes()).await.ok();
        stdout.flush().await.ok();

        if shutting_down {
            break;
        }

        // Opportunistic sweep: cheap, keeps dead workers from accumulating
        // under steady traffic without waiting for the independent timer.
        pool.lock().await.health_check().await;
    }

    health_task.abort();
    pool.lock().await.shutdown(SHUTDOWN_GRACE).await?;
    tracing::info!("pool supervisor exited");
    Ok(())
}

async fn handle_request(line: &str, pool: &Arc<Mutex<Pool>>) -> ControlResponse {
    let request = match decode_request(line) {
        Ok(r) => r,
        Err(e) => return ControlResponse::Error { error: format!("malformed request: {e}") },
    };

    match request {
        ControlRequest::SubmitTask { task_id, data, priority } => {
            let guard = pool.lock().await;
            match guard.submit(task_id.clone(), data, priority.unwrap_or(0)) {
                Ok(submission_latency) => ControlResponse::TaskSubmitted { task_id, submission_latency },
                Err(e) => ControlResponse::Error { error: e.as_protocol_message() },
            }
        }
        ControlRequest::GetResult { timeout } => {
            let seconds = timeout.unwrap_or(1.0).max(0.0);
            // Clone the result handle out, then drop the pool lock before
            // waiting: a caller-supplied timeout can be many seconds, and
            // the independent health sweep needs this same mutex.
            let handle = pool.lock().await.result_handle();
            match handle.wait(Duration::from_secs_f64(seconds)).await {
                Some(result) => ControlResponse::TaskResult {
                    task_id: result.task_id,
                    status: result.status,
                    result: result.result,
                    error: result.error,
                    worker_id: result.worker_id,
                    processing_time: result.processing_time,
                },
                None => ControlResponse::NoResult,
            }
        }
        ControlRequest::GetMetrics => {
            let guard = pool.lock().await;
            let state = guard.metrics().await;
            let worker_utilization = if state.alive_workers > 0 {
                let records = guard.worker_records().await;
                let busy = records.iter().filter(|r| r.status == WorkerStatus::Busy).count();
                busy as f64 / state.alive_workers as f64
            } else {
                0.0
            };
            ControlResponse::Metrics {
                worker_type: guard.kind(),
                num_workers: guard.num_workers(),
                alive_workers: state.alive_workers,
                tasks_submitted: state.tasks_submitted,
                tasks_completed: state.tasks_completed,
                tasks_failed: state.tasks_failed,
                queue_depth: state.queue_depth,
                worker_utilization,
            }
        }
        ControlRequest::HealthCheck => {
            pool.lock().await.health_check().await;
            ControlResponse::HealthCheckComplete
        }
        ControlRequest::Shutdown => ControlResponse::ShutdownComplete,
    }
}
