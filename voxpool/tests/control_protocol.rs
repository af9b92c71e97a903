//! Drives the real compiled supervisor binary as a child process and speaks
//! the external control protocol over its stdio, exactly as an external
//! Dispatcher would.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::process::Stdio;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

struct Supervisor {
    child: Child,
    stdin: tokio::process::ChildStdin,
    lines: tokio::io::Lines<BufReader<tokio::process::ChildStdout>>,
}

impl Supervisor {
    async fn start(args: &[&str]) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_voxpool"))
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .expect("spawn supervisor binary");

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");
        let lines = BufReader::new(stdout).lines();

        let mut sup = Self { child, stdin, lines };
        let ready = sup.next_response().await;
        assert_eq!(ready["type"], "ready");
        sup
    }

    async fn send(&mut self, request: Value) {
        let mut line = request.to_string();
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await.expect("write request");
        self.stdin.flush().await.expect("flush request");
    }

    async fn next_response(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(10), self.lines.next_line())
            .await
            .expect("response within timeout")
            .expect("read response line")
            .expect("stream not closed");
        serde_json::from_str(&line).expect("response is valid JSON")
    }

    async fn wait_exit(&mut self) -> std::process::ExitStatus {
        tokio::time::timeout(Duration::from_secs(10), self.child.wait())
            .await
            .expect("process exits within 10s")
            .expect("wait succeeds")
    }
}

#[tokio::test]
async fn smoke_submit_and_get_result() {
    let mut sup = Supervisor::start(&["--workers", "2", "--worker-type", "stt"]).await;

    sup.send(json!({
        "type": "submit_task",
        "task_id": "t1",
        "data": {"audio": "AAAAAAAAAAAAAAAA", "language": "en"},
    }))
    .await;
    let submitted = sup.next_response().await;
    assert_eq!(submitted["type"], "task_submitted");
    assert_eq!(submitted["task_id"], "t1");

    sup.send(json!({"type": "get_result", "timeout": 5.0})).await;
    let result = sup.next_response().await;
    assert_eq!(result["type"], "task_result");
    assert_eq!(result["task_id"], "t1");
    assert_eq!(result["status"], "success");
    let worker_id = result["worker_id"].as_u64().unwrap();
    assert!(worker_id == 0 || worker_id == 1);

    sup.send(json!({"type": "shutdown"})).await;
    let complete = sup.next_response().await;
    assert_eq!(complete["type"], "shutdown_complete");
    sup.wait_exit().await;
}

#[tokio::test]
async fn error_surfacing_for_bad_clone_action() {
    let mut sup = Supervisor::start(&["--workers", "1", "--worker-type", "clone"]).await;

    sup.send(json!({"type": "submit_task", "task_id": "t1", "data": {"action": "bogus"}})).await;
    let submitted = sup.next_response().await;
    assert_eq!(submitted["type"], "task_submitted");

    sup.send(json!({"type": "get_result", "timeout": 5.0})).await;
    let result = sup.next_response().await;
    assert_eq!(result["type"], "task_result");
    assert_eq!(result["status"], "error");
    assert!(result["error"].as_str().unwrap().contains("Unknown voice cloning action"));

    sup.send(json!({"type": "get_metrics"})).await;
    let metrics = sup.next_response().await;
    assert_eq!(metrics["tasks_failed"], 1);
    assert_eq!(metrics["alive_workers"], 1);

    sup.send(json!({"type": "shutdown"})).await;
    sup.next_response().await;
}

#[tokio::test]
async fn backpressure_rejects_beyond_capacity() {
    let capacity = 4usize;
    let mut sup = Supervisor::start(&[
        "--workers",
        "1",
        "--worker-type",
        "stt",
        "--queue-capacity",
        &capacity.to_string(),
    ])
    .await;

    // The one worker immediately claims a task, so up to `capacity` further
    // submissions fit in the bounded queue before it's full.
    for i in 0..capacity + 1 {
        sup.send(json!({
            "type": "submit_task",
            "task_id": format!("t{i}"),
            "data": {"audio": "AAAA", "language": "en"},
        }))
        .await;
    }

    let mut saw_queue_full = false;
    for _ in 0..capacity + 1 {
        let resp = sup.next_response().await;
        if resp["type"] == "error" {
            saw_queue_full = true;
        }
    }
    assert!(saw_queue_full, "expected at least one queue-full error response");

    sup.send(json!({"type": "shutdown"})).await;
    sup.next_response().await;
}

/// Lists the pids of `parent_pid`'s direct children by scanning `/proc`.
#[cfg(unix)]
fn child_pids(parent_pid: u32) -> Vec<u32> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir("/proc") else { return out };
    for entry in entries.flatten() {
        let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() else { continue };
        let Ok(stat) = std::fs::read_to_string(entry.path().join("stat")) else { continue };
        // Format: "pid (comm) state ppid ...". `comm` may itself contain
        // spaces or parens, so split after the last ')' rather than on
        // whitespace from the start.
        let Some(after_comm) = stat.rfind(')') else { continue };
        let mut fields = stat[after_comm + 2..].split_whitespace();
        let _state = fields.next();
        let Some(ppid) = fields.next().and_then(|s| s.parse::<u32>().ok()) else { continue };
        if ppid == parent_pid {
            out.push(pid);
        }
    }
    out
}

#[tokio::test]
#[cfg(unix)]
async fn restart_after_external_sigkill() {
    let mut sup = Supervisor::start(&["--workers", "2", "--worker-type", "stt"]).await;
    let supervisor_pid = sup.child.id().expect("supervisor has a pid");

    let worker_pid = {
        let mut found = None;
        for _ in 0..100 {
            if let Some(&pid) = child_pids(supervisor_pid).first() {
                found = Some(pid);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        found.expect("at least one worker process spawned under the supervisor")
    };

    nix::sys::signal::kill(nix::unistd::Pid::from_raw(worker_pid as i32), nix::sys::signal::Signal::SIGKILL)
        .expect("deliver SIGKILL to the worker process");

    let mut alive_after_kill = 2;
    for _ in 0..100 {
        sup.send(json!({"type": "get_metrics"})).await;
        let metrics = sup.next_response().await;
        alive_after_kill = metrics["alive_workers"].as_u64().unwrap();
        if alive_after_kill == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(alive_after_kill, 1, "supervisor never observed the killed worker");

    sup.send(json!({"type": "health_check"})).await;
    let complete = sup.next_response().await;
    assert_eq!(complete["type"], "health_check_complete");

    sup.send(json!({"type": "get_metrics"})).await;
    let metrics = sup.next_response().await;
    assert_eq!(metrics["alive_workers"], 2, "health check should have restarted the killed worker");

    let surviving_pids = child_pids(supervisor_pid);
    assert!(!surviving_pids.contains(&worker_pid), "killed worker's pid should not still be a live child");

    sup.send(json!({"type": "shutdown"})).await;
    sup.next_response().await;
}

#[tokio::test]
async fn graceful_shutdown_within_bound() {
    let mut sup = Supervisor::start(&["--workers", "2", "--worker-type", "stt"]).await;

    for i in 0..3 {
        sup.send(json!({
            "type": "submit_task",
            "task_id": format!("t{i}"),
            "data": {"audio": "AAAA", "language": "en"},
        }))
        .await;
        let resp = sup.next_response().await;
        assert_eq!(resp["type"], "task_submitted");
    }

    sup.send(json!({"type": "shutdown"})).await;
    let complete = sup.next_response().await;
    assert_eq!(complete["type"], "shutdown_complete");

    let status = sup.wait_exit().await;
    assert!(status.success());
}

#[tokio::test]
async fn out_of_order_completion_each_task_id_appears_once() {
    let mut sup = Supervisor::start(&["--workers", "4", "--worker-type", "stt"]).await;

    let ids: Vec<String> = (0..8).map(|i| format!("t{i}")).collect();
    for id in &ids {
        sup.send(json!({
            "type": "submit_task",
            "task_id": id,
            "data": {"audio": "AAAA", "language": "en"},
        }))
        .await;
        let resp = sup.next_response().await;
        assert_eq!(resp["type"], "task_submitted");
    }

    let mut seen = std::collections::HashSet::new();
    for _ in 0..8 {
        sup.send(json!({"type": "get_result", "timeout": 5.0})).await;
        let resp = sup.next_response().await;
        assert_eq!(resp["type"], "task_result");
        let task_id = resp["task_id"].as_str().unwrap().to_string();
        assert!(seen.insert(task_id), "task_id observed more than once");
    }
    assert_eq!(seen.len(), 8);

    sup.send(json!({"type": "shutdown"})).await;
    sup.next_response().await;
}
