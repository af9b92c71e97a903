//! Multi-process ML worker pool supervisor.
//!
//! A single-host pool supervisor that owns a pool of persistent worker
//! processes, distributes categorized tasks to them over bounded queues,
//! and provides health monitoring, restart-on-failure, graceful shutdown,
//! and per-pool metrics, spoken over a newline-delimited JSON control
//! protocol with an external Dispatcher.

pub mod cli;
pub mod error;
pub mod handler;
pub mod model;
pub mod monitor;
pub mod payload;
pub mod pool;
pub mod protocol;
pub mod supervisor;
pub mod wire;
pub mod worker_main;
pub mod worker_process;

use tracing_subscriber::EnvFilter;

/// Installs a stderr-only `tracing` subscriber. Stdout is reserved for the
/// control/wire protocols and must never carry diagnostic output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
