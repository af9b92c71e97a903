//! Command-line surface, matching this workspace's `clap::Parser`
//! derive-API convention.

use clap::Parser;

use crate::model::WorkerKind;

#[derive(Debug, Parser)]
#[command(name = "voxpool", about = "Multi-process ML worker pool supervisor")]
pub struct Cli {
    /// Number of worker processes to spawn.
    #[arg(long, default_value_t = 2)]
    pub workers: u32,

    /// Task category this pool serves.
    #[arg(long = "worker-type", value_enum, default_value_t = WorkerKind::Stt)]
    pub worker_type: WorkerKind,

    /// Bounded inbound queue capacity.
    #[arg(long = "queue-capacity", default_value_t = 1000)]
    pub queue_capacity: usize,

    /// Interval, in milliseconds, of the independent health-sweep timer.
    #[arg(long = "health-interval-ms", default_value_t = 1000)]
    pub health_interval_ms: u64,

    /// Internal worker-process entry point. Not part of the public CLI
    /// surface: selected only by the supervisor when it re-invokes this
    /// same binary to spawn a worker.
    #[arg(long = "internal-worker", value_enum, hide = true)]
    pub internal_worker: Option<WorkerKind>,

    /// Worker identity assigned by the supervisor, paired with
    /// `--internal-worker`.
    #[arg(long = "worker-id", hide = true)]
    pub worker_id: Option<u32>,
}
