use clap::Parser;

use voxpool::cli::Cli;
use voxpool::supervisor::{self, SupervisorConfig};
use voxpool::worker_main;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    voxpool::init_logging();

    let result = if let Some(kind) = cli.internal_worker {
        let worker_id = cli.worker_id.unwrap_or(0);
        worker_main::run(kind, worker_id).await
    } else {
        let config = SupervisorConfig {
            num_workers: cli.workers,
            worker_type: cli.worker_type,
            queue_capacity: cli.queue_capacity,
            health_interval: std::time::Duration::from_millis(cli.health_interval_ms),
        };
        supervisor::run(config).await
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "fatal supervisor error");
        std::process::exit(1);
    }
}
