//! Bridges supervision events into structured logs.
//!
//! Grounded in `airssys_rt::monitoring::InMemoryMonitor` (bounded event
//! history + atomic counters, reused as-is) plus this workspace's structured
//! logging convention (`airssys_osl::middleware::logger::loggers::tracing`),
//! upgrading ad hoc diagnostic prints to leveled `tracing` calls keyed on
//! [`EventSeverity`].

use airssys_rt::monitoring::{
    EventSeverity, InMemoryMonitor, Monitor, MonitoringConfig, MonitoringError, MonitoringSnapshot,
    SupervisionEvent, SupervisionEventKind,
};
use async_trait::async_trait;

/// A `Monitor<SupervisionEvent>` that both retains bounded history (via the
/// wrapped [`InMemoryMonitor`]) and emits a leveled `tracing` event for every
/// record, so supervision activity shows up in the process's log stream
/// without a separate consumer polling snapshots.
#[derive(Clone)]
pub struct TracingMonitor {
    inner: InMemoryMonitor<SupervisionEvent>,
}

impl TracingMonitor {
    pub fn new() -> Self {
        Self {
            inner: InMemoryMonitor::new(MonitoringConfig::default()),
        }
    }
}

impl Default for TracingMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Monitor<SupervisionEvent> for TracingMonitor {
    async fn record(&self, event: SupervisionEvent) -> Result<(), MonitoringError> {
        let child = event.child_id.as_deref().unwrap_or("-");
        match (event.severity(), &event.event_kind) {
            (EventSeverity::Critical, SupervisionEventKind::RestartLimitExceeded { restart_count, window }) => {
                tracing::error!(supervisor = %event.supervisor_id, child, restart_count, ?window, "restart limit exceeded, worker dead permanently");
            }
            (EventSeverity::Error, SupervisionEventKind::ChildFailed { error, restart_count }) => {
                tracing::error!(supervisor = %event.supervisor_id, child, restart_count, %error, "worker failed");
            }
            (EventSeverity::Warning, SupervisionEventKind::ChildRestarted { restart_count }) => {
                tracing::warn!(supervisor = %event.supervisor_id, child, restart_count, "worker restarted");
            }
            (severity, kind) => {
                let kind_name = match kind {
                    SupervisionEventKind::ChildStarted => "child_started",
                    SupervisionEventKind::ChildStopped => "child_stopped",
                    SupervisionEventKind::StrategyApplied { .. } => "strategy_applied",
                    _ => "supervision_event",
                };
                match severity {
                    EventSeverity::Trace => tracing::trace!(supervisor = %event.supervisor_id, child, kind_name),
                    EventSeverity::Debug => tracing::debug!(supervisor = %event.supervisor_id, child, kind_name),
                    _ => tracing::info!(supervisor = %event.supervisor_id, child, kind_name),
                }
            }
        }
        self.inner.record(event).await
    }

    async fn snapshot(&self) -> Result<MonitoringSnapshot<SupervisionEvent>, MonitoringError> {
        self.inner.snapshot().await
    }

    async fn reset(&self) -> Result<(), MonitoringError> {
        self.inner.reset().await
    }
}
