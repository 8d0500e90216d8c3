//! Periodic liveness refresh for the controller.

use super::manager::ProcessSupervisor;
use pf_protocol::ipc::Event;
use pf_protocol::role_models::RoleKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Publishes `Event::RoleStatus` for every role on a fixed interval.
pub struct LivenessPoller;

impl LivenessPoller {
    /// Start polling on the current runtime.
    ///
    /// Probes run on the blocking pool, one cycle at a time; ticks that
    /// come due while a cycle is running are skipped. The task ends when
    /// `sink` is closed.
    pub fn spawn(
        supervisor: Arc<ProcessSupervisor>,
        interval: Duration,
        sink: mpsc::Sender<Event>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if sink.is_closed() {
                    break;
                }

                let statuses = match observe(Arc::clone(&supervisor)).await {
                    Some(statuses) => statuses,
                    None => continue,
                };

                for (role, running) in statuses {
                    if sink.send(Event::RoleStatus { role, running }).await.is_err() {
                        return;
                    }
                }
            }
        })
    }
}

/// One probe cycle off the async threads.
pub async fn observe(supervisor: Arc<ProcessSupervisor>) -> Option<Vec<(RoleKind, bool)>> {
    match tokio::task::spawn_blocking(move || supervisor.probe().observe_all()).await {
        Ok(statuses) => Some(statuses),
        Err(e) => {
            tracing::warn!("Liveness probe task failed: {e}");
            None
        }
    }
}
