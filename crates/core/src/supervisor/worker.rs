//! Executes controller operations against the supervisor.

use super::manager::ProcessSupervisor;
use super::poller::observe;
use pf_protocol::ipc::{Event, Op};
use pf_protocol::role_models::RoleKind;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Handle `Op`s until `Op::Shutdown` or until the sender is dropped.
///
/// Each toggle runs on its own task so a slow stop of one role does not
/// hold up the other.
pub async fn run_control_loop(
    supervisor: Arc<ProcessSupervisor>,
    mut ops: mpsc::Receiver<Op>,
    events: mpsc::Sender<Event>,
) {
    while let Some(op) = ops.recv().await {
        match op {
            Op::ToggleRole { role } => {
                tokio::spawn(toggle(Arc::clone(&supervisor), role, events.clone()));
            }
            Op::RefreshStatus => {
                if let Some(statuses) = observe(Arc::clone(&supervisor)).await {
                    for (role, running) in statuses {
                        let _ = events.send(Event::RoleStatus { role, running }).await;
                    }
                }
            }
            Op::Shutdown => break,
        }
    }
    tracing::debug!("Control loop finished");
}

async fn toggle(supervisor: Arc<ProcessSupervisor>, role: RoleKind, events: mpsc::Sender<Event>) {
    let _ = events.send(Event::ActionStarted { role }).await;

    let worker = Arc::clone(&supervisor);
    let result = tokio::task::spawn_blocking(move || {
        let action = worker.toggle(role);
        let running = worker.is_alive(role);
        (action, running)
    })
    .await;

    match result {
        Ok((action, running)) => {
            let _ = events
                .send(Event::ActionCompleted {
                    report: action.report(role),
                })
                .await;
            let _ = events.send(Event::RoleStatus { role, running }).await;
        }
        Err(e) => tracing::error!(%role, "Toggle task failed: {e}"),
    }
}
