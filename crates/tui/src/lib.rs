//! # pf-tui
//!
//! Terminal controller for photo-frame.
//!
//! The screen shows where the web server can be reached and whether each
//! managed role is running, and lets the user toggle roles. It talks to
//! `pf-core` only through the `Op` and `Event` channels defined in
//! `pf-protocol`; supervisor work never runs on the UI task.

pub mod address;
pub mod app;
pub mod event_handler;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use tui::Tui;

use anyhow::Result;
use pf_core::config::models::AppConfig;
use pf_core::supervisor::{run_control_loop, LivenessPoller, ProcessSupervisor};
use pf_protocol::ipc::Op;
use std::sync::Arc;
use tokio::sync::mpsc;

const OP_CAPACITY: usize = 16;
const EVENT_CAPACITY: usize = 64;

/// Run the controller until the user quits.
///
/// Roles started from the controller keep running after it exits.
pub async fn run_controller(config: &AppConfig) -> Result<()> {
    let supervisor = Arc::new(ProcessSupervisor::new(config));

    let (op_tx, op_rx) = mpsc::channel(OP_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);

    let control = tokio::spawn(run_control_loop(
        Arc::clone(&supervisor),
        op_rx,
        event_tx.clone(),
    ));
    let poller = LivenessPoller::spawn(Arc::clone(&supervisor), config.poll_interval, event_tx);

    let address = address::web_address(config.port);
    tracing::info!(%address, base = %config.base_dir.display(), "Controller started");

    let mut tui = Tui::init()?;
    let mut app = App::new(address, op_tx.clone(), event_rx);
    let outcome = app.run(&mut tui).await;
    let restored = tui.restore();

    // Closing the event side first keeps the control loop from blocking on a full channel.
    drop(app);
    poller.abort();
    let _ = op_tx.send(Op::Shutdown).await;
    if let Err(e) = control.await {
        tracing::warn!("Control loop ended abnormally: {e}");
    }
    tracing::info!("Controller stopped");

    outcome.and(restored)
}
