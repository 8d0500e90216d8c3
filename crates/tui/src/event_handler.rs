//! Event handling for the controller.
//!
//! - Core events update the role table and status line
//! - Key presses turn into `Op`s for the control loop

use crate::app::{ControllerState, StatusTone};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pf_protocol::ipc::{Event, Op};
use pf_protocol::role_models::RoleKind;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;

/// Apply an event from the control loop or the poller.
pub fn handle_core_event(state: &mut ControllerState, event: Event) {
    match event {
        Event::RoleStatus { role, running } => {
            if let Some(observation) = state.role_mut(role) {
                observation.running = running;
            }
        }
        Event::ActionStarted { role } => {
            state.in_flight.insert(role);
            let verb = match state.role(role).map(|o| o.running) {
                Some(true) => "Stopping",
                _ => "Starting",
            };
            state.set_status(format!("{verb} {}...", role.label()), StatusTone::Neutral);
        }
        Event::ActionCompleted { report } => {
            state.in_flight.remove(&report.role);
            let tone = StatusTone::for_action(report.kind);
            if let Some(observation) = state.role_mut(report.role) {
                observation.last_action = Some(report.message.clone());
            }
            state.set_status(report.message, tone);
        }
    }
}

/// Handle a key press.
///
/// Returns `true` if the controller should exit.
pub fn handle_keyboard_event(key_event: KeyEvent, state: &mut ControllerState, op_tx: &Sender<Op>) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }

    match key_event.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('s') => request_toggle(RoleKind::Server, state, op_tx),
        KeyCode::Char('l') => request_toggle(RoleKind::Slideshow, state, op_tx),
        KeyCode::Char('r') => {
            if send(op_tx, Op::RefreshStatus) {
                state.set_status("Refreshing...", StatusTone::Neutral);
            }
        }
        _ => {}
    }

    false
}

/// Queue a toggle unless that role already has one in flight.
fn request_toggle(role: RoleKind, state: &mut ControllerState, op_tx: &Sender<Op>) {
    if state.in_flight.contains(&role) {
        return;
    }
    // Marked here, not on `ActionStarted`, so a quick double press sends one op.
    if send(op_tx, Op::ToggleRole { role }) {
        state.in_flight.insert(role);
    } else {
        state.set_status(format!("{} is busy, try again", role.label()), StatusTone::Failure);
    }
}

fn send(op_tx: &Sender<Op>, op: Op) -> bool {
    match op_tx.try_send(op) {
        Ok(()) => true,
        Err(TrySendError::Full(op)) => {
            tracing::warn!("Control loop is backed up, dropped {op:?}");
            false
        }
        Err(TrySendError::Closed(op)) => {
            tracing::error!("Control loop has stopped, dropped {op:?}");
            false
        }
    }
}
