//! Controller communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between the controller screen and the core supervisor.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the controller to the core
//! - `Event`: Status updates sent from the core to the controller
//!
//! Communication is channel-based so the screen stays responsive while
//! processes are spawned, probed or signalled on the blocking pool.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::role_models::{ActionReport, RoleKind};

/// Operations sent from the controller to the core.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// { "type": "toggleRole", "payload": { "role": "server" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Start the role if it is not running, stop it otherwise.
    ToggleRole { role: RoleKind },

    /// Re-probe every role immediately instead of waiting for the next tick.
    RefreshStatus,

    /// Stop processing operations.
    ///
    /// Managed roles are detached and keep running.
    Shutdown,
}

/// Events sent from the core to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// Fresh liveness observation for one role.
    RoleStatus { role: RoleKind, running: bool },

    /// A toggle was accepted and is running on the blocking pool.
    ActionStarted { role: RoleKind },

    /// A toggle finished.
    ActionCompleted { report: ActionReport },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role_models::ActionKind;

    #[test]
    fn test_op_serializes_as_tagged_payload() {
        let op = Op::ToggleRole {
            role: RoleKind::Server,
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["type"], "toggleRole");
        assert_eq!(json["payload"]["role"], "server");
    }

    #[test]
    fn test_event_round_trips_through_json() {
        let event = Event::ActionCompleted {
            report: ActionReport {
                role: RoleKind::Slideshow,
                kind: ActionKind::Stopped,
                message: "Slideshow stopped".to_string(),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
