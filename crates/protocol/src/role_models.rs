//! Managed process role models.
//!
//! A role is one of the long-running programs the controller supervises.
//! The set of roles is fixed; only their observed liveness changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// A logical externally-managed process.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    /// The photo upload web server.
    Server,

    /// The external slideshow program.
    Slideshow,
}

impl RoleKind {
    /// Every managed role, in display order.
    pub const ALL: [RoleKind; 2] = [RoleKind::Server, RoleKind::Slideshow];

    /// Lowercase machine name, as used in config tables and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::Server => "server",
            RoleKind::Slideshow => "slideshow",
        }
    }

    /// Capitalized name for status text.
    pub fn label(self) -> &'static str {
        match self {
            RoleKind::Server => "Server",
            RoleKind::Slideshow => "Slideshow",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "server" => Ok(RoleKind::Server),
            "slideshow" => Ok(RoleKind::Slideshow),
            other => Err(format!(
                "unknown role '{other}' (expected 'server' or 'slideshow')"
            )),
        }
    }
}

/// The kind of outcome a supervisor action produced.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// A new detached process was spawned.
    Started,

    /// At least one matching process was asked to stop.
    Stopped,

    /// Nothing matched; the role was already stopped.
    NothingToStop,

    /// A start was suppressed because a recent spawn is still settling.
    AlreadyStarting,

    /// A start was suppressed because the role is already running.
    AlreadyRunning,

    /// The action could not be carried out.
    Failed,
}

/// A supervisor action outcome, flattened for display and transport.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ActionReport {
    pub role: RoleKind,
    pub kind: ActionKind,
    /// Human-readable status line, e.g. "Server starting...".
    pub message: String,
}

impl ActionReport {
    /// Whether the action counts as a failure for exit codes and styling.
    pub fn is_failure(&self) -> bool {
        self.kind == ActionKind::Failed
    }
}

/// Transient per-role state shown by the controller.
///
/// Recomputed on demand and on every poll tick; never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct RoleObservation {
    pub role: RoleKind,

    /// Whether at least one matching process was alive at the last probe.
    pub running: bool,

    /// Status line of the most recent action on this role, if any.
    pub last_action: Option<String>,
}

impl RoleObservation {
    pub fn new(role: RoleKind) -> Self {
        Self {
            role,
            running: false,
            last_action: None,
        }
    }
}
