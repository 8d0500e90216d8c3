//! Error types for process supervision.

use pf_protocol::role_models::RoleKind;
use thiserror::Error;

/// Why a supervisor action failed.
///
/// These never escape the supervisor as `Err`; they travel inside
/// [`crate::supervisor::ActionTaken::Failed`] and end up as status text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// No start command, or its program is missing or not executable.
    #[error("{} cannot start: {detail}", role.label())]
    MissingPrerequisite { role: RoleKind, detail: String },

    /// The role's runtime environment could not be created.
    #[error("{} environment setup failed: {detail}", role.label())]
    ProvisioningFailure { role: RoleKind, detail: String },

    /// The OS refused to create the process.
    #[error("Failed to start {}: {detail}", role.label())]
    SpawnFailure { role: RoleKind, detail: String },

    /// Nothing could be stopped yet the role still reports running.
    #[error("Failed to stop {}: it is still running", role.label())]
    StopFailure { role: RoleKind },
}

/// The live process table could not be read.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("process table unavailable: {0}")]
    Unavailable(String),
}
