//! Process supervision for the server and slideshow roles.
//!
//! This module provides:
//! - [`LivenessProbe`]: pattern matching over the live process table
//! - [`ProcessSupervisor`]: start/stop/toggle with layered stop fallback
//! - [`LivenessPoller`]: periodic status events for the controller
//! - [`run_control_loop`]: executes controller `Op`s off the UI thread

pub mod command;
pub mod error;
pub mod manager;
pub mod poller;
pub mod probe;
pub mod table;
pub mod worker;

pub use error::{ProbeError, SupervisorError};
pub use manager::{ActionTaken, ProcessSupervisor};
pub use poller::LivenessPoller;
pub use probe::LivenessProbe;
pub use table::{ProcessInfo, ProcessTable, SysinfoTable};
pub use worker::run_control_loop;
