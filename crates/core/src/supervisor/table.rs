//! Access to the operating system's process table.

use super::error::ProbeError;
use sysinfo::System;

/// One live process as seen by the probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Full argument vector joined with single spaces.
    pub cmdline: String,
}

/// A source of process snapshots.
pub trait ProcessTable: Send + Sync {
    fn snapshot(&self) -> Result<Vec<ProcessInfo>, ProbeError>;
}

/// [`ProcessTable`] backed by `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoTable;

impl ProcessTable for SysinfoTable {
    fn snapshot(&self) -> Result<Vec<ProcessInfo>, ProbeError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::Unavailable(format!(
                "{} is not supported",
                std::env::consts::OS
            )));
        }

        let mut system = System::new();
        system.refresh_processes();

        Ok(system
            .processes()
            .iter()
            .filter(|(_, process)| !process.cmd().is_empty())
            .map(|(pid, process)| ProcessInfo {
                pid: pid.as_u32(),
                cmdline: process.cmd().join(" "),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_contains_current_process() {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return;
        }
        let own = std::process::id();
        let snapshot = SysinfoTable.snapshot().unwrap();
        assert!(snapshot.iter().any(|p| p.pid == own && !p.cmdline.is_empty()));
    }
}
