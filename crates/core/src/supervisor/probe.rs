//! Command-line pattern liveness checks.
//!
//! Liveness is derived from the process table on every call. Nothing is
//! cached, so roles started by another tool or an earlier controller
//! session are seen the same way as our own.

use super::error::ProbeError;
use super::table::ProcessTable;
use pf_protocol::role_models::RoleKind;
use regex::Regex;
use std::sync::Arc;

/// Answers "is this role running?" from command-line patterns.
#[derive(Clone)]
pub struct LivenessProbe {
    table: Arc<dyn ProcessTable>,
    server: Regex,
    slideshow: Regex,
    own_pid: u32,
}

impl LivenessProbe {
    pub fn new(table: Arc<dyn ProcessTable>, server: Regex, slideshow: Regex) -> Self {
        Self {
            table,
            server,
            slideshow,
            own_pid: std::process::id(),
        }
    }

    pub fn pattern(&self, role: RoleKind) -> &Regex {
        match role {
            RoleKind::Server => &self.server,
            RoleKind::Slideshow => &self.slideshow,
        }
    }

    /// True iff another process's command line matches the role's pattern.
    ///
    /// A table that cannot be read counts as "not running".
    pub fn is_alive(&self, role: RoleKind) -> bool {
        match self.matching_pids(&[self.pattern(role)]) {
            Ok(pids) => !pids.is_empty(),
            Err(e) => {
                tracing::debug!(%role, "Liveness probe failed: {e}");
                false
            }
        }
    }

    /// Running state of every role from a single snapshot.
    pub fn observe_all(&self) -> Vec<(RoleKind, bool)> {
        let snapshot = match self.table.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!("Liveness probe failed: {e}");
                return RoleKind::ALL.iter().map(|role| (*role, false)).collect();
            }
        };

        RoleKind::ALL
            .iter()
            .map(|role| {
                let pattern = self.pattern(*role);
                let running = snapshot
                    .iter()
                    .any(|p| p.pid != self.own_pid && pattern.is_match(&p.cmdline));
                (*role, running)
            })
            .collect()
    }

    /// PIDs of processes, other than our own, matching any of `patterns`.
    pub fn matching_pids(&self, patterns: &[&Regex]) -> Result<Vec<u32>, ProbeError> {
        let mut pids: Vec<u32> = self
            .table
            .snapshot()?
            .into_iter()
            .filter(|p| p.pid != self.own_pid)
            .filter(|p| patterns.iter().any(|re| re.is_match(&p.cmdline)))
            .map(|p| p.pid)
            .collect();
        pids.sort_unstable();
        pids.dedup();
        Ok(pids)
    }
}

impl std::fmt::Debug for LivenessProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessProbe")
            .field("server", &self.server.as_str())
            .field("slideshow", &self.slideshow.as_str())
            .finish_non_exhaustive()
    }
}
