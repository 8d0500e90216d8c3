//! Start/stop/toggle for the managed roles.
//!
//! The supervisor owns no long-lived handles to the roles it controls.
//! Whether a role runs is always answered by the [`LivenessProbe`]; the only
//! state kept here is the short-lived record of our own most recent spawn,
//! used to keep a role from being started twice while it boots.

use super::command::{resolve_program, run_to_completion, spawn_detached};
use super::error::SupervisorError;
use super::probe::LivenessProbe;
use super::table::{ProcessTable, SysinfoTable};
use crate::config::models::{AppConfig, Invocation, RoleSpec};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use pf_protocol::role_models::{ActionKind, ActionReport, RoleKind};
use std::process::Child;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// How long a graceful stop may take to make the role disappear.
const GRACEFUL_GRACE: Duration = Duration::from_millis(1000);
const GRACEFUL_POLL: Duration = Duration::from_millis(100);

/// Result of one supervisor action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTaken {
    Started,

    /// `targeted` counts processes signalled; zero after a graceful stop.
    Stopped { targeted: usize },

    /// Stop on a role that was not running.
    NothingToStop,

    /// A start within the settle window of our own earlier spawn.
    AlreadyStarting,

    /// A start on a role the probe already sees running.
    AlreadyRunning,

    Failed(SupervisorError),
}

impl ActionTaken {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionTaken::Started => ActionKind::Started,
            ActionTaken::Stopped { .. } => ActionKind::Stopped,
            ActionTaken::NothingToStop => ActionKind::NothingToStop,
            ActionTaken::AlreadyStarting => ActionKind::AlreadyStarting,
            ActionTaken::AlreadyRunning => ActionKind::AlreadyRunning,
            ActionTaken::Failed(_) => ActionKind::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ActionTaken::Failed(_))
    }

    /// One-line, user-facing description.
    pub fn status_line(&self, role: RoleKind) -> String {
        let label = role.label();
        match self {
            ActionTaken::Started => format!("{label} starting..."),
            ActionTaken::Stopped { targeted: 0 } => format!("{label} stopped"),
            ActionTaken::Stopped { targeted: 1 } => format!("{label} stopped (1 process signalled)"),
            ActionTaken::Stopped { targeted } => {
                format!("{label} stopped ({targeted} processes signalled)")
            }
            ActionTaken::NothingToStop => format!("{label} is not running"),
            ActionTaken::AlreadyStarting => format!("{label} is already starting"),
            ActionTaken::AlreadyRunning => format!("{label} is already running"),
            ActionTaken::Failed(err) => err.to_string(),
        }
    }

    pub fn report(&self, role: RoleKind) -> ActionReport {
        ActionReport {
            role,
            kind: self.kind(),
            message: self.status_line(role),
        }
    }
}

/// Our own most recent spawn of a role.
#[derive(Debug)]
struct Spawned {
    at: Instant,
    child: Child,
}

/// One role's spec and its spawn record.
///
/// Each role has its own lock, so a slow action on one never waits on the other.
struct Slot {
    spec: RoleSpec,
    spawned: Mutex<Option<Spawned>>,
}

impl Slot {
    fn new(spec: RoleSpec) -> Self {
        Self {
            spec,
            spawned: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Spawned>> {
        self.spawned.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Controls the server and slideshow roles.
pub struct ProcessSupervisor {
    server: Slot,
    slideshow: Slot,
    probe: LivenessProbe,
    settle: Duration,
}

impl ProcessSupervisor {
    /// Supervisor over the real process table.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_table(config, Arc::new(SysinfoTable))
    }

    pub fn with_table(config: &AppConfig, table: Arc<dyn ProcessTable>) -> Self {
        let probe = LivenessProbe::new(
            table,
            config.server.pattern.clone(),
            config.slideshow.pattern.clone(),
        );
        Self {
            server: Slot::new(config.role(RoleKind::Server).clone()),
            slideshow: Slot::new(config.role(RoleKind::Slideshow).clone()),
            probe,
            settle: config.settle,
        }
    }

    pub fn probe(&self) -> &LivenessProbe {
        &self.probe
    }

    pub fn is_alive(&self, role: RoleKind) -> bool {
        self.probe.is_alive(role)
    }

    fn slot(&self, role: RoleKind) -> &Slot {
        match role {
            RoleKind::Server => &self.server,
            RoleKind::Slideshow => &self.slideshow,
        }
    }

    /// Stop the role if it runs, start it otherwise.
    pub fn toggle(&self, role: RoleKind) -> ActionTaken {
        if self.probe.is_alive(role) {
            self.stop(role)
        } else {
            self.start(role)
        }
    }

    /// Start a role, detached from this process.
    ///
    /// Returns as soon as the process exists; readiness is observed through
    /// [`Self::is_alive`].
    pub fn start(&self, role: RoleKind) -> ActionTaken {
        let slot = self.slot(role);
        // Held across the check and the spawn so concurrent starts of a role serialize.
        let mut spawned = slot.lock();

        if self.settling(&mut spawned) {
            tracing::info!(%role, "Start ignored, previous start still settling");
            return ActionTaken::AlreadyStarting;
        }
        if self.probe.is_alive(role) {
            tracing::info!(%role, "Start ignored, role is already running");
            return ActionTaken::AlreadyRunning;
        }

        let spec = &slot.spec;
        let Some(invocation) = spec.start.as_ref() else {
            return self.failed(SupervisorError::MissingPrerequisite {
                role,
                detail: "no start command is configured".to_string(),
            });
        };

        if let Err(detail) = provision(spec) {
            return self.failed(SupervisorError::ProvisioningFailure { role, detail });
        }

        let program = match resolve_program(invocation) {
            Ok(program) => program,
            Err(detail) => {
                return self.failed(SupervisorError::MissingPrerequisite { role, detail });
            }
        };

        match spawn_detached(&program, invocation) {
            Ok(child) => {
                tracing::info!(%role, pid = child.id(), command = %invocation.display(), "Started role");
                *spawned = Some(Spawned {
                    at: Instant::now(),
                    child,
                });
                ActionTaken::Started
            }
            Err(e) => self.failed(SupervisorError::SpawnFailure {
                role,
                detail: e.to_string(),
            }),
        }
    }

    /// Stop a role: graceful command first, then SIGTERM to every match.
    ///
    /// A role with no matching process is `NothingToStop`; no stop command runs.
    pub fn stop(&self, role: RoleKind) -> ActionTaken {
        let slot = self.slot(role);
        let spec = &slot.spec;

        let record = slot.lock().take();
        if let Some(record) = record {
            reap(record.child);
        }

        if self.role_pids(spec).is_empty() {
            tracing::info!(%role, "Stop ignored, role is not running");
            return ActionTaken::NothingToStop;
        }

        let mut stopped = None;
        if let Some(invocation) = spec.stop.as_ref() {
            if self.graceful_stop(role, invocation) {
                stopped = Some(ActionTaken::Stopped { targeted: 0 });
            }
        }
        if stopped.is_none() {
            let targeted = self.signal_stop(spec);
            if targeted > 0 {
                stopped = Some(ActionTaken::Stopped { targeted });
            }
        }

        match stopped {
            Some(action) => {
                tracing::info!(%role, "{}", action.status_line(role));
                action
            }
            None if self.probe.is_alive(role) => {
                self.failed(SupervisorError::StopFailure { role })
            }
            None => ActionTaken::NothingToStop,
        }
    }

    /// True if our last spawn of the role is recent and its child still runs.
    /// Drops the record otherwise.
    fn settling(&self, spawned: &mut Option<Spawned>) -> bool {
        let Some(record) = spawned.as_mut() else {
            return false;
        };

        let exited = !matches!(record.child.try_wait(), Ok(None));
        if exited || record.at.elapsed() >= self.settle {
            if let Some(record) = spawned.take() {
                reap(record.child);
            }
            return false;
        }
        true
    }

    /// Pids matching the role or its helpers. Empty if the table is unreadable.
    fn role_pids(&self, spec: &RoleSpec) -> Vec<u32> {
        let mut patterns = vec![&spec.pattern];
        patterns.extend(spec.aux_patterns.iter());

        match self.probe.matching_pids(&patterns) {
            Ok(pids) => pids,
            Err(e) => {
                tracing::debug!(role = %spec.role, "Cannot enumerate processes: {e}");
                Vec::new()
            }
        }
    }

    fn graceful_stop(&self, role: RoleKind, invocation: &Invocation) -> bool {
        let program = match resolve_program(invocation) {
            Ok(program) => program,
            Err(detail) => {
                tracing::debug!(%role, "Graceful stop unavailable: {detail}");
                return false;
            }
        };

        match run_to_completion(&program, invocation) {
            Ok(status) if status.success() => {}
            Ok(status) => {
                tracing::debug!(%role, %status, "Graceful stop command failed");
                return false;
            }
            Err(e) => {
                tracing::debug!(%role, "Graceful stop command could not run: {e}");
                return false;
            }
        }

        let deadline = Instant::now() + GRACEFUL_GRACE;
        loop {
            if !self.probe.is_alive(role) {
                return true;
            }
            if Instant::now() >= deadline {
                tracing::debug!(%role, "Role still alive after graceful stop");
                return false;
            }
            std::thread::sleep(GRACEFUL_POLL);
        }
    }

    /// SIGTERM every process matching the role or its helpers.
    /// Returns how many signals were delivered.
    fn signal_stop(&self, spec: &RoleSpec) -> usize {
        self.role_pids(spec)
            .into_iter()
            .filter(|&pid| {
                let Ok(raw) = i32::try_from(pid) else {
                    return false;
                };
                match kill(Pid::from_raw(raw), Signal::SIGTERM) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(role = %spec.role, pid, "SIGTERM failed: {e}");
                        false
                    }
                }
            })
            .count()
    }

    fn failed(&self, err: SupervisorError) -> ActionTaken {
        tracing::warn!("{err}");
        ActionTaken::Failed(err)
    }
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("probe", &self.probe)
            .field("settle", &self.settle)
            .finish_non_exhaustive()
    }
}

/// Collect a spawned child's exit status once it ends.
fn reap(mut child: Child) {
    if !matches!(child.try_wait(), Ok(None)) {
        return;
    }
    let spawned = std::thread::Builder::new()
        .name("pf-reaper".to_string())
        .spawn(move || {
            let _ = child.wait();
        });
    if let Err(e) = spawned {
        tracing::debug!("Could not start reaper thread: {e}");
    }
}

/// Make sure a role's environment exists before it is spawned.
fn provision(spec: &RoleSpec) -> Result<(), String> {
    let Some(provision) = spec.provision.as_ref() else {
        return Ok(());
    };
    if provision.creates.exists() {
        return Ok(());
    }

    tracing::info!(role = %spec.role, creates = %provision.creates.display(), "Provisioning");

    if provision.steps.is_empty() {
        std::fs::create_dir_all(&provision.creates)
            .map_err(|e| format!("cannot create {}: {e}", provision.creates.display()))?;
    }

    for step in &provision.steps {
        let program = resolve_program(step)?;
        let status = run_to_completion(&program, step)
            .map_err(|e| format!("'{}' could not run: {e}", step.display()))?;
        if !status.success() {
            return Err(format!("'{}' exited with {status}", step.display()));
        }
    }

    if provision.creates.exists() {
        Ok(())
    } else {
        Err(format!(
            "{} is still missing after setup",
            provision.creates.display()
        ))
    }
}
