//! Running configured commands: detached role processes, graceful stop
//! commands and provisioning steps.

use crate::config::models::Invocation;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

/// Locate the program of an invocation without running it.
///
/// A program containing a path separator must exist on disk and carry an
/// execute bit; relative paths are taken from the invocation's working
/// directory. A bare name is looked up on `PATH`.
pub fn resolve_program(invocation: &Invocation) -> Result<PathBuf, String> {
    let program = invocation.program.as_str();

    if !program.contains(std::path::MAIN_SEPARATOR) && !program.contains('/') {
        return which::which(program).map_err(|_| format!("'{program}' was not found on PATH"));
    }

    let path = Path::new(program);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        invocation.cwd.join(path)
    };

    let metadata = std::fs::metadata(&path)
        .map_err(|_| format!("{} not found", path.display()))?;
    if !metadata.is_file() {
        return Err(format!("{} is not a file", path.display()));
    }
    if !is_executable(&metadata) {
        return Err(format!("{} is not executable", path.display()));
    }
    Ok(path)
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

/// Start `program` in its own session with all stdio discarded.
///
/// The child outlives the caller; the returned handle is only used to reap
/// it and to notice an early exit.
pub fn spawn_detached(program: &Path, invocation: &Invocation) -> io::Result<Child> {
    let mut cmd = Command::new(program);
    cmd.args(&invocation.args)
        .current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // SAFETY: setsid is async-signal-safe and touches no parent state.
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid()
                    .map(|_| ())
                    .map_err(io::Error::from)
            });
        }
    }

    cmd.spawn()
}

/// Run a resolved program to completion with output discarded.
pub fn run_to_completion(program: &Path, invocation: &Invocation) -> io::Result<ExitStatus> {
    Command::new(program)
        .args(&invocation.args)
        .current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
}
