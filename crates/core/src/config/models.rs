//! Resolved configuration models.
//!
//! `AppConfig` is what the rest of the crate consumes: absolute paths,
//! compiled role patterns and fully expanded command lines. It is built
//! from the raw `FileConfig` by [`crate::config::loader`].

use pf_protocol::config_models::NormalizeConfig;
use pf_protocol::role_models::RoleKind;
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

/// Unified application configuration for one base directory.
///
/// # Example
///
/// ```rust,no_run
/// use pf_core::config::loader::load_config;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("."))?;
/// println!("Photos live in {}", config.store_dir.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding `.photo-frame/` and, by default, the store.
    pub base_dir: PathBuf,

    /// Directory the photo store reads and writes.
    pub store_dir: PathBuf,

    pub host: String,
    pub port: u16,

    /// Per-file upload ceiling enforced by the web boundary.
    pub max_file_bytes: u64,

    pub poll_interval: Duration,
    pub settle: Duration,

    pub normalize: NormalizeConfig,

    pub server: RoleSpec,
    pub slideshow: RoleSpec,
}

impl AppConfig {
    /// Look up the spec for a role.
    pub fn role(&self, role: RoleKind) -> &RoleSpec {
        match role {
            RoleKind::Server => &self.server,
            RoleKind::Slideshow => &self.slideshow,
        }
    }

    /// Location of the controller log file.
    pub fn log_path(&self) -> PathBuf {
        self.base_dir.join(".photo-frame").join("controller.log")
    }
}

/// Everything the supervisor knows about one managed role.
#[derive(Debug, Clone)]
pub struct RoleSpec {
    pub role: RoleKind,

    /// Matched against each live process's command line.
    pub pattern: Regex,

    /// Helper processes signalled together with the role.
    pub aux_patterns: Vec<Regex>,

    pub start: Option<Invocation>,

    /// Graceful stop, tried before any signal.
    pub stop: Option<Invocation>,

    pub provision: Option<ProvisionSpec>,
}

/// A fully expanded program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    /// Render for logs and status text.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Runtime environment a role needs before it can be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSpec {
    /// Present once the environment is ready.
    pub creates: PathBuf,

    /// Commands that build the environment, run in order.
    pub steps: Vec<Invocation>,
}
