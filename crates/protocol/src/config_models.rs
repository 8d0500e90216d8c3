//! Configuration models for `.photo-frame/config.toml`.
//!
//! These are the raw, deserialized shapes of the configuration file. String
//! values may still contain the `{base}`, `{store}` and `{exe}`
//! placeholders; `pf-core` expands them and compiles the role patterns.

use serde::Deserialize;
use serde::Serialize;

/// Represents the whole of `.photo-frame/config.toml`.
///
/// Every key is optional; missing keys take the defaults below.
///
/// # Example
///
/// ```toml
/// # .photo-frame/config.toml
/// port = 8080
/// store_dir = "/srv/photos"
///
/// [normalize]
/// max_width = 1280
/// max_height = 720
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Address the web server binds to.
    pub host: String,

    /// Port the web server binds to and the controller advertises.
    pub port: u16,

    /// Photo store directory, relative to the base directory unless absolute.
    pub store_dir: String,

    /// Per-file upload ceiling enforced by the web boundary.
    pub max_file_bytes: u64,

    /// Liveness poll cadence of the controller.
    pub poll_interval_ms: u64,

    /// How long a fresh spawn suppresses a second start of the same role.
    pub settle_ms: u64,

    pub normalize: NormalizeConfig,

    pub roles: RolesConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            store_dir: "uploads".to_string(),
            max_file_bytes: 16 * 1024 * 1024,
            poll_interval_ms: 2000,
            settle_ms: 1500,
            normalize: NormalizeConfig::default(),
            roles: RolesConfig::default(),
        }
    }
}

/// Bounds and encoding settings applied to every accepted upload.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct NormalizeConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality (1-100) used whenever an image is re-encoded as JPEG.
    pub jpeg_quality: u8,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            jpeg_quality: 85,
        }
    }
}

/// The fixed set of managed roles.
///
/// Supplying a `[roles.<name>]` table replaces that role's defaults as a
/// whole; the other role keeps its defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RolesConfig {
    pub server: RoleConfig,
    pub slideshow: RoleConfig,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            server: RoleConfig::default_server(),
            slideshow: RoleConfig::default_slideshow(),
        }
    }
}

/// How one role is detected, started, stopped and provisioned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoleConfig {
    /// Regex matched against each process's space-joined command line.
    pub pattern: String,

    /// Companion helper processes terminated together with the role.
    #[serde(default)]
    pub aux_patterns: Vec<String>,

    #[serde(default)]
    pub start: Option<CommandSpec>,

    /// Graceful-stop command tried before signalling.
    #[serde(default)]
    pub stop: Option<CommandSpec>,

    #[serde(default)]
    pub provision: Option<ProvisionConfig>,
}

impl RoleConfig {
    /// The web server is this same executable running `serve`.
    pub fn default_server() -> Self {
        Self {
            pattern: r"photo-frame\s+serve".to_string(),
            aux_patterns: Vec::new(),
            start: Some(CommandSpec {
                program: "{exe}".to_string(),
                args: vec![
                    "serve".to_string(),
                    "--base-dir".to_string(),
                    "{base}".to_string(),
                ],
                cwd: Some("{base}".to_string()),
            }),
            stop: None,
            provision: Some(ProvisionConfig {
                creates: "{store}".to_string(),
                steps: Vec::new(),
            }),
        }
    }

    /// The slideshow is an external script that drives `feh` and `lisgd`.
    pub fn default_slideshow() -> Self {
        Self {
            pattern: r"pi_photo_frame\.sh".to_string(),
            aux_patterns: vec![r"\bfeh\b".to_string(), r"\blisgd\b".to_string()],
            start: Some(CommandSpec {
                program: "{base}/pi_photo_frame.sh".to_string(),
                args: vec![
                    "-run".to_string(),
                    "-dir".to_string(),
                    "{store}".to_string(),
                ],
                cwd: Some("{base}".to_string()),
            }),
            stop: Some(CommandSpec {
                program: "{base}/pi_photo_frame.sh".to_string(),
                args: vec!["-stop".to_string()],
                cwd: Some("{base}".to_string()),
            }),
            provision: None,
        }
    }
}

/// A program invocation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Path to the executable, or a bare name looked up on `PATH`.
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory; defaults to the base directory.
    #[serde(default)]
    pub cwd: Option<String>,
}

/// A runtime environment a role needs before it can start.
///
/// When `creates` is missing the `steps` run in order. With no steps,
/// `creates` is simply created as a directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub creates: String,

    #[serde(default)]
    pub steps: Vec<CommandSpec>,
}
