//! Configuration file loader for the `.photo-frame/` directory.
//!
//! This module reads `.photo-frame/config.toml` below a base directory and
//! resolves it into an [`AppConfig`]:
//! - relative paths are anchored at the base directory
//! - `{base}`, `{store}` and `{exe}` placeholders are expanded
//! - role patterns are compiled

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::{AppConfig, Invocation, ProvisionSpec, RoleSpec};
use pf_protocol::config_models::{CommandSpec, FileConfig, RoleConfig};
use pf_protocol::role_models::RoleKind;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the per-installation configuration directory.
pub const CONFIG_DIR: &str = ".photo-frame";

/// Loads configuration for the given base directory.
///
/// # Arguments
///
/// * `base_dir` - Directory containing the `.photo-frame/` folder
///
/// # Returns
///
/// The resolved `AppConfig`. If `.photo-frame/` or `config.toml` is
/// missing, defaults are used rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML
/// - A role pattern is not a valid regular expression
/// - A value is out of range
pub fn load_config(base_dir: &Path) -> ConfigResult<AppConfig> {
    let file_config = load_file_config(base_dir)?;
    let exe = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "photo-frame".to_string());
    resolve_config(base_dir, file_config, &exe)
}

/// Reads `config.toml`, returning defaults when it does not exist.
fn load_file_config(base_dir: &Path) -> ConfigResult<FileConfig> {
    let config_path = base_dir.join(CONFIG_DIR).join("config.toml");

    if !config_path.exists() {
        return Ok(FileConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path,
        source,
    })
}

/// Turns a raw `FileConfig` into an `AppConfig`.
///
/// `exe` is substituted for `{exe}`, normally the running binary.
pub fn resolve_config(base_dir: &Path, file: FileConfig, exe: &str) -> ConfigResult<AppConfig> {
    let base_dir = absolutize(base_dir);
    let config_path = base_dir.join(CONFIG_DIR).join("config.toml");

    let invalid = |reason: String| ConfigError::InvalidConfig {
        path: config_path.clone(),
        reason,
    };

    if file.normalize.max_width == 0 || file.normalize.max_height == 0 {
        return Err(invalid("normalize bounds must be greater than zero".to_string()));
    }
    if !(1..=100).contains(&file.normalize.jpeg_quality) {
        return Err(invalid(format!(
            "jpeg_quality must be between 1 and 100, got {}",
            file.normalize.jpeg_quality
        )));
    }
    if file.poll_interval_ms == 0 {
        return Err(invalid("poll_interval_ms must be greater than zero".to_string()));
    }

    let base_str = base_dir.display().to_string();
    let store_dir = anchor(&base_dir, &file.store_dir.replace("{base}", &base_str));

    let placeholders = Placeholders {
        base: base_str,
        store: store_dir.display().to_string(),
        exe: exe.to_string(),
    };

    let server = resolve_role(RoleKind::Server, &file.roles.server, &base_dir, &placeholders)?;
    let slideshow = resolve_role(
        RoleKind::Slideshow,
        &file.roles.slideshow,
        &base_dir,
        &placeholders,
    )?;

    Ok(AppConfig {
        base_dir,
        store_dir,
        host: file.host,
        port: file.port,
        max_file_bytes: file.max_file_bytes,
        poll_interval: Duration::from_millis(file.poll_interval_ms),
        settle: Duration::from_millis(file.settle_ms),
        normalize: file.normalize,
        server,
        slideshow,
    })
}

struct Placeholders {
    base: String,
    store: String,
    exe: String,
}

impl Placeholders {
    fn expand(&self, value: &str) -> String {
        value
            .replace("{base}", &self.base)
            .replace("{store}", &self.store)
            .replace("{exe}", &self.exe)
    }
}

fn resolve_role(
    role: RoleKind,
    raw: &RoleConfig,
    base_dir: &Path,
    placeholders: &Placeholders,
) -> ConfigResult<RoleSpec> {
    let compile = |pattern: &str| {
        Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            role: role.to_string(),
            pattern: pattern.to_string(),
            source,
        })
    };

    let pattern = compile(&raw.pattern)?;
    let aux_patterns = raw
        .aux_patterns
        .iter()
        .map(|p| compile(p))
        .collect::<ConfigResult<Vec<_>>>()?;

    let invocation = |spec: &CommandSpec| resolve_invocation(spec, base_dir, placeholders);

    Ok(RoleSpec {
        role,
        pattern,
        aux_patterns,
        start: raw.start.as_ref().map(invocation),
        stop: raw.stop.as_ref().map(invocation),
        provision: raw.provision.as_ref().map(|p| ProvisionSpec {
            creates: anchor(base_dir, &placeholders.expand(&p.creates)),
            steps: p.steps.iter().map(invocation).collect(),
        }),
    })
}

fn resolve_invocation(spec: &CommandSpec, base_dir: &Path, placeholders: &Placeholders) -> Invocation {
    let cwd = spec
        .cwd
        .as_deref()
        .map(|c| anchor(base_dir, &placeholders.expand(c)))
        .unwrap_or_else(|| base_dir.to_path_buf());

    Invocation {
        program: placeholders.expand(&spec.program),
        args: spec.args.iter().map(|a| placeholders.expand(a)).collect(),
        cwd,
    }
}

/// Resolves `value` against `base_dir` unless it is already absolute.
fn anchor(base_dir: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
