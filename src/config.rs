//! Installer configuration
//!
//! Defaults derive from the home and temp directories; an optional TOML file
//! overrides any subset of keys. Components only ever see the resolved value.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment file at the install root
pub const ENV_FILE: &str = ".env";
/// Template the environment file is seeded from
pub const ENV_TEMPLATE: &str = ".env.example";
/// The manager's entry point; its presence proves a fetch succeeded
pub const MARKER_FILE: &str = "main.py";
/// Python dependency manifest shipped with the project
pub const MANIFEST_FILE: &str = "requirements.txt";
/// Directory skeleton created under the install root
pub const SUBDIRECTORIES: [&str; 6] = ["data", "logs", "run", "server", "backups", "bin"];

/// Upstream repository of the server manager
pub const DEFAULT_REPO_URL: &str = "https://github.com/yunkz97/mc-server-termux.git";

/// Immutable installer configuration, handed to every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub home_dir: PathBuf,
    pub install_root: PathBuf,
    /// Shell profile receiving the launch shortcut
    pub shell_profile: PathBuf,
    /// Per-step diagnostic logs (outside the install root, which may be wiped)
    pub log_dir: PathBuf,
    /// Side-channel location of the configuration backup during UPDATE
    pub backup_path: PathBuf,
    pub repo_url: String,
    pub version: String,
    pub min_free_mb: u64,
    /// host:port probed for connectivity
    pub connectivity_probe: String,
    pub connectivity_timeout_secs: u64,
    /// Pause after triggering the storage grant before re-checking
    pub storage_grant_wait_secs: u64,
    pub poll_interval_ms: u64,
    pub shortcut_name: String,
    pub python: String,
    pub debug: bool,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::for_home(&home, &std::env::temp_dir())
    }
}

impl InstallerConfig {
    /// Defaults derived from a home directory and a scratch directory
    pub fn for_home(home: &Path, scratch: &Path) -> Self {
        Self {
            home_dir: home.to_path_buf(),
            install_root: home.join("mc-server-termux"),
            shell_profile: home.join(".bashrc"),
            log_dir: scratch.join("mc-server-termux-install"),
            backup_path: scratch.join("mc-server-termux.env.bak"),
            repo_url: DEFAULT_REPO_URL.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            min_free_mb: 500,
            connectivity_probe: "8.8.8.8:53".to_string(),
            connectivity_timeout_secs: 5,
            storage_grant_wait_secs: 3,
            poll_interval_ms: 80,
            shortcut_name: "mcserver".to_string(),
            python: "python".to_string(),
            debug: false,
        }
    }

    /// Defaults, optionally overridden by a TOML file
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn env_file(&self) -> PathBuf {
        self.install_root.join(ENV_FILE)
    }

    pub fn env_template(&self) -> PathBuf {
        self.install_root.join(ENV_TEMPLATE)
    }

    pub fn marker_file(&self) -> PathBuf {
        self.install_root.join(MARKER_FILE)
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.install_root.join(MANIFEST_FILE)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.install_root.join("bin")
    }

    /// Log file for one step, e.g. `pip` -> `<log_dir>/pip.log`
    pub fn step_log(&self, step: &str) -> PathBuf {
        self.log_dir.join(format!("{step}.log"))
    }
}
