//! Installation state detection
//!
//! The filesystem is the source of truth: every call to [`InstallationState::probe`]
//! takes a fresh snapshot and nothing caches it.

use std::path::PathBuf;

use crate::config::InstallerConfig;

/// Snapshot of a prior installation at the install root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationState {
    pub install_root: PathBuf,
    /// The install root exists as a directory
    pub exists: bool,
    /// The environment file exists in it
    pub has_config: bool,
    /// The install root is a git checkout
    pub has_checkout: bool,
}

impl InstallationState {
    pub fn probe(config: &InstallerConfig) -> Self {
        let root = &config.install_root;
        let exists = root.is_dir();
        Self {
            install_root: root.clone(),
            exists,
            has_config: exists && config.env_file().is_file(),
            has_checkout: exists && root.join(".git").exists(),
        }
    }
}
