//! Handling of a prior installation at the install root

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::InstallerConfig;
use crate::install::core::InstallContext;
use crate::install::detection::InstallationState;
use crate::install::error::{
    HaltReason, InstallError, InstallWarning, StepOutcome, StepResult, WarningKind,
};
use crate::install::output;

/// What to do with an existing installation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallDecision {
    /// Keep the tree, refresh it, carry the configuration over
    Update,
    /// Delete the tree and install from scratch
    Reinstall,
    Cancel,
}

impl InstallDecision {
    /// Parse a menu answer. An empty answer selects the default, `Update`.
    pub fn parse(input: &str) -> Result<Self, InstallError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "" | "1" | "update" | "u" => Ok(Self::Update),
            "2" | "reinstall" | "r" => Ok(Self::Reinstall),
            "3" | "cancel" | "c" => Ok(Self::Cancel),
            _ => Err(InstallError::InvalidChoice {
                input: input.trim().to_string(),
            }),
        }
    }
}

/// The side-channel copy of `.env` held between detection and bootstrap.
/// At most one exists at a time; restoring consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    path: PathBuf,
}

impl BackupConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_config(config: &InstallerConfig) -> Self {
        Self::new(&config.backup_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Move `source` into the backup slot. Returns `true` when a stale
    /// backup was replaced. The stale backup survives if the move fails.
    pub fn stash(&self, source: &Path) -> io::Result<bool> {
        let stale = self.exists();
        move_file(source, &self.path)?;
        Ok(stale)
    }

    /// Move the backup to `dest`, consuming it
    pub fn restore(&self, dest: &Path) -> io::Result<()> {
        move_file(&self.path, dest)
    }

    /// Drop the backup without restoring it
    pub fn discard(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Rename over `to`. Across filesystems the bytes are copied next to `to`
/// first, so `to` is only replaced by a complete file.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    let mut staged = to.as_os_str().to_owned();
    staged.push(".partial");
    let staged = PathBuf::from(staged);
    if let Err(e) = fs::copy(from, &staged).and_then(|_| fs::rename(&staged, to)) {
        let _ = fs::remove_file(&staged);
        return Err(e);
    }
    fs::remove_file(from)
}

/// Ask what to do with an existing installation and carry it out
pub async fn handle(ctx: &InstallContext) -> StepResult {
    let state = InstallationState::probe(&ctx.config);
    output::debug(ctx.config.debug, &format!("installation state: {state:?}"));
    if !state.exists {
        output::step(&format!("No previous installation at {}", state.install_root.display()));
        return Ok(StepOutcome::Success);
    }

    output::warning(&format!(
        "An installation already exists at {}",
        state.install_root.display()
    ));
    output::info("1) Update    - keep your configuration and refresh the files");
    output::info("2) Reinstall - delete everything and start over");
    output::info("3) Cancel");
    let answer = ctx.input("Choose an option [1-3]:", "1").await?;
    let decision = InstallDecision::parse(&answer)?;
    log::debug!("existing installation decision: {decision:?}");

    let backup = BackupConfig::for_config(&ctx.config);
    match decision {
        InstallDecision::Update => update(ctx, &state, &backup),
        InstallDecision::Reinstall => reinstall(ctx, &state, &backup),
        InstallDecision::Cancel => Ok(StepOutcome::Halt(HaltReason::Cancelled)),
    }
}

fn update(ctx: &InstallContext, state: &InstallationState, backup: &BackupConfig) -> StepResult {
    if !state.has_config {
        // A backup left by an interrupted run is restored later by bootstrap
        output::step("No configuration to preserve");
        return Ok(StepOutcome::Success);
    }

    let env_file = ctx.config.env_file();
    let stale = backup
        .stash(&env_file)
        .map_err(|e| InstallError::io("Failed to back up configuration", e))?;
    output::debug(
        ctx.config.debug,
        &format!("configuration moved to {}", backup.path().display()),
    );
    output::success("Configuration backed up");

    if stale {
        output::warning("Replaced a configuration backup left by an earlier run");
        return Ok(StepOutcome::Degraded(vec![InstallWarning::new(
            WarningKind::StaleBackup,
            format!(
                "a stale configuration backup at {} was replaced",
                backup.path().display()
            ),
        )]));
    }
    Ok(StepOutcome::Success)
}

fn reinstall(ctx: &InstallContext, state: &InstallationState, backup: &BackupConfig) -> StepResult {
    output::step(&format!("Removing {}...", state.install_root.display()));
    fs::remove_dir_all(&state.install_root).map_err(|e| {
        InstallError::io(
            format!("Failed to remove {}", state.install_root.display()),
            e,
        )
    })?;
    // Nothing from the old installation survives, including an orphaned backup
    backup
        .discard()
        .map_err(|e| InstallError::io("Failed to remove old configuration backup", e))?;
    output::debug(ctx.config.debug, "previous installation removed");
    output::success("Previous installation removed");
    Ok(StepOutcome::Success)
}
