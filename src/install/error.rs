//! Installer error taxonomy and step outcomes
//!
//! Every pipeline step returns [`StepResult`]. `Err` is always fatal and aborts
//! the run with exit status 1. Recoverable situations are not errors: they are
//! reported as [`StepOutcome::Degraded`] warnings, or as a [`StepOutcome::Halt`]
//! when the user chose to stop, which exits cleanly.

use std::fmt;
use std::path::PathBuf;
use std::slice;

use thiserror::Error;

/// Fatal installer errors
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("unsupported host: {reason}")]
    HostIncompatible { reason: String },

    #[error("storage permission was not granted")]
    PermissionDenied,

    #[error("no internet connection (could not reach {target})")]
    Connectivity { target: String },

    #[error("required dependencies failed to install: {}", failed.join(", "))]
    RequiredDependencies { failed: Vec<String>, logs: Vec<PathBuf> },

    #[error("project fetch did not produce {}", marker.display())]
    FetchValidation { marker: PathBuf, log: PathBuf },

    #[error("dependency manifest not found: {}", path.display())]
    ManifestMissing { path: PathBuf },

    #[error("{step} failed")]
    DependencyInstall { step: String, log: PathBuf },

    #[error("invalid choice: '{input}'")]
    InvalidChoice { input: String },

    #[error("installation interrupted")]
    Interrupted,

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Task(String),

    #[error("could not start the manager: {0}")]
    HandOff(String),
}

impl InstallError {
    /// Wrap an I/O error with a description of what was being attempted
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit status for this failure
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Files holding the captured diagnostic output, if any
    pub fn log_locations(&self) -> &[PathBuf] {
        match self {
            Self::RequiredDependencies { logs, .. } => logs,
            Self::FetchValidation { log, .. } | Self::DependencyInstall { log, .. } => {
                slice::from_ref(log)
            }
            _ => &[],
        }
    }

    /// Corrective hint shown under the error message
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::HostIncompatible { .. } => {
                Some("Run this installer inside the Termux app (F-Droid or GitHub build).")
            }
            Self::PermissionDenied => {
                Some("Run 'termux-setup-storage', accept the Android dialog, then retry.")
            }
            Self::Connectivity { .. } => Some("Check your Wi-Fi or mobile data and retry."),
            Self::RequiredDependencies { .. } => {
                Some("Try 'pkg update && pkg upgrade' and run the installer again.")
            }
            Self::FetchValidation { .. } => {
                Some("The download may have been cut short; re-run the installer.")
            }
            Self::InvalidChoice { .. } => Some("Answer 1 (update), 2 (reinstall) or 3 (cancel)."),
            _ => None,
        }
    }
}

/// Kinds of non-fatal problems recorded for the end-of-run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    ResourceLow,
    RepositoryRefresh,
    OptionalDependency,
    UnsupportedArchitecture,
    HelperDownload,
    ProjectUpdate,
    ConfigMissing,
    StaleBackup,
    InstallerCleanup,
}

/// A recorded warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl InstallWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for InstallWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Why the user stopped the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// Declined to continue with low free space
    LowSpaceDeclined,
    /// Chose CANCEL at the existing-installation prompt
    Cancelled,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowSpaceDeclined => f.write_str("installation cancelled: not enough free space"),
            Self::Cancelled => f.write_str("installation cancelled by user"),
        }
    }
}

/// Non-fatal result of a pipeline step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Degraded(Vec<InstallWarning>),
    Halt(HaltReason),
}

impl StepOutcome {
    /// `Success` when no warnings were collected, `Degraded` otherwise
    pub fn from_warnings(warnings: Vec<InstallWarning>) -> Self {
        if warnings.is_empty() {
            Self::Success
        } else {
            Self::Degraded(warnings)
        }
    }

    pub fn warnings(&self) -> &[InstallWarning] {
        match self {
            Self::Degraded(warnings) => warnings,
            _ => &[],
        }
    }
}

pub type StepResult = Result<StepOutcome, InstallError>;
