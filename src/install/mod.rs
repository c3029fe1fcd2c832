//! MC Server Termux installer
//!
//! Prepares a Termux sandbox to run the MC Server Termux manager: validates
//! the host, installs system and Python dependencies, fetches the project and
//! its helper binaries, then bootstraps configuration and a launch shortcut.

pub mod binaries;
pub mod bootstrap;
pub mod core;
pub mod detection;
pub mod download;
pub mod environment;
pub mod error;
pub mod existing;
pub mod launcher;
pub mod orchestration;
pub mod output;
pub mod packages;
pub mod project;
pub mod pydeps;
pub mod runners;
pub mod space;
pub mod wizard;

// Public exports
pub use self::core::InstallContext;
pub use detection::InstallationState;
pub use error::{
    HaltReason, InstallError, InstallWarning, StepOutcome, StepResult, WarningKind,
};
pub use orchestration::{Completion, InstallPhase, InstallReport, Orchestrator};
pub use runners::{RunOptions, run_install, run_with_context, run_with_interrupt};
