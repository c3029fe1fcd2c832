//! Installation orchestration
//!
//! Runs every step strictly in order. A fatal step error aborts the run at
//! once; warnings are collected for the completion summary; a halt is a
//! clean, user-chosen stop.

use crate::install::core::InstallContext;
use crate::install::download;
use crate::install::error::{HaltReason, InstallError, InstallWarning, StepOutcome, StepResult};
use crate::install::{bootstrap, environment, existing, launcher, output, packages, project, pydeps};

/// Orchestrator states, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    Start,
    Validating,
    InstallingDeps,
    HandlingExisting,
    FetchingProject,
    InstallingPydeps,
    FetchingBinaries,
    BootstrappingConfig,
    Done,
    Aborted,
}

impl InstallPhase {
    /// Number of phases that run a step
    pub const STEP_COUNT: usize = 7;

    /// Successor on a non-fatal outcome. Terminal states are fixed points.
    pub fn next(self) -> Self {
        match self {
            Self::Start => Self::Validating,
            Self::Validating => Self::InstallingDeps,
            Self::InstallingDeps => Self::HandlingExisting,
            Self::HandlingExisting => Self::FetchingProject,
            Self::FetchingProject => Self::InstallingPydeps,
            Self::InstallingPydeps => Self::FetchingBinaries,
            Self::FetchingBinaries => Self::BootstrappingConfig,
            Self::BootstrappingConfig | Self::Done => Self::Done,
            Self::Aborted => Self::Aborted,
        }
    }

    /// 1-based position among the step phases
    pub fn ordinal(self) -> Option<usize> {
        match self {
            Self::Validating => Some(1),
            Self::InstallingDeps => Some(2),
            Self::HandlingExisting => Some(3),
            Self::FetchingProject => Some(4),
            Self::InstallingPydeps => Some(5),
            Self::FetchingBinaries => Some(6),
            Self::BootstrappingConfig => Some(7),
            Self::Start | Self::Done | Self::Aborted => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Start => "Starting",
            Self::Validating => "Checking the environment",
            Self::InstallingDeps => "Installing system packages",
            Self::HandlingExisting => "Looking for a previous installation",
            Self::FetchingProject => "Downloading MC Server Termux",
            Self::InstallingPydeps => "Installing Python dependencies",
            Self::FetchingBinaries => "Installing helper binaries",
            Self::BootstrappingConfig => "Configuring",
            Self::Done => "Done",
            Self::Aborted => "Aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// How a run that did not fail ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Completed,
    Halted(HaltReason),
}

/// Result of a run that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// `Done` when completed, otherwise the phase the user stopped in
    pub phase: InstallPhase,
    pub completion: Completion,
    pub warnings: Vec<InstallWarning>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Completed
    }
}

/// Installation state machine
pub struct Orchestrator {
    ctx: InstallContext,
    phase: InstallPhase,
    warnings: Vec<InstallWarning>,
}

impl Orchestrator {
    pub fn new(ctx: InstallContext) -> Self {
        Self {
            ctx,
            phase: InstallPhase::Start,
            warnings: Vec::new(),
        }
    }

    /// Drive the pipeline to `Done`, a halt, or the first fatal error
    pub async fn run(mut self) -> Result<InstallReport, InstallError> {
        let config = &self.ctx.config;
        output::debug(config.debug, &format!("install root: {}", config.install_root.display()));
        output::debug(config.debug, &format!("log directory: {}", config.log_dir.display()));
        output::debug(config.debug, &format!("backup path: {}", config.backup_path.display()));
        output::debug(config.debug, &format!("shell profile: {}", config.shell_profile.display()));

        loop {
            let next = self.phase.next();
            if next.is_terminal() {
                self.phase = next;
                break;
            }
            self.enter(next);

            let outcome = self.run_phase(next).await;
            match outcome {
                Ok(StepOutcome::Success) => {}
                Ok(StepOutcome::Degraded(warnings)) => {
                    for warning in &warnings {
                        log::warn!("{:?}: {}", warning.kind, warning.message);
                    }
                    self.warnings.extend(warnings);
                }
                Ok(StepOutcome::Halt(reason)) => {
                    log::info!("halted in {next:?}: {reason}");
                    return Ok(self.report(Completion::Halted(reason)));
                }
                Err(e) => {
                    log::error!("aborted in {next:?}: {e}");
                    self.phase = InstallPhase::Aborted;
                    return Err(e);
                }
            }
        }

        Ok(self.report(Completion::Completed))
    }

    fn enter(&mut self, phase: InstallPhase) {
        self.phase = phase;
        let title = match phase.ordinal() {
            Some(n) => format!("[{n}/{}] {}", InstallPhase::STEP_COUNT, phase.title()),
            None => phase.title().to_string(),
        };
        output::phase(&title);
        output::debug(self.ctx.config.debug, &format!("phase -> {phase:?}"));
    }

    async fn run_phase(&self, phase: InstallPhase) -> StepResult {
        let ctx = &self.ctx;
        match phase {
            InstallPhase::Validating => environment::validate(ctx).await,
            InstallPhase::InstallingDeps => packages::install_all(ctx).await,
            InstallPhase::HandlingExisting => existing::handle(ctx).await,
            InstallPhase::FetchingProject => project::fetch(ctx).await,
            InstallPhase::InstallingPydeps => pydeps::install(ctx).await,
            InstallPhase::FetchingBinaries => download::fetch_helpers(ctx).await,
            InstallPhase::BootstrappingConfig => {
                let mut warnings = bootstrap::bootstrap(ctx)?.warnings().to_vec();
                warnings.extend_from_slice(launcher::install_shortcut(ctx)?.warnings());
                Ok(StepOutcome::from_warnings(warnings))
            }
            InstallPhase::Start | InstallPhase::Done | InstallPhase::Aborted => {
                Ok(StepOutcome::Success)
            }
        }
    }

    fn report(self, completion: Completion) -> InstallReport {
        InstallReport {
            phase: self.phase,
            completion,
            warnings: self.warnings,
        }
    }
}
