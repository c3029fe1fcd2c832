//! Top-level installer run
//!
//! Builds the context, races the pipeline against interrupt signals, reports
//! the outcome and finally hands the terminal over to the installed manager.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::Cli;
use crate::config::{InstallerConfig, MARKER_FILE};
use crate::install::core::InstallContext;
use crate::install::error::{InstallError, InstallWarning, WarningKind};
use crate::install::orchestration::{Completion, InstallReport, Orchestrator};
use crate::install::{output, wizard};

/// What happens after a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Offer to start the manager
    pub launch: bool,
    /// Installer executable to delete once the run has completed
    pub remove_installer: Option<PathBuf>,
}

impl From<&Cli> for RunOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            launch: !cli.no_launch,
            remove_installer: cli.remove_installer.then(installer_path).flatten(),
        }
    }
}

fn installer_path() -> Option<PathBuf> {
    match std::env::current_exe() {
        Ok(path) => Some(path),
        Err(e) => {
            output::warning(&format!("Cannot locate the installer to remove it: {e}"));
            None
        }
    }
}

/// Resolve configuration from the command line and run the installer.
/// Returns the process exit status.
pub async fn run_install(cli: &Cli) -> Result<i32> {
    let config = resolve_config(cli)?;
    let ctx = InstallContext::system(config);
    Ok(run_with_context(ctx, RunOptions::from(cli)).await)
}

/// Defaults, then the optional TOML file, then command-line overrides
pub fn resolve_config(cli: &Cli) -> Result<InstallerConfig> {
    let mut config = InstallerConfig::load(cli.config.as_deref())?;
    if let Some(root) = &cli.install_root {
        config.install_root = root.clone();
    }
    config.debug |= cli.debug;
    Ok(config)
}

/// Run the pipeline with an explicit context, aborting on SIGINT or SIGTERM
pub async fn run_with_context(ctx: InstallContext, options: RunOptions) -> i32 {
    run_with_interrupt(ctx, options, interrupted()).await
}

/// Run the pipeline until it finishes or `interrupt` resolves. An interrupt
/// wins over any step still in flight, including an open prompt.
pub async fn run_with_interrupt<F>(ctx: InstallContext, options: RunOptions, interrupt: F) -> i32
where
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    wizard::show_welcome(&ctx.config);

    let result = tokio::select! {
        biased;
        () = &mut interrupt => Err(InstallError::Interrupted),
        result = Orchestrator::new(ctx.clone()).run() => result,
    };
    let mut report = match result {
        Ok(report) => report,
        Err(e) => {
            report_failure(&e);
            return e.exit_code();
        }
    };
    if let Completion::Halted(reason) = &report.completion {
        output::info(&reason.to_string());
        return 0;
    }

    // Removal runs first: the hand-off replaces this process
    if let Some(installer) = &options.remove_installer {
        remove_installer(installer, &mut report);
    }
    wizard::show_completion(&ctx.config, &report);
    if !options.launch {
        return 0;
    }

    let answer = tokio::select! {
        biased;
        () = &mut interrupt => Err(InstallError::Interrupted),
        answer = ctx.confirm("Launch MC Server Termux now?", true) => answer,
    };
    match answer {
        Ok(true) => {
            let e = hand_off(&ctx.config);
            output::warning(&e.to_string());
            output::info(&format!("Start it later with '{}'", ctx.config.shortcut_name));
            0
        }
        Ok(false) => {
            output::info(&format!("Start it later with '{}'", ctx.config.shortcut_name));
            0
        }
        Err(e) => {
            report_failure(&e);
            e.exit_code()
        }
    }
}

fn report_failure(e: &InstallError) {
    output::error(&e.to_string());
    if let Some(hint) = e.hint() {
        output::info(hint);
    }
    for log in e.log_locations() {
        output::info(&format!("Details: {}", log.display()));
    }
}

/// Resolves on SIGINT or SIGTERM. Never resolves if no handler can be installed.
async fn interrupted() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if result.is_err() {
                            term.recv().await;
                        }
                    }
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                log::warn!("SIGTERM handler unavailable: {e}");
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn remove_installer(installer: &Path, report: &mut InstallReport) {
    log::debug!("removing installer {}", installer.display());
    if let Err(e) = std::fs::remove_file(installer) {
        report.warnings.push(InstallWarning::new(
            WarningKind::InstallerCleanup,
            format!("could not remove the installer {}: {e}", installer.display()),
        ));
    }
}

/// Replace this process with `python main.py` in the install root.
/// Only returns on failure.
fn hand_off(config: &InstallerConfig) -> InstallError {
    let python = match which::which(&config.python) {
        Ok(path) => path,
        Err(e) => return InstallError::HandOff(format!("{} not found: {e}", config.python)),
    };
    if let Err(e) = std::env::set_current_dir(&config.install_root) {
        return InstallError::io(
            format!("Failed to enter {}", config.install_root.display()),
            e,
        );
    }
    log::debug!("exec {} {MARKER_FILE}", python.display());
    let err = exec::Command::new(&python).arg(MARKER_FILE).exec();
    InstallError::HandOff(format!("{}: {err}", python.display()))
}
