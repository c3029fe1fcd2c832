//! Installation context: configuration plus the collaborators every step uses

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::async_task::{AsyncTask, TaskHandle};
use super::command::{CommandRunner, CommandSpec, CommandStatus, SystemRunner};
use super::progress;
use crate::config::InstallerConfig;
use crate::install::download::{Downloader, HttpDownloader};
use crate::install::environment::{HostProbe, TermuxHost};
use crate::install::error::InstallError;
use crate::install::wizard::{InquirePrompter, Prompter};

/// Installation context
///
/// Built once by the runner and shared read-only by every step.
#[derive(Clone)]
pub struct InstallContext {
    pub config: Arc<InstallerConfig>,
    pub runner: Arc<dyn CommandRunner>,
    pub host: Arc<dyn HostProbe>,
    pub downloader: Arc<dyn Downloader>,
    pub prompter: Arc<dyn Prompter>,
}

impl InstallContext {
    pub fn new(
        config: InstallerConfig,
        runner: Arc<dyn CommandRunner>,
        host: Arc<dyn HostProbe>,
        downloader: Arc<dyn Downloader>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            runner,
            host,
            downloader,
            prompter,
        }
    }

    /// Context wired to the real Termux host
    pub fn system(config: InstallerConfig) -> Self {
        let host = TermuxHost::detect(&config);
        Self::new(
            config,
            Arc::new(SystemRunner),
            Arc::new(host),
            Arc::new(HttpDownloader::default()),
            Arc::new(InquirePrompter),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms.max(1))
    }

    /// Run a quick command without a progress indicator.
    /// A program that cannot be launched counts as a failed run.
    pub async fn probe(&self, spec: CommandSpec) -> CommandStatus {
        let program = spec.program.clone();
        match self.runner.run(spec).await {
            Ok(status) => status,
            Err(e) => {
                log::debug!("could not launch {program}: {e}");
                CommandStatus { code: None }
            }
        }
    }

    /// Run a command as a background task while the spinner polls it
    pub async fn run_tracked(
        &self,
        message: &str,
        spec: CommandSpec,
    ) -> Result<CommandStatus, InstallError> {
        let program = spec.program.clone();
        let log = spec.log.clone();
        let handle = TaskHandle::spawn(self.runner.run(spec));
        match progress::track(message, handle, self.poll_interval()).await? {
            Ok(status) => Ok(status),
            Err(e) => {
                log::warn!("could not launch {program}: {e}");
                if let Some(log) = log {
                    note_launch_failure(&log, &program, &e);
                }
                Ok(CommandStatus { code: None })
            }
        }
    }

    /// Ask a yes/no question on the blocking pool so an interrupt can still
    /// abort the run while the user has not answered
    pub async fn confirm(&self, message: &str, default: bool) -> Result<bool, InstallError> {
        let prompter = Arc::clone(&self.prompter);
        let message = message.to_string();
        tokio::task::spawn_blocking(move || prompter.confirm(&message, default))
            .await
            .map_err(|e| InstallError::Task(e.to_string()))?
    }

    /// Free-text prompt, off the async thread like [`Self::confirm`]
    pub async fn input(&self, message: &str, default: &str) -> Result<String, InstallError> {
        let prompter = Arc::clone(&self.prompter);
        let message = message.to_string();
        let default = default.to_string();
        tokio::task::spawn_blocking(move || prompter.input(&message, &default))
            .await
            .map_err(|e| InstallError::Task(e.to_string()))?
    }

    /// Run any background task under the spinner
    pub async fn track<T: Send + 'static>(
        &self,
        message: &str,
        task: AsyncTask<T>,
    ) -> Result<T, InstallError> {
        progress::track(message, TaskHandle::spawn(task), self.poll_interval()).await
    }
}

/// Leave the launch error in the step log so it is found where the user is told to look
fn note_launch_failure(log: &Path, program: &str, error: &std::io::Error) {
    if let Some(parent) = log.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(log, format!("failed to launch {program}: {error}\n"));
}
