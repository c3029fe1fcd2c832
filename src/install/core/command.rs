//! External command execution
//!
//! Every package-manager, git, pip and Termux helper invocation goes through
//! [`CommandRunner`]. Output of a command is never kept in memory: it is
//! written to the per-step log file named in its [`CommandSpec`].

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use super::async_task::AsyncTask;

/// A command line plus where its diagnostic output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub log: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            log: None,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn log_to(mut self, log: impl Into<PathBuf>) -> Self {
        self.log = Some(log.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit status of a finished command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub code: Option<i32>,
}

impl CommandStatus {
    pub const SUCCESS: Self = Self { code: Some(0) };
    pub const FAILURE: Self = Self { code: Some(1) };

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Seam over process spawning
pub trait CommandRunner: Send + Sync {
    /// Start `spec`; the returned task resolves when the process exits.
    /// Failing to launch the program at all is an `Err`.
    fn run(&self, spec: CommandSpec) -> AsyncTask<std::io::Result<CommandStatus>>;
}

/// Runs real processes with tokio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: CommandSpec) -> AsyncTask<std::io::Result<CommandStatus>> {
        AsyncTask::from_future(async move {
            let mut cmd = tokio::process::Command::new(&spec.program);
            cmd.args(&spec.args)
                .stdin(Stdio::null())
                .kill_on_drop(true);
            if let Some(dir) = &spec.cwd {
                cmd.current_dir(dir);
            }

            match &spec.log {
                Some(path) => {
                    let file = open_step_log(path, &spec)?;
                    cmd.stdout(file.try_clone()?).stderr(file);
                }
                None => {
                    cmd.stdout(Stdio::null()).stderr(Stdio::null());
                }
            }

            log::debug!("running: {spec}");
            let status = cmd.status().await?;
            log::debug!("{} exited with {:?}", spec.program, status.code());
            Ok(CommandStatus {
                code: status.code(),
            })
        })
    }
}

/// Create (truncate) a step log and write its header line
fn open_step_log(path: &Path, spec: &CommandSpec) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    writeln!(
        file,
        "# {} $ {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        spec
    )?;
    Ok(file)
}
