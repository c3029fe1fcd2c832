//! Host environment validation
//!
//! Four checks run strictly in order: sandbox identity, storage permission,
//! connectivity, free space. The first three are fatal on failure; low free
//! space only asks the user whether to go on.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;

use crate::config::InstallerConfig;
use crate::install::core::{AsyncTask, CommandSpec, InstallContext};
use crate::install::error::{
    HaltReason, InstallError, InstallWarning, StepOutcome, StepResult, WarningKind,
};
use crate::install::output;
use crate::install::space::{SpaceMeasurement, SpaceReading};

/// Seam over host facts the validator needs
pub trait HostProbe: Send + Sync {
    /// Running inside the Termux app sandbox
    fn is_sandbox(&self) -> bool;

    /// Shared storage access has been granted
    fn storage_granted(&self) -> bool;

    /// Raw CPU architecture identifier (`uname -m`)
    fn architecture(&self) -> AsyncTask<String>;

    /// Free space in the home filesystem, if the host can report it
    fn free_space(&self) -> AsyncTask<Option<SpaceReading>>;

    /// Bounded reachability probe of `target` (`host:port`)
    fn reachable(&self, target: &str, timeout: Duration) -> AsyncTask<bool>;
}

/// The real Termux host
#[derive(Debug, Clone)]
pub struct TermuxHost {
    home: PathBuf,
    termux_version: Option<String>,
    prefix: Option<String>,
}

impl TermuxHost {
    /// Snapshot the sandbox markers from the process environment
    pub fn detect(config: &InstallerConfig) -> Self {
        Self {
            home: config.home_dir.clone(),
            termux_version: std::env::var("TERMUX_VERSION").ok(),
            prefix: std::env::var("PREFIX").ok(),
        }
    }

    async fn df(home: PathBuf, flag: &'static str) -> Option<String> {
        let output = Command::new("df").arg(flag).arg(&home).output().await.ok()?;
        if !output.status.success() {
            return None;
        }
        parse_df_available(&String::from_utf8_lossy(&output.stdout))
    }
}

impl HostProbe for TermuxHost {
    fn is_sandbox(&self) -> bool {
        self.termux_version.is_some()
            || self
                .prefix
                .as_deref()
                .is_some_and(|prefix| prefix.contains("com.termux"))
    }

    fn storage_granted(&self) -> bool {
        self.home.join("storage").is_dir()
    }

    fn architecture(&self) -> AsyncTask<String> {
        AsyncTask::from_future(async {
            Command::new("uname")
                .arg("-m")
                .output()
                .await
                .ok()
                .filter(|o| o.status.success())
                .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
                .filter(|arch| !arch.is_empty())
                .unwrap_or_else(|| std::env::consts::ARCH.to_string())
        })
    }

    fn free_space(&self) -> AsyncTask<Option<SpaceReading>> {
        let home = self.home.clone();
        AsyncTask::from_future(async move {
            if let Some(human) = Self::df(home.clone(), "-h").await {
                return Some(SpaceReading::human(human));
            }
            // Busybox-style df without -h: 1K blocks, integer arithmetic only
            Self::df(home, "-k")
                .await
                .and_then(|kb| kb.parse::<u64>().ok())
                .map(SpaceReading::kilobytes)
        })
    }

    fn reachable(&self, target: &str, timeout: Duration) -> AsyncTask<bool> {
        let target = target.to_string();
        AsyncTask::from_future(async move {
            matches!(
                tokio::time::timeout(timeout, tokio::net::TcpStream::connect(&target)).await,
                Ok(Ok(_))
            )
        })
    }
}

/// "Avail" column of the last `df` row. Counted from the end so that rows
/// wrapped after a long filesystem name still parse.
pub fn parse_df_available(output: &str) -> Option<String> {
    let line = output.lines().rev().find(|l| !l.trim().is_empty())?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 || fields[0] == "Filesystem" {
        return None;
    }
    Some(fields[fields.len() - 3].to_string())
}

/// Run all environment checks
pub async fn validate(ctx: &InstallContext) -> StepResult {
    check_sandbox(ctx)?;
    check_storage(ctx).await?;
    check_connectivity(ctx).await?;
    check_space(ctx).await
}

fn check_sandbox(ctx: &InstallContext) -> Result<(), InstallError> {
    output::step("Checking host environment...");
    if !ctx.host.is_sandbox() {
        return Err(InstallError::HostIncompatible {
            reason: "this installer only runs inside Termux".to_string(),
        });
    }
    output::success("Termux detected");
    Ok(())
}

async fn check_storage(ctx: &InstallContext) -> Result<(), InstallError> {
    output::step("Checking storage permission...");
    if ctx.host.storage_granted() {
        output::success("Storage access granted");
        return Ok(());
    }

    output::info("Requesting storage access; accept the Android permission dialog");
    let spec = CommandSpec::new("termux-setup-storage", Vec::<String>::new())
        .log_to(ctx.config.step_log("storage-grant"));
    let status = ctx.probe(spec).await;
    log::debug!("termux-setup-storage finished with {:?}", status.code);
    tokio::time::sleep(Duration::from_secs(ctx.config.storage_grant_wait_secs)).await;

    if !ctx.host.storage_granted() {
        return Err(InstallError::PermissionDenied);
    }
    output::success("Storage access granted");
    Ok(())
}

async fn check_connectivity(ctx: &InstallContext) -> Result<(), InstallError> {
    output::step("Checking internet connection...");
    let target = ctx.config.connectivity_probe.clone();
    let timeout = Duration::from_secs(ctx.config.connectivity_timeout_secs);
    if !ctx.host.reachable(&target, timeout).await {
        return Err(InstallError::Connectivity { target });
    }
    output::success("Internet connection available");
    Ok(())
}

async fn check_space(ctx: &InstallContext) -> StepResult {
    output::step("Checking free space...");
    let measurement = match ctx.host.free_space().await {
        Some(reading) => SpaceMeasurement::from_reading(&reading),
        None => SpaceMeasurement::parse(""),
    };
    output::debug(
        ctx.config.debug,
        &format!(
            "free space raw='{}' unit={:?} normalized_mb={:?}",
            measurement.raw.trim(),
            measurement.unit,
            measurement.normalized_mb
        ),
    );

    let threshold = ctx.config.min_free_mb;
    if measurement.is_sufficient(threshold) {
        output::success(&format!("Free space: {measurement}"));
        return Ok(StepOutcome::Success);
    }

    output::warning(&format!(
        "Only {measurement} free; at least {threshold} MB is recommended"
    ));
    if ctx.confirm("Continue anyway?", false).await? {
        Ok(StepOutcome::Degraded(vec![InstallWarning::new(
            WarningKind::ResourceLow,
            format!("installed with only {measurement} free (recommended {threshold} MB)"),
        )]))
    } else {
        Ok(StepOutcome::Halt(HaltReason::LowSpaceDeclined))
    }
}
