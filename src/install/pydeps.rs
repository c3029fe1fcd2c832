//! Python dependencies of the fetched project

use crate::install::core::{CommandSpec, InstallContext};
use crate::install::error::{InstallError, StepOutcome, StepResult};
use crate::install::output;

/// Upgrade pip, then install the project's requirements. Any failure is fatal.
pub async fn install(ctx: &InstallContext) -> StepResult {
    let manifest = ctx.config.manifest_file();
    if !manifest.is_file() {
        return Err(InstallError::ManifestMissing { path: manifest });
    }

    let python = ctx.config.python.as_str();
    let log = ctx.config.step_log("pip");

    let upgrade = CommandSpec::new(python, ["-m", "pip", "install", "--upgrade", "pip"])
        .current_dir(&ctx.config.install_root)
        .log_to(ctx.config.step_log("pip-upgrade"));
    let status = ctx.run_tracked("Upgrading pip...", upgrade).await?;
    if !status.success() {
        return Err(InstallError::DependencyInstall {
            step: "pip upgrade".to_string(),
            log: ctx.config.step_log("pip-upgrade"),
        });
    }

    let requirements = CommandSpec::new(
        python,
        [
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
            "-r".to_string(),
            manifest.to_string_lossy().into_owned(),
        ],
    )
    .current_dir(&ctx.config.install_root)
    .log_to(&log);
    let status = ctx
        .run_tracked("Installing Python dependencies...", requirements)
        .await?;
    if !status.success() {
        return Err(InstallError::DependencyInstall {
            step: "Python dependency installation".to_string(),
            log,
        });
    }

    output::success("Python dependencies installed");
    Ok(StepOutcome::Success)
}
