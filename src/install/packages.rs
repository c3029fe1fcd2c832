//! System package installation through the Termux package manager
//!
//! Packages are processed in table order. A package that is already present
//! is never reinstalled. Required failures are collected and reported
//! together once every package has been attempted.

use std::path::PathBuf;

use crate::install::core::{CommandSpec, InstallContext};
use crate::install::error::{
    InstallError, InstallWarning, StepOutcome, StepResult, WarningKind,
};
use crate::install::output;

/// One system package the manager depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencySpec {
    pub package_id: &'static str,
    pub display_name: &'static str,
    pub required: bool,
    /// What the manager loses when an optional package is missing
    pub feature: Option<&'static str>,
}

/// Installation order matters: java last among the required set because it
/// is by far the largest download.
pub const DEPENDENCIES: &[DependencySpec] = &[
    DependencySpec {
        package_id: "python",
        display_name: "Python",
        required: true,
        feature: None,
    },
    DependencySpec {
        package_id: "git",
        display_name: "Git",
        required: true,
        feature: None,
    },
    DependencySpec {
        package_id: "openjdk-17",
        display_name: "Java 17",
        required: true,
        feature: None,
    },
    DependencySpec {
        package_id: "proot",
        display_name: "proot",
        required: false,
        feature: Some("the playit.gg tunnel (termux-chroot)"),
    },
    DependencySpec {
        package_id: "termux-api",
        display_name: "Termux:API",
        required: false,
        feature: Some("battery monitoring"),
    },
];

/// Outcome of installing a single package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStatus {
    AlreadyPresent,
    Installed,
    Failed,
}

/// Package presence check (`dpkg -s`)
pub async fn is_installed(ctx: &InstallContext, spec: &DependencySpec) -> bool {
    ctx.probe(CommandSpec::new("dpkg", ["-s", spec.package_id]))
        .await
        .success()
}

/// Install one package unless it is already present
pub async fn install(
    ctx: &InstallContext,
    spec: &DependencySpec,
) -> Result<PackageStatus, InstallError> {
    if is_installed(ctx, spec).await {
        output::skip(&format!("{} already installed", spec.display_name));
        return Ok(PackageStatus::AlreadyPresent);
    }

    let command =
        CommandSpec::new("pkg", ["install", "-y", spec.package_id]).log_to(package_log(ctx, spec));
    let status = ctx
        .run_tracked(&format!("Installing {}...", spec.display_name), command)
        .await?;

    if status.success() {
        output::success(&format!("{} installed", spec.display_name));
        Ok(PackageStatus::Installed)
    } else {
        log::warn!("pkg install {} exited with {:?}", spec.package_id, status.code);
        Ok(PackageStatus::Failed)
    }
}

/// Where `pkg install` output for `spec` is captured
pub fn package_log(ctx: &InstallContext, spec: &DependencySpec) -> PathBuf {
    ctx.config.step_log(&format!("pkg-{}", spec.package_id))
}

/// Refresh the package index, then install every entry of [`DEPENDENCIES`]
pub async fn install_all(ctx: &InstallContext) -> StepResult {
    let mut warnings = Vec::new();

    let refresh =
        CommandSpec::new("pkg", ["update", "-y"]).log_to(ctx.config.step_log("pkg-update"));
    let status = ctx.run_tracked("Updating package lists...", refresh).await?;
    if status.success() {
        output::success("Package lists updated");
    } else {
        output::warning("Could not refresh package lists; continuing with cached lists");
        warnings.push(InstallWarning::new(
            WarningKind::RepositoryRefresh,
            "package list refresh failed; installed versions may be outdated",
        ));
    }

    let mut failed = Vec::new();
    let mut logs = Vec::new();
    for spec in DEPENDENCIES {
        if install(ctx, spec).await? != PackageStatus::Failed {
            continue;
        }
        if spec.required {
            output::error(&format!("{} failed to install", spec.display_name));
            failed.push(spec.display_name.to_string());
            logs.push(package_log(ctx, spec));
        } else {
            let feature = spec.feature.unwrap_or("an optional feature");
            output::warning(&format!(
                "{} failed to install; {feature} will be unavailable",
                spec.display_name
            ));
            warnings.push(InstallWarning::new(
                WarningKind::OptionalDependency,
                format!(
                    "{} not installed: {feature} unavailable (see {})",
                    spec.display_name,
                    package_log(ctx, spec).display()
                ),
            ));
        }
    }

    if !failed.is_empty() {
        return Err(InstallError::RequiredDependencies { failed, logs });
    }
    Ok(StepOutcome::from_warnings(warnings))
}
