//! Project checkout: fresh clone or in-place update
//!
//! A fetch only counts when the marker file exists afterwards; the exit
//! status of git alone is never trusted.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::install::core::{CommandSpec, InstallContext};
use crate::install::detection::InstallationState;
use crate::install::error::{InstallError, InstallWarning, StepOutcome, StepResult, WarningKind};
use crate::install::output;

pub async fn fetch(ctx: &InstallContext) -> StepResult {
    let root = ctx.config.install_root.clone();
    output::debug(
        ctx.config.debug,
        &format!("fetching {} into {}", ctx.config.repo_url, root.display()),
    );

    let state = InstallationState::probe(&ctx.config);
    if state.has_checkout {
        update_checkout(ctx, &root).await
    } else if state.exists {
        merge_fresh_checkout(ctx, &root).await
    } else {
        clone_into(ctx, &root).await
    }
}

async fn update_checkout(ctx: &InstallContext, root: &Path) -> StepResult {
    let log = ctx.config.step_log("git-fetch");
    let spec = CommandSpec::new("git", ["pull", "--ff-only"])
        .current_dir(root)
        .log_to(&log);
    let status = ctx.run_tracked("Updating MC Server Termux...", spec).await?;

    let marker = ctx.config.marker_file();
    if !marker.is_file() {
        return Err(InstallError::FetchValidation { marker, log });
    }
    if status.success() {
        output::success("Project updated");
        return Ok(StepOutcome::Success);
    }

    output::warning("Update failed; keeping the version already installed");
    Ok(StepOutcome::Degraded(vec![InstallWarning::new(
        WarningKind::ProjectUpdate,
        format!(
            "could not update the project, the previous version is still in place (see {})",
            log.display()
        ),
    )]))
}

async fn clone_into(ctx: &InstallContext, root: &Path) -> StepResult {
    let log = ctx.config.step_log("git-fetch");
    if let Some(parent) = root.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| InstallError::io(format!("Failed to create {}", parent.display()), e))?;
    }
    let status = ctx
        .run_tracked("Downloading MC Server Termux...", clone_spec(ctx, root, &log))
        .await?;

    let marker = ctx.config.marker_file();
    if !status.success() || !marker.is_file() {
        log::warn!("git clone exited with {:?}", status.code);
        return Err(InstallError::FetchValidation { marker, log });
    }
    output::success("Project downloaded");
    Ok(StepOutcome::Success)
}

/// The root exists but is not a checkout: clone next to it, validate the
/// clone, then copy it over the existing tree. Files only present in the
/// old tree (user data) are kept.
async fn merge_fresh_checkout(ctx: &InstallContext, root: &Path) -> StepResult {
    let log = ctx.config.step_log("git-fetch");
    let parent = root.parent().unwrap_or(Path::new("."));
    let staging = tempfile::Builder::new()
        .prefix(".mcst-checkout-")
        .tempdir_in(parent)
        .map_err(|e| InstallError::io("Failed to create staging directory", e))?;
    let checkout = staging.path().join("checkout");

    let status = ctx
        .run_tracked("Downloading MC Server Termux...", clone_spec(ctx, &checkout, &log))
        .await?;
    let staged_marker = checkout.join(crate::config::MARKER_FILE);
    if !status.success() || !staged_marker.is_file() {
        return Err(InstallError::FetchValidation {
            marker: ctx.config.marker_file(),
            log,
        });
    }

    copy_tree(&checkout, root)
        .map_err(|e| InstallError::io(format!("Failed to update {}", root.display()), e))?;

    let marker = ctx.config.marker_file();
    if !marker.is_file() {
        return Err(InstallError::FetchValidation { marker, log });
    }
    output::success("Project downloaded");
    Ok(StepOutcome::Success)
}

fn clone_spec(ctx: &InstallContext, dest: &Path, log: &Path) -> CommandSpec {
    CommandSpec::new(
        "git",
        [
            "clone".to_string(),
            "--depth".to_string(),
            "1".to_string(),
            ctx.config.repo_url.clone(),
            dest.to_string_lossy().into_owned(),
        ],
    )
    .log_to(log)
}

/// Copy every entry of `from` into `to`, overwriting files that exist in both
fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry.map_err(std::io::Error::other)?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if target.is_dir() {
                fs::remove_dir_all(&target)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
