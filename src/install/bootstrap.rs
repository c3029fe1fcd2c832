//! Directory skeleton and configuration file resolution

use std::fs;

use crate::config::SUBDIRECTORIES;
use crate::install::core::InstallContext;
use crate::install::error::{InstallError, InstallWarning, StepOutcome, StepResult, WarningKind};
use crate::install::existing::BackupConfig;
use crate::install::output;

/// Where the configuration file came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Restored from the UPDATE backup
    Restored,
    /// Seeded from the template
    Template,
    /// Already present, left alone
    Existing,
    /// No template to seed from
    Missing,
}

/// Create the directory skeleton and resolve `.env`
pub fn bootstrap(ctx: &InstallContext) -> StepResult {
    let root = &ctx.config.install_root;
    for dir in SUBDIRECTORIES {
        let path = root.join(dir);
        fs::create_dir_all(&path)
            .map_err(|e| InstallError::io(format!("Failed to create {}", path.display()), e))?;
    }
    output::success("Directory structure ready");

    match resolve_config(ctx)? {
        ConfigSource::Restored => output::success("Previous configuration restored"),
        ConfigSource::Template => output::success("Configuration created from template"),
        ConfigSource::Existing => output::skip("Keeping existing configuration"),
        ConfigSource::Missing => {
            output::warning("No configuration template found; continuing without one");
            return Ok(StepOutcome::Degraded(vec![InstallWarning::new(
                WarningKind::ConfigMissing,
                format!(
                    "no {} template was found; create {} before starting the server",
                    crate::config::ENV_TEMPLATE,
                    ctx.config.env_file().display()
                ),
            )]));
        }
    }
    Ok(StepOutcome::Success)
}

/// Backup first, then template, then whatever is already there
pub fn resolve_config(ctx: &InstallContext) -> Result<ConfigSource, InstallError> {
    let env_file = ctx.config.env_file();
    let backup = BackupConfig::for_config(&ctx.config);

    if backup.exists() {
        backup
            .restore(&env_file)
            .map_err(|e| InstallError::io("Failed to restore configuration backup", e))?;
        return Ok(ConfigSource::Restored);
    }
    if env_file.exists() {
        return Ok(ConfigSource::Existing);
    }

    let template = ctx.config.env_template();
    if !template.is_file() {
        return Ok(ConfigSource::Missing);
    }
    fs::copy(&template, &env_file)
        .map_err(|e| InstallError::io(format!("Failed to create {}", env_file.display()), e))?;
    Ok(ConfigSource::Template)
}
