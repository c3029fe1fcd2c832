//! Shell shortcut in the user's profile

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use regex::Regex;

use crate::install::core::InstallContext;
use crate::install::error::{InstallError, StepOutcome, StepResult};
use crate::install::output;

/// `alias <name>='cd "<root>" && python main.py'`
pub fn shortcut_line(name: &str, root: &Path, python: &str) -> String {
    format!(
        "alias {name}='cd \"{}\" && {python} {}'",
        root.display(),
        crate::config::MARKER_FILE
    )
}

/// Drop every existing definition of `name` and append `line` once
pub fn rewrite_profile(content: &str, name: &str, line: &str) -> Result<String, regex::Error> {
    let pattern = Regex::new(&format!(r"^\s*alias\s+{}=", regex::escape(name)))?;

    let mut out: String = content
        .lines()
        .filter(|l| !pattern.is_match(l))
        .flat_map(|l| [l, "\n"])
        .collect();
    out.push_str(line);
    out.push('\n');
    Ok(out)
}

/// Install the launch shortcut
pub fn install_shortcut(ctx: &InstallContext) -> StepResult {
    let profile = &ctx.config.shell_profile;
    let name = &ctx.config.shortcut_name;

    let content = match fs::read_to_string(profile) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(InstallError::io(
                format!("Failed to read {}", profile.display()),
                e,
            ));
        }
    };

    let line = shortcut_line(name, &ctx.config.install_root, &ctx.config.python);
    output::debug(ctx.config.debug, &format!("{} <- {line}", profile.display()));

    if let Some(parent) = profile.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| InstallError::io(format!("Failed to create {}", parent.display()), e))?;
    }
    let rewritten = rewrite_profile(&content, name, &line)
        .map_err(|e| InstallError::io("Invalid shortcut name", io::Error::other(e)))?;
    replace_file(profile, &rewritten)
        .map_err(|e| InstallError::io(format!("Failed to write {}", profile.display()), e))?;

    output::success(&format!("Shortcut '{name}' added to {}", profile.display()));
    Ok(StepOutcome::Success)
}

/// Write `content` to a sibling temp file and rename it over `path`, so the
/// profile is either the old or the new version, never a truncated one.
/// A symlinked profile is written through to its target.
fn replace_file(path: &Path, content: &str) -> io::Result<()> {
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e),
    };
    let dir = target.parent().unwrap_or(Path::new("."));

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(content.as_bytes())?;
    staged.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(&target) {
        staged.as_file().set_permissions(metadata.permissions())?;
    }
    staged.persist(&target).map_err(|e| e.error)?;
    Ok(())
}
