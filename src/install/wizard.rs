//! Interactive prompts and the welcome / completion screens

use std::io::{BufRead, IsTerminal, Write};

use inquire::error::InquireError;
use inquire::{Confirm, Text};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::config::InstallerConfig;
use crate::install::error::InstallError;
use crate::install::orchestration::InstallReport;

/// Seam over user interaction. Calls may block; the pipeline only reaches
/// them through [`InstallContext::confirm`] and [`InstallContext::input`],
/// which run them on the blocking pool.
///
/// [`InstallContext::confirm`]: crate::install::core::InstallContext::confirm
/// [`InstallContext::input`]: crate::install::core::InstallContext::input
pub trait Prompter: Send + Sync {
    /// Yes/no question
    fn confirm(&self, message: &str, default: bool) -> Result<bool, InstallError>;

    /// Free-text answer; an empty answer yields `default`
    fn input(&self, message: &str, default: &str) -> Result<String, InstallError>;
}

/// Terminal prompts through `inquire`; falls back to plain stdin lines when
/// stdin is not a terminal (e.g. `yes | mcst-install`).
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, InstallError> {
        if !std::io::stdin().is_terminal() {
            let hint = if default { "[Y/n]" } else { "[y/N]" };
            let answer = read_plain_line(&format!("{message} {hint}"))?;
            return Ok(parse_yes_no(&answer).unwrap_or(default));
        }
        match Confirm::new(message).with_default(default).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::OperationCanceled) => Ok(false),
            Err(e) => Err(map_inquire_error(e)),
        }
    }

    fn input(&self, message: &str, default: &str) -> Result<String, InstallError> {
        if !std::io::stdin().is_terminal() {
            let answer = read_plain_line(&format!("{message} [{default}]"))?;
            let answer = answer.trim();
            return Ok(if answer.is_empty() { default } else { answer }.to_string());
        }
        Text::new(message)
            .with_default(default)
            .prompt()
            .map_err(map_inquire_error)
    }
}

fn map_inquire_error(e: InquireError) -> InstallError {
    match e {
        InquireError::OperationInterrupted => InstallError::Interrupted,
        other => InstallError::Prompt(other.to_string()),
    }
}

fn read_plain_line(prompt: &str) -> Result<String, InstallError> {
    print!("{prompt} ");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| InstallError::io("Failed to read answer", e))?;
    Ok(line)
}

/// `Some(true)` for yes-like answers, `Some(false)` for no-like, `None` otherwise
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "s" | "si" | "sí" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

fn rule(stdout: &mut StandardStream) {
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
    let _ = writeln!(stdout, "{RULE}");
    let _ = stdout.reset();
}

/// Display welcome banner
pub fn show_welcome(config: &InstallerConfig) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    let _ = writeln!(stdout);
    rule(&mut stdout);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(stdout, "\n                  M C   S E R V E R   T E R M U X");
    let _ = stdout.reset();
    let _ = writeln!(stdout, "\n                       Installer v{}\n", config.version);
    rule(&mut stdout);

    let _ = writeln!(stdout, "\nThis will install:");
    let _ = writeln!(stdout, "  • Python, Git and Java 17 from the Termux repositories");
    let _ = writeln!(
        stdout,
        "  • The MC Server Termux manager into {}",
        config.install_root.display()
    );
    let _ = writeln!(stdout, "  • playit.gg tunnel agent and Filebrowser");
    let _ = writeln!(
        stdout,
        "  • A '{}' shortcut in {}\n",
        config.shortcut_name,
        config.shell_profile.display()
    );
    rule(&mut stdout);
}

/// Display installation completion summary
pub fn show_completion(config: &InstallerConfig, report: &InstallReport) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    let _ = writeln!(stdout);
    rule(&mut stdout);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    let _ = writeln!(stdout, "\n                    ✓ INSTALLATION COMPLETE\n");
    let _ = stdout.reset();
    rule(&mut stdout);

    let _ = writeln!(stdout, "\nInstallation location:");
    let _ = writeln!(stdout, "  {}", config.install_root.display());

    let _ = writeln!(stdout, "\nStart the manager with:");
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
    let _ = writeln!(stdout, "  {}", config.shortcut_name);
    let _ = stdout.reset();
    let _ = writeln!(
        stdout,
        "  (open a new session or run 'source {}' first)",
        config.shell_profile.display()
    );

    if !report.warnings.is_empty() {
        let _ = writeln!(stdout, "\nCompleted with {} warning(s):", report.warnings.len());
        for warning in &report.warnings {
            let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
            let _ = writeln!(stdout, "  ⚠ {warning}");
            let _ = stdout.reset();
        }
        let _ = writeln!(stdout, "  Logs: {}", config.log_dir.display());
    }

    let _ = writeln!(stdout);
    rule(&mut stdout);
}
