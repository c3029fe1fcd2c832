//! Coloured terminal lines for installer progress
//!
//! Steps go to stdout, warnings and errors to stderr.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn emit(mut stream: StandardStream, prefix: &str, color: Color, bold: bool, message: &str) {
    let _ = stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
    let _ = write!(stream, "{prefix}");
    let _ = stream.reset();
    let _ = writeln!(stream, " {message}");
}

fn stdout() -> StandardStream {
    StandardStream::stdout(ColorChoice::Auto)
}

fn stderr() -> StandardStream {
    StandardStream::stderr(ColorChoice::Auto)
}

/// Phase header, e.g. "==> Installing system packages"
pub fn phase(message: &str) {
    let mut out = stdout();
    let _ = writeln!(out);
    emit(out, "==>", Color::Cyan, true, message);
}

/// Progress within a phase
pub fn step(message: &str) {
    emit(stdout(), "  ->", Color::Blue, false, message);
}

pub fn success(message: &str) {
    emit(stdout(), "  ✓", Color::Green, true, message);
}

/// Already done on a previous run
pub fn skip(message: &str) {
    emit(stdout(), "  =", Color::White, false, message);
}

pub fn info(message: &str) {
    emit(stdout(), "  ::", Color::Cyan, false, message);
}

pub fn warning(message: &str) {
    emit(stderr(), "  ⚠", Color::Yellow, true, message);
}

pub fn error(message: &str) {
    emit(stderr(), "❌", Color::Red, true, message);
}

/// Debug-only detail (paths, computed values)
pub fn debug(enabled: bool, message: &str) {
    if enabled {
        emit(stderr(), "  [debug]", Color::Magenta, false, message);
    }
    log::debug!("{message}");
}
