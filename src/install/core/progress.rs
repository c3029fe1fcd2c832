//! Liveness-polling progress indicator
//!
//! A step launches one background task and the foreground loop below asks it
//! "done yet?" at a fixed interval, ticking a spinner in between. The spinner
//! only consumes [`TaskHandle::is_finished`]; completion semantics belong to
//! [`TaskHandle::wait`].

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::async_task::TaskHandle;
use crate::install::error::InstallError;

/// Standard spinner characters
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner that is advanced manually by the polling loop
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("   {spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(message.to_string());
    pb
}

/// Poll `handle` every `interval` while animating a spinner, then take its result
pub async fn track<T: Send + 'static>(
    message: &str,
    handle: TaskHandle<T>,
    interval: Duration,
) -> Result<T, InstallError> {
    let pb = spinner(message);
    while !handle.is_finished() {
        pb.tick();
        tokio::time::sleep(interval).await;
    }
    pb.finish_and_clear();
    handle.wait().await
}
