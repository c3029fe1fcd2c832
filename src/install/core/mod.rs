//! Core installer plumbing
//!
//! Background task handles, the polling progress indicator, command
//! execution and the shared installation context.

mod async_task;
mod command;
mod context;
mod progress;

pub use async_task::{AsyncTask, TaskHandle};
pub use command::{CommandRunner, CommandSpec, CommandStatus, SystemRunner};
pub use context::InstallContext;
pub use progress::{spinner, track};
