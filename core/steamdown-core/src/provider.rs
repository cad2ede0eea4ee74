//! Seams between the monitor and the operating system.
//!
//! The monitor never calls these itself; the runner queries a
//! [`StatusProvider`] each tick and hands triggered actions to an
//! [`ActionExecutor`].

use crate::error::Result;
use crate::types::{StatusSnapshot, SystemAction};

/// Completion callback for asynchronous actions. Invoked exactly once.
pub type ActionCallback = Box<dyn FnOnce(bool) + Send + 'static>;

pub trait StatusProvider: Send + Sync {
    /// Takes a fresh snapshot. Errors mean "no new information this tick".
    fn status(&self) -> Result<StatusSnapshot>;
}

pub trait ActionExecutor: Send + Sync {
    /// Asks Steam to exit. Runs off the calling thread and reports back
    /// through `on_complete`.
    fn stop_steam_gracefully(&self, on_complete: ActionCallback);

    /// Issues a machine-wide action. `Ok` means the command was accepted,
    /// not that the machine has already shut down.
    fn run_system_action(&self, action: SystemAction) -> Result<()>;
}
