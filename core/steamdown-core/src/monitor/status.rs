//! Status text produced by the monitor on every tick.

use std::fmt;

use crate::types::ActionKind;

/// What the monitor wants the user to see after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorStatus {
    Disabled,
    Downloading { names: Vec<String> },
    TimerStarted { remaining_secs: i64 },
    CountingDown { remaining_secs: i64 },
    Triggered(ActionKind),
    InFlight(ActionKind),
    Succeeded(ActionKind),
    ShutdownScheduled { delay_secs: u32 },
    Failed(ActionKind),
    AlreadyTaken(ActionKind),
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorStatus::Disabled => write!(f, "Automatic actions disabled"),
            MonitorStatus::Downloading { names } => {
                write!(f, "Active downloads:")?;
                for name in names {
                    write!(f, "\n• {}", name)?;
                }
                Ok(())
            }
            MonitorStatus::TimerStarted { remaining_secs } => write!(
                f,
                "No active downloads. Timer started, action in: {} seconds",
                remaining_secs
            ),
            MonitorStatus::CountingDown { remaining_secs } => write!(
                f,
                "No active downloads. Action in: {} seconds",
                remaining_secs
            ),
            MonitorStatus::Triggered(ActionKind::CloseSteam) => {
                write!(f, "Attempting to close Steam...")
            }
            MonitorStatus::Triggered(action) => write!(f, "Performing {}...", action.label()),
            MonitorStatus::InFlight(action) => {
                write!(f, "Waiting for {} to finish...", action.label())
            }
            MonitorStatus::Succeeded(ActionKind::CloseSteam) => {
                write!(f, "Steam has been closed due to low download speed")
            }
            MonitorStatus::ShutdownScheduled { delay_secs } => {
                write!(f, "PC will shutdown in {} seconds...", delay_secs)
            }
            MonitorStatus::Succeeded(action) => write!(f, "Performing {}...", action.label()),
            MonitorStatus::Failed(ActionKind::CloseSteam) => write!(
                f,
                "Failed to close Steam completely. Try closing it manually."
            ),
            MonitorStatus::Failed(action) => write!(f, "Failed to perform {}", action.label()),
            MonitorStatus::AlreadyTaken(action) => write!(
                f,
                "{} already done. Re-enable to arm again.",
                action.label()
            ),
        }
    }
}
