//! # steamdown-core
//!
//! Shared logic for SteamDown: watch Steam for active downloads and, once
//! nothing has downloaded for a while, run the action the user picked.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. The one blocking action
//!   (gracefully stopping Steam) runs on its own thread and calls back.
//! - **Pure decisions**: [`InactivityMonitor`] never touches the OS and takes
//!   the current time as an argument, so every transition is unit-testable.
//! - **Graceful degradation**: A failed status query skips a tick; a failed
//!   action leaves the monitor armed. Nothing here is fatal.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use steamdown_core::{ActionKind, InactivityMonitor, StatusProvider, SteamStatusProvider};
//!
//! let provider = SteamStatusProvider::new();
//! let mut monitor = InactivityMonitor::new(300, ActionKind::CloseSteam);
//! monitor.set_enabled(true);
//! let result = monitor.poll(&provider.status()?, chrono::Utc::now());
//! println!("{}", result.status);
//! ```

pub mod actions;
pub mod config;
pub mod error;
pub mod monitor;
pub mod patterns;
pub mod provider;
pub mod steam;
pub mod types;

pub use actions::{dispatch_action, system_command, WindowsActionExecutor};
pub use config::{default_config_path, load_config, SteamdownConfig};
pub use error::{Result, SteamdownError};
pub use monitor::{InactivityMonitor, MonitorStatus, PollDecision, PollResult};
pub use provider::{ActionCallback, ActionExecutor, StatusProvider};
pub use steam::SteamStatusProvider;
pub use types::*;
