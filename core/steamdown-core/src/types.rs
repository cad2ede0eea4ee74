//! Core types shared between the monitor, the Steam provider and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Status Snapshot
// ═══════════════════════════════════════════════════════════════════════════════

/// Point-in-time view of Steam's running and download state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub steam_running: bool,
    /// Number of Steam-related processes (client, service, web helpers).
    pub process_count: usize,
    /// Apps with an active download or update flag, in discovery order.
    pub active_downloads: Vec<DownloadInfo>,
}

impl StatusSnapshot {
    pub fn has_active_downloads(&self) -> bool {
        !self.active_downloads.is_empty()
    }
}

/// A single app that Steam reports as downloading or updating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub bytes_total: u64,
    #[serde(default)]
    pub bytes_downloaded: u64,
    /// Bytes per second as last reported by Steam.
    #[serde(default)]
    pub download_rate: u64,
}

impl DownloadInfo {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Percent complete, or `None` when Steam has not reported a total size.
    pub fn progress_percent(&self) -> Option<f64> {
        if self.bytes_total == 0 {
            return None;
        }
        let percent = self.bytes_downloaded as f64 / self.bytes_total as f64 * 100.0;
        Some(percent.min(100.0))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Actions
// ═══════════════════════════════════════════════════════════════════════════════

/// What to do once downloads have been idle long enough.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    #[default]
    CloseSteam,
    Shutdown,
    Sleep,
    Hibernate,
    #[serde(rename = "logoff", alias = "log-off")]
    LogOff,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::CloseSteam,
        ActionKind::Shutdown,
        ActionKind::Sleep,
        ActionKind::Hibernate,
        ActionKind::LogOff,
    ];

    /// Stable identifier used in config files and on the command line.
    pub fn id(self) -> &'static str {
        match self {
            ActionKind::CloseSteam => "close-steam",
            ActionKind::Shutdown => "shutdown",
            ActionKind::Sleep => "sleep",
            ActionKind::Hibernate => "hibernate",
            ActionKind::LogOff => "logoff",
        }
    }

    /// Human-readable label shown in status text.
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::CloseSteam => "Gracefully stop Steam",
            ActionKind::Shutdown => "Shutdown PC",
            ActionKind::Sleep => "Sleep PC",
            ActionKind::Hibernate => "Hibernate PC",
            ActionKind::LogOff => "Log off",
        }
    }

    /// The OS-level action, or `None` for the Steam-only action.
    pub fn system_action(self) -> Option<SystemAction> {
        match self {
            ActionKind::CloseSteam => None,
            ActionKind::Shutdown => Some(SystemAction::Shutdown),
            ActionKind::Sleep => Some(SystemAction::Sleep),
            ActionKind::Hibernate => Some(SystemAction::Hibernate),
            ActionKind::LogOff => Some(SystemAction::LogOff),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "close-steam" | "close_steam" | "steam" => Ok(ActionKind::CloseSteam),
            "shutdown" => Ok(ActionKind::Shutdown),
            "sleep" => Ok(ActionKind::Sleep),
            "hibernate" => Ok(ActionKind::Hibernate),
            "logoff" | "log-off" | "log_off" => Ok(ActionKind::LogOff),
            other => Err(format!(
                "unknown action '{}', expected one of: close-steam, shutdown, sleep, hibernate, logoff",
                other
            )),
        }
    }
}

/// Machine-wide actions handled synchronously by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemAction {
    Shutdown,
    Sleep,
    Hibernate,
    LogOff,
}

impl From<SystemAction> for ActionKind {
    fn from(action: SystemAction) -> Self {
        match action {
            SystemAction::Shutdown => ActionKind::Shutdown,
            SystemAction::Sleep => ActionKind::Sleep,
            SystemAction::Hibernate => ActionKind::Hibernate,
            SystemAction::LogOff => ActionKind::LogOff,
        }
    }
}
