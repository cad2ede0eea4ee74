//! Startup configuration.
//!
//! Read once from `<config dir>/steamdown/config.toml`. Settings changed while
//! running are never written back.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::actions::{DEFAULT_SHUTDOWN_DELAY_SECS, DEFAULT_STEAM_SHUTDOWN_TIMEOUT};
use crate::error::{Result, SteamdownError};
use crate::monitor::{threshold_in_range, DEFAULT_INACTIVITY_THRESHOLD_SECS};
use crate::types::ActionKind;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SteamdownConfig {
    pub inactivity_timeout_secs: i64,
    pub action: ActionKind,
    /// Start armed instead of waiting for an explicit `enable`.
    pub enabled: bool,
    pub poll_interval_ms: u64,
    pub shutdown_delay_secs: u32,
    pub steam_shutdown_timeout_secs: u64,
}

impl Default for SteamdownConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: DEFAULT_INACTIVITY_THRESHOLD_SECS,
            action: ActionKind::default(),
            enabled: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            shutdown_delay_secs: DEFAULT_SHUTDOWN_DELAY_SECS,
            steam_shutdown_timeout_secs: DEFAULT_STEAM_SHUTDOWN_TIMEOUT.as_secs(),
        }
    }
}

impl SteamdownConfig {
    /// Replaces out-of-range values with defaults, logging each one.
    pub fn sanitized(mut self) -> Self {
        if !threshold_in_range(self.inactivity_timeout_secs) {
            report_invalid(
                "inactivity_timeout_secs",
                self.inactivity_timeout_secs,
                DEFAULT_INACTIVITY_THRESHOLD_SECS,
            );
            self.inactivity_timeout_secs = DEFAULT_INACTIVITY_THRESHOLD_SECS;
        }
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            report_invalid(
                "poll_interval_ms",
                self.poll_interval_ms,
                DEFAULT_POLL_INTERVAL_MS,
            );
            self.poll_interval_ms = DEFAULT_POLL_INTERVAL_MS;
        }
        if self.steam_shutdown_timeout_secs == 0 {
            let fallback = DEFAULT_STEAM_SHUTDOWN_TIMEOUT.as_secs();
            report_invalid(
                "steam_shutdown_timeout_secs",
                self.steam_shutdown_timeout_secs,
                fallback,
            );
            self.steam_shutdown_timeout_secs = fallback;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn steam_shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.steam_shutdown_timeout_secs)
    }
}

fn report_invalid(name: &str, value: impl ToString, fallback: impl ToString) {
    let err = SteamdownError::InvalidSetting {
        name: name.to_string(),
        value: value.to_string(),
        fallback: fallback.to_string(),
    };
    warn!(error = %err, "Ignoring invalid setting");
}

/// Returns `<config dir>/steamdown/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("steamdown").join("config.toml"))
}

/// Loads the config at `path` (or the default location).
///
/// A missing file yields defaults. A file that exists but cannot be read or
/// parsed is an error so the caller can decide whether to fall back.
pub fn load_config(path: Option<&Path>) -> Result<SteamdownConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok(SteamdownConfig::default()),
        },
    };

    if !config_path.exists() {
        return Ok(SteamdownConfig::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|err| SteamdownError::Io {
        context: format!("reading {}", config_path.display()),
        source: err,
    })?;
    let config = toml::from_str::<SteamdownConfig>(&content).map_err(|err| {
        SteamdownError::ConfigMalformed {
            path: config_path.clone(),
            details: err.to_string(),
        }
    })?;
    Ok(config.sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_defaults_when_file_missing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("missing.toml");
        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config, SteamdownConfig::default());
        assert_eq!(config.inactivity_timeout_secs, 300);
        assert_eq!(config.action, ActionKind::CloseSteam);
        assert!(!config.enabled);
    }

    #[test]
    fn load_config_parses_all_fields() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(
            &path,
            r#"
inactivity_timeout_secs = 120
action = "hibernate"
enabled = true
poll_interval_ms = 500
shutdown_delay_secs = 30
steam_shutdown_timeout_secs = 10
"#,
        )
        .expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.inactivity_timeout_secs, 120);
        assert_eq!(config.action, ActionKind::Hibernate);
        assert!(config.enabled);
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.shutdown_delay_secs, 30);
        assert_eq!(config.steam_shutdown_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn load_config_accepts_logoff_alias() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(&path, "action = \"log-off\"\n").expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.action, ActionKind::LogOff);
    }

    #[test]
    fn load_config_clamps_out_of_range_values() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(
            &path,
            "inactivity_timeout_secs = -5\npoll_interval_ms = 0\nsteam_shutdown_timeout_secs = 0\n",
        )
        .expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.inactivity_timeout_secs, 300);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(config.steam_shutdown_timeout_secs, 5);
    }

    #[test]
    fn load_config_replaces_unrepresentable_timeout() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(&path, "inactivity_timeout_secs = 9223372036854775807\n")
            .expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.inactivity_timeout_secs, 300);
    }

    #[test]
    fn load_config_rejects_unknown_action() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(&path, "action = \"reboot\"\n").expect("write config");

        let err = load_config(Some(&path)).expect_err("should fail");
        assert!(matches!(err, SteamdownError::ConfigMalformed { .. }));
    }
}
