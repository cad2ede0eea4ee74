//! Error types for steamdown-core operations.
//!
//! None of these are fatal to the poll loop: callers log them and turn them
//! into status text or a skipped tick.

use std::path::PathBuf;
use std::time::Duration;

/// All errors that can occur in steamdown-core operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamdownError {
    // ─────────────────────────────────────────────────────────────────────
    // Monitor Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Steam status unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Action {action} could not be dispatched: {details}")]
    ActionDispatchFailed { action: String, details: String },

    #[error("Invalid setting {name} = {value}, using {fallback}")]
    InvalidSetting {
        name: String,
        value: String,
        fallback: String,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Steam Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Steam installation not found in registry")]
    SteamNotInstalled,

    // ─────────────────────────────────────────────────────────────────────
    // Command Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Command execution failed: {command}: {details}")]
    CommandFailed { command: String, details: String },

    #[error("Command timed out after {timeout:?}: {command}")]
    CommandTimedOut { command: String, timeout: Duration },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration / I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using SteamdownError.
pub type Result<T> = std::result::Result<T, SteamdownError>;

impl From<SteamdownError> for String {
    fn from(err: SteamdownError) -> String {
        err.to_string()
    }
}
