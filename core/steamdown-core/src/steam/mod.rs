//! Steam status detection.
//!
//! Answers "is Steam running, and what is it downloading?" from three sources:
//!
//! - **Process table** ([`process`]): any process named like `steam*`.
//! - **Registry** ([`registry`]): `HKCU\Software\Valve\Steam\Apps\<id>` carries
//!   `Updating` / `Downloading` flags plus byte counters per app.
//! - **Library manifests** ([`library`]): `appmanifest_<id>.acf` holds the
//!   display name; the registry `Name` is only a fallback.
//!
//! The provider is Windows-only in practice. On other systems `reg.exe` is
//! missing and every query reports [`SteamdownError::ProviderUnavailable`].

pub mod library;
pub mod process;
pub mod registry;

use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::error::{Result, SteamdownError};
use crate::provider::StatusProvider;
use crate::types::{DownloadInfo, StatusSnapshot};

use process::{ProcessSource, SysinfoProcesses};
use registry::{
    direct_children, parse_reg_query, query_text_value, RegExe, RegistryKey, RegistrySource,
    STEAM_APPS_KEY, STEAM_KEY, STEAM_KEY_WOW64,
};

/// Builds a command that does not flash a console window on Windows.
pub(crate) fn hidden_command(program: impl AsRef<std::ffi::OsStr>) -> Command {
    #[allow(unused_mut)]
    let mut command = Command::new(program);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NO_WINDOW);
    }
    command
}

/// Resolves the Steam install folder, preferring the 32-bit registry view.
pub fn steam_install_path(source: &dyn RegistrySource) -> Result<Option<PathBuf>> {
    for key in [STEAM_KEY_WOW64, STEAM_KEY] {
        if let Some(path) = query_text_value(source, key, "InstallPath")? {
            return Ok(Some(PathBuf::from(path)));
        }
    }
    debug!("Steam install path not found in registry");
    Ok(None)
}

fn is_active(entry: &RegistryKey) -> bool {
    entry.dword("Updating") == 1 || entry.dword("Downloading") == 1
}

fn download_info(entry: &RegistryKey, libraries: &[PathBuf]) -> DownloadInfo {
    let id = entry.name().to_string();
    let display_name = library::manifest_name(&id, libraries)
        .or_else(|| entry.text("Name").map(str::to_string))
        .unwrap_or_else(|| format!("Game {}", id));

    let bytes_total = match entry.dword("SizeOnDisk") {
        0 => entry.dword("BytesToDownload"),
        size => size,
    };

    DownloadInfo {
        id,
        display_name,
        bytes_total,
        bytes_downloaded: entry.dword("BytesDownloaded"),
        download_rate: entry.dword("DownloadRate"),
    }
}

pub struct SteamStatusProvider<R = RegExe, P = SysinfoProcesses> {
    registry: R,
    processes: P,
}

impl SteamStatusProvider {
    pub fn new() -> Self {
        Self::with_sources(RegExe, SysinfoProcesses::new())
    }
}

impl Default for SteamStatusProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RegistrySource, P: ProcessSource> SteamStatusProvider<R, P> {
    pub fn with_sources(registry: R, processes: P) -> Self {
        Self {
            registry,
            processes,
        }
    }

    pub fn install_path(&self) -> Result<Option<PathBuf>> {
        steam_install_path(&self.registry)
    }

    /// Apps with an active download or update flag, in registry order.
    pub fn active_downloads(&self) -> Result<Vec<DownloadInfo>> {
        let Some(output) = self.registry.query(STEAM_APPS_KEY, true)? else {
            debug!("Steam Apps registry key not found");
            return Ok(Vec::new());
        };

        let keys = parse_reg_query(&output);
        let active: Vec<&RegistryKey> = direct_children(&keys)
            .into_iter()
            .filter(|entry| is_active(entry))
            .collect();
        if active.is_empty() {
            return Ok(Vec::new());
        }

        let libraries = match self.install_path()? {
            Some(path) => library::library_folders(&path),
            None => Vec::new(),
        };

        let downloads: Vec<DownloadInfo> = active
            .into_iter()
            .map(|entry| download_info(entry, &libraries))
            .collect();
        for download in &downloads {
            debug!(
                app_id = %download.id,
                name = %download.display_name,
                total = download.bytes_total,
                downloaded = download.bytes_downloaded,
                rate = download.download_rate,
                "Active download"
            );
        }
        Ok(downloads)
    }
}

impl<R: RegistrySource, P: ProcessSource> StatusProvider for SteamStatusProvider<R, P> {
    fn status(&self) -> Result<StatusSnapshot> {
        let processes = self.processes.steam_processes();
        let active_downloads = self
            .active_downloads()
            .map_err(|err| SteamdownError::ProviderUnavailable(err.to_string()))?;

        Ok(StatusSnapshot {
            steam_running: !processes.is_empty(),
            process_count: processes.len(),
            active_downloads,
        })
    }
}
