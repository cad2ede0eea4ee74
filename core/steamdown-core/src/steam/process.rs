//! Steam process detection.

use std::sync::Mutex;
use sysinfo::System;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteamProcess {
    pub pid: u32,
    pub name: String,
}

/// Matches the client, `steamservice` and `steamwebhelper`.
pub fn is_steam_process_name(name: &str) -> bool {
    name.to_lowercase().contains("steam")
}

pub trait ProcessSource: Send + Sync {
    fn steam_processes(&self) -> Vec<SteamProcess>;
}

/// Process listing backed by `sysinfo`. The `System` is kept between calls so
/// each refresh only diffs the process table.
pub struct SysinfoProcesses {
    system: Mutex<System>,
}

impl SysinfoProcesses {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoProcesses {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SysinfoProcesses {
    fn steam_processes(&self) -> Vec<SteamProcess> {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_processes();

        let mut processes: Vec<SteamProcess> = system
            .processes()
            .iter()
            .filter(|(_, process)| is_steam_process_name(process.name()))
            .map(|(pid, process)| SteamProcess {
                pid: pid.as_u32(),
                name: process.name().to_string(),
            })
            .collect();
        processes.sort_by_key(|process| process.pid);
        processes
    }
}
