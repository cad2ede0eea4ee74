//! Action execution: closing Steam and the machine-wide power actions.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::{Result, SteamdownError};
use crate::provider::{ActionCallback, ActionExecutor};
use crate::steam::process::{ProcessSource, SysinfoProcesses};
use crate::steam::registry::RegExe;
use crate::steam::{hidden_command, steam_install_path};
use crate::types::{ActionKind, SystemAction};

pub const DEFAULT_SHUTDOWN_DELAY_SECS: u32 = 60;
pub const DEFAULT_STEAM_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
pub const SHUTDOWN_MESSAGE: &str = "SteamDown is shutting down the PC. Save your work!";

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Hands `action` to the executor; `on_complete` runs exactly once.
///
/// System actions are synchronous, so for them the callback fires before this
/// returns.
pub fn dispatch_action(
    executor: &dyn ActionExecutor,
    action: ActionKind,
    on_complete: ActionCallback,
) {
    match action.system_action() {
        None => executor.stop_steam_gracefully(on_complete),
        Some(system_action) => {
            let result = executor.run_system_action(system_action);
            if let Err(err) = &result {
                warn!(action = %action, error = %err, "System action failed");
            }
            on_complete(result.is_ok());
        }
    }
}

/// Program and arguments for a system action.
pub fn system_command(action: SystemAction, shutdown_delay_secs: u32) -> (String, Vec<String>) {
    let (program, args): (&str, Vec<String>) = match action {
        SystemAction::Shutdown => (
            "shutdown",
            vec![
                "/s".to_string(),
                "/t".to_string(),
                shutdown_delay_secs.to_string(),
                "/c".to_string(),
                SHUTDOWN_MESSAGE.to_string(),
            ],
        ),
        SystemAction::Sleep => (
            "rundll32.exe",
            vec!["powrprof.dll,SetSuspendState".to_string(), "0,1,0".to_string()],
        ),
        SystemAction::Hibernate => ("shutdown", vec!["/h".to_string()]),
        SystemAction::LogOff => ("shutdown", vec!["/l".to_string()]),
    };
    (program.to_string(), args)
}

/// Runs a command, killing it if it outlives `timeout`.
pub fn run_with_timeout(program: &Path, args: &[&str], timeout: Duration) -> Result<ExitStatus> {
    let command_line = format!("{} {}", program.display(), args.join(" "));
    let mut child = hidden_command(program)
        .args(args)
        .spawn()
        .map_err(|err| SteamdownError::CommandFailed {
            command: command_line.clone(),
            details: err.to_string(),
        })?;

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if started.elapsed() >= timeout => {
                if let Err(err) = child.kill() {
                    debug!(error = %err, "Failed to kill timed out command");
                }
                let _ = child.wait();
                return Err(SteamdownError::CommandTimedOut {
                    command: command_line,
                    timeout,
                });
            }
            Ok(None) => thread::sleep(WAIT_POLL_INTERVAL),
            Err(err) => {
                return Err(SteamdownError::Io {
                    context: format!("waiting for {}", command_line),
                    source: err,
                })
            }
        }
    }
}

/// Executor for a Windows desktop with the Steam client installed.
#[derive(Debug, Clone)]
pub struct WindowsActionExecutor {
    pub shutdown_delay_secs: u32,
    pub steam_shutdown_timeout: Duration,
}

impl Default for WindowsActionExecutor {
    fn default() -> Self {
        Self {
            shutdown_delay_secs: DEFAULT_SHUTDOWN_DELAY_SECS,
            steam_shutdown_timeout: DEFAULT_STEAM_SHUTDOWN_TIMEOUT,
        }
    }
}

impl WindowsActionExecutor {
    pub fn new(shutdown_delay_secs: u32, steam_shutdown_timeout: Duration) -> Self {
        Self {
            shutdown_delay_secs,
            steam_shutdown_timeout,
        }
    }
}

fn steam_executable(install_path: &Path) -> PathBuf {
    install_path.join("Steam.exe")
}

/// Body of the graceful-stop worker thread.
fn stop_steam(timeout: Duration) -> Result<()> {
    let processes = SysinfoProcesses::new().steam_processes();
    if processes.is_empty() {
        info!("Steam is not running, nothing to close");
        return Ok(());
    }
    debug!(count = processes.len(), "Found Steam processes");

    let install_path = steam_install_path(&RegExe)?.ok_or(SteamdownError::SteamNotInstalled)?;
    let steam_exe = steam_executable(&install_path);
    if !steam_exe.exists() {
        return Err(SteamdownError::ActionDispatchFailed {
            action: ActionKind::CloseSteam.to_string(),
            details: format!("{} does not exist", steam_exe.display()),
        });
    }

    info!(path = %steam_exe.display(), "Requesting Steam shutdown");
    let status = run_with_timeout(&steam_exe, &["-shutdown"], timeout)?;
    if status.success() {
        Ok(())
    } else {
        Err(SteamdownError::CommandFailed {
            command: format!("{} -shutdown", steam_exe.display()),
            details: format!("exited with {}", status),
        })
    }
}

fn complete_once(callback: &Mutex<Option<ActionCallback>>, success: bool) {
    let taken = callback
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
    if let Some(on_complete) = taken {
        on_complete(success);
    }
}

impl ActionExecutor for WindowsActionExecutor {
    fn stop_steam_gracefully(&self, on_complete: ActionCallback) {
        let timeout = self.steam_shutdown_timeout;
        let callback = Arc::new(Mutex::new(Some(on_complete)));
        let worker_callback = Arc::clone(&callback);
        let spawned = thread::Builder::new()
            .name("steam-shutdown".to_string())
            .spawn(move || {
                let success = match stop_steam(timeout) {
                    Ok(()) => {
                        info!("Steam shutdown command sent");
                        true
                    }
                    Err(err) => {
                        warn!(error = %err, "Steam shutdown failed");
                        false
                    }
                };
                complete_once(&worker_callback, success);
            });

        if let Err(err) = spawned {
            error!(error = %err, "Failed to spawn Steam shutdown thread");
            complete_once(&callback, false);
        }
    }

    fn run_system_action(&self, action: SystemAction) -> Result<()> {
        let (program, args) = system_command(action, self.shutdown_delay_secs);
        let command_line = format!("{} {}", program, args.join(" "));
        info!(command = %command_line, "Issuing system action");

        let status = hidden_command(&program)
            .args(&args)
            .status()
            .map_err(|err| SteamdownError::ActionDispatchFailed {
                action: ActionKind::from(action).to_string(),
                details: err.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SteamdownError::CommandFailed {
                command: command_line,
                details: format!("exited with {}", status),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[derive(Default)]
    struct RecordingExecutor {
        graceful_calls: AtomicUsize,
        system_calls: Mutex<Vec<SystemAction>>,
        fail_system: bool,
    }

    impl ActionExecutor for RecordingExecutor {
        fn stop_steam_gracefully(&self, on_complete: ActionCallback) {
            self.graceful_calls.fetch_add(1, Ordering::SeqCst);
            thread::spawn(move || on_complete(true));
        }

        fn run_system_action(&self, action: SystemAction) -> Result<()> {
            self.system_calls.lock().expect("lock").push(action);
            if self.fail_system {
                return Err(SteamdownError::CommandFailed {
                    command: "shutdown".to_string(),
                    details: "denied".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn shutdown_command_includes_delay_and_message() {
        let (program, args) = system_command(SystemAction::Shutdown, 60);
        assert_eq!(program, "shutdown");
        assert_eq!(args, vec!["/s", "/t", "60", "/c", SHUTDOWN_MESSAGE]);
    }

    #[test]
    fn power_commands_match_windows_tools() {
        assert_eq!(
            system_command(SystemAction::Sleep, 60),
            (
                "rundll32.exe".to_string(),
                vec![
                    "powrprof.dll,SetSuspendState".to_string(),
                    "0,1,0".to_string()
                ]
            )
        );
        assert_eq!(
            system_command(SystemAction::Hibernate, 60).1,
            vec!["/h".to_string()]
        );
        assert_eq!(
            system_command(SystemAction::LogOff, 60).1,
            vec!["/l".to_string()]
        );
    }

    #[test]
    fn dispatch_close_steam_calls_back_from_worker() {
        let executor = RecordingExecutor::default();
        let (tx, rx) = mpsc::channel();
        dispatch_action(
            &executor,
            ActionKind::CloseSteam,
            Box::new(move |ok| {
                let _ = tx.send(ok);
            }),
        );

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(true));
        assert_eq!(executor.graceful_calls.load(Ordering::SeqCst), 1);
        assert!(executor.system_calls.lock().expect("lock").is_empty());
    }

    #[test]
    fn dispatch_system_action_reports_failure_synchronously() {
        let executor = RecordingExecutor {
            fail_system: true,
            ..RecordingExecutor::default()
        };
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&results);
        dispatch_action(
            &executor,
            ActionKind::Sleep,
            Box::new(move |ok| sink.lock().expect("lock").push(ok)),
        );

        assert_eq!(*results.lock().expect("lock"), vec![false]);
        assert_eq!(
            *executor.system_calls.lock().expect("lock"),
            vec![SystemAction::Sleep]
        );
    }

    #[test]
    fn run_with_timeout_reports_spawn_failure() {
        let result = run_with_timeout(
            Path::new("definitely-not-a-real-program-steamdown"),
            &[],
            Duration::from_millis(100),
        );
        assert!(matches!(result, Err(SteamdownError::CommandFailed { .. })));
    }
}
