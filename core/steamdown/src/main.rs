//! steamdown: watches Steam downloads and acts once they go quiet.
//!
//! ## Subcommands
//!
//! - `watch`: poll loop, controlled by line commands on stdin
//! - `status`: one-shot snapshot of Steam and its active downloads

mod control;
mod logging;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, warn};

use steamdown_core::{
    load_config, ActionKind, InactivityMonitor, StatusProvider, StatusSnapshot,
    SteamStatusProvider, SteamdownConfig, WindowsActionExecutor,
};

use crate::runner::Runner;

#[derive(Parser)]
#[command(name = "steamdown")]
#[command(about = "Close Steam or power off the PC when downloads finish")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch downloads and run the selected action after inactivity
    Watch {
        /// close-steam, shutdown, sleep, hibernate or logoff
        #[arg(long, value_name = "KIND")]
        action: Option<ActionKind>,

        /// Seconds without downloads before acting
        #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
        wait: Option<i64>,

        /// Start armed
        #[arg(long)]
        enable: bool,

        /// Poll interval in milliseconds
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,

        /// Config file (defaults to <config dir>/steamdown/config.toml)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Print whether Steam is running and what it is downloading
    Status {
        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            action,
            wait,
            enable,
            interval_ms,
            config,
        } => {
            let mut settings = load_settings(config);
            if let Some(action) = action {
                settings.action = action;
            }
            if let Some(wait) = wait {
                settings.inactivity_timeout_secs = wait;
            }
            if let Some(interval_ms) = interval_ms {
                settings.poll_interval_ms = interval_ms;
            }
            settings.enabled |= enable;
            watch(settings.sanitized());
        }
        Commands::Status { json } => {
            if let Err(message) = print_status(json) {
                error!(error = %message, "steamdown status failed");
                std::process::exit(1);
            }
        }
    }
}

fn load_settings(path: Option<PathBuf>) -> SteamdownConfig {
    match load_config(path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "Failed to load config, using defaults");
            SteamdownConfig::default()
        }
    }
}

fn watch(settings: SteamdownConfig) {
    let mut monitor = InactivityMonitor::new(settings.inactivity_timeout_secs, settings.action)
        .with_shutdown_delay(settings.shutdown_delay_secs);
    monitor.set_enabled(settings.enabled);

    let executor = WindowsActionExecutor::new(
        settings.shutdown_delay_secs,
        settings.steam_shutdown_timeout(),
    );
    let mut runner = Runner::new(
        monitor,
        SteamStatusProvider::new(),
        executor,
        std::io::stdout(),
        settings.poll_interval(),
    );

    control::spawn_stdin_reader(runner.events());
    if !settings.enabled {
        println!("Automatic actions disabled. Type 'enable' to arm, 'help' for commands.");
    }
    runner.run();
}

fn print_status(json: bool) -> Result<(), String> {
    let provider = SteamStatusProvider::new();
    let snapshot = provider.status()?;

    if json {
        let rendered = serde_json::to_string_pretty(&snapshot).map_err(|err| err.to_string())?;
        println!("{}", rendered);
    } else {
        print!("{}", render_status(&snapshot));
    }
    Ok(())
}

fn render_status(snapshot: &StatusSnapshot) -> String {
    let mut out = if snapshot.steam_running {
        format!(
            "Steam is running ({} processes)\n",
            snapshot.process_count
        )
    } else {
        "Steam is not running\n".to_string()
    };

    if snapshot.active_downloads.is_empty() {
        out.push_str("No active downloads\n");
        return out;
    }

    out.push_str("Active downloads:\n");
    for download in &snapshot.active_downloads {
        match download.progress_percent() {
            Some(percent) => out.push_str(&format!(
                "• {} [{}] {:.1}%\n",
                download.display_name, download.id, percent
            )),
            None => out.push_str(&format!(
                "• {} [{}]\n",
                download.display_name, download.id
            )),
        }
    }
    out
}
