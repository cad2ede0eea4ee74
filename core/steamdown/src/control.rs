//! Line commands read from stdin while watching.

use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, warn};

use steamdown_core::ActionKind;

use crate::runner::RunnerEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Enable,
    Disable,
    Wait(i64),
    Action(ActionKind),
    Status,
    Help,
    Quit,
}

pub const HELP_TEXT: &str = "\
Commands:
  enable          arm automatic actions
  disable         disarm and reset the timer
  wait <secs>     set the inactivity threshold
  action <kind>   close-steam | shutdown | sleep | hibernate | logoff
  status          print the current status
  quit            exit";

pub fn parse_command(line: &str) -> Result<Option<ControlCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let argument = parts.next();
    if parts.next().is_some() {
        return Err(format!("too many arguments for '{}'", verb));
    }

    let command = match (verb.to_ascii_lowercase().as_str(), argument) {
        ("enable" | "on", None) => ControlCommand::Enable,
        ("disable" | "off", None) => ControlCommand::Disable,
        ("wait" | "timeout", Some(value)) => {
            let secs = value
                .parse::<i64>()
                .map_err(|_| format!("'{}' is not a number of seconds", value))?;
            ControlCommand::Wait(secs)
        }
        ("action", Some(value)) => ControlCommand::Action(value.parse()?),
        ("status", None) => ControlCommand::Status,
        ("help" | "?", None) => ControlCommand::Help,
        ("quit" | "exit", None) => ControlCommand::Quit,
        ("wait" | "timeout" | "action", None) => {
            return Err(format!("'{}' needs an argument", verb));
        }
        (
            "enable" | "on" | "disable" | "off" | "status" | "help" | "?" | "quit" | "exit",
            Some(_),
        ) => {
            return Err(format!("'{}' takes no argument", verb));
        }
        (other, _) => return Err(format!("unknown command '{}'", other)),
    };
    Ok(Some(command))
}

/// Reads stdin on a helper thread and forwards parsed commands.
pub fn spawn_stdin_reader(events: Sender<RunnerEvent>) {
    let spawned = thread::Builder::new()
        .name("stdin-control".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(error = %err, "Failed to read stdin");
                        break;
                    }
                };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if events.send(RunnerEvent::Control(command)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => eprintln!("{}", message),
                }
            }
            debug!("stdin closed, control commands disabled");
        });

    if let Err(err) = spawned {
        warn!(error = %err, "Failed to spawn stdin reader");
    }
}
