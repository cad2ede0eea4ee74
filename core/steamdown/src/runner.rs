//! The poll loop.
//!
//! Owns the [`InactivityMonitor`]; every mutation arrives either from a tick
//! or as a [`RunnerEvent`] on the runner's channel (stdin commands, action
//! completions from the executor's worker thread). Nothing else touches the
//! monitor, so no lock is needed.

use chrono::{DateTime, Utc};
use std::io::Write;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use steamdown_core::{
    dispatch_action, ActionExecutor, ActionKind, InactivityMonitor, MonitorStatus,
    StatusProvider,
};

use crate::control::{ControlCommand, HELP_TEXT};

#[derive(Debug)]
pub enum RunnerEvent {
    Control(ControlCommand),
    ActionCompleted { action: ActionKind, success: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Runner<P, E, W> {
    monitor: InactivityMonitor,
    provider: P,
    executor: E,
    out: W,
    interval: Duration,
    events_tx: Sender<RunnerEvent>,
    events_rx: Receiver<RunnerEvent>,
    last_status: Option<String>,
}

impl<P: StatusProvider, E: ActionExecutor, W: Write> Runner<P, E, W> {
    pub fn new(
        monitor: InactivityMonitor,
        provider: P,
        executor: E,
        out: W,
        interval: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            monitor,
            provider,
            executor,
            out,
            interval,
            events_tx,
            events_rx,
            last_status: None,
        }
    }

    /// Sender for feeding control commands into the loop.
    pub fn events(&self) -> Sender<RunnerEvent> {
        self.events_tx.clone()
    }

    #[cfg(test)]
    pub fn monitor(&self) -> &InactivityMonitor {
        &self.monitor
    }

    /// Runs until a `quit` command arrives.
    pub fn run(&mut self) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            threshold_secs = self.monitor.inactivity_threshold_secs(),
            action = %self.monitor.selected_action(),
            enabled = self.monitor.is_enabled(),
            "Watching Steam downloads"
        );

        let mut next_tick = Instant::now();
        loop {
            let wait = next_tick.saturating_duration_since(Instant::now());
            match self.events_rx.recv_timeout(wait) {
                Ok(event) => {
                    if self.handle_event(event) == Flow::Exit {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.tick(Utc::now());
                    next_tick += self.interval;
                    let now = Instant::now();
                    if next_tick < now {
                        next_tick = now + self.interval;
                    }
                }
                // Unreachable while `self.events_tx` is alive.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("Stopped watching");
    }

    /// One poll: query Steam, feed the monitor, dispatch any trigger.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.monitor.action_taken() {
            return;
        }

        let snapshot = match self.provider.status() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                debug!(error = %err, "Steam status unavailable, skipping tick");
                return;
            }
        };

        let result = self.monitor.poll(&snapshot, now);
        self.publish(&result.status);

        if let Some(action) = result.triggered() {
            let events = self.events_tx.clone();
            dispatch_action(
                &self.executor,
                action,
                Box::new(move |success| {
                    let _ = events.send(RunnerEvent::ActionCompleted { action, success });
                }),
            );
        }
    }

    /// Handles everything already queued without blocking.
    #[cfg(test)]
    pub fn drain_events(&mut self) -> Flow {
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    if self.handle_event(event) == Flow::Exit {
                        return Flow::Exit;
                    }
                }
                Err(_) => return Flow::Continue,
            }
        }
    }

    pub fn handle_event(&mut self, event: RunnerEvent) -> Flow {
        match event {
            RunnerEvent::ActionCompleted { action, success } => {
                debug!(action = %action, success, "Action completed");
                if let Some(status) = self.monitor.on_action_result(success) {
                    self.publish(&status);
                }
            }
            RunnerEvent::Control(command) => return self.handle_command(command),
        }
        Flow::Continue
    }

    fn handle_command(&mut self, command: ControlCommand) -> Flow {
        match command {
            ControlCommand::Enable => {
                self.monitor.set_enabled(true);
                self.say("Automatic actions enabled");
            }
            ControlCommand::Disable => {
                self.monitor.set_enabled(false);
                self.publish(&MonitorStatus::Disabled);
            }
            ControlCommand::Wait(secs) => {
                self.monitor.update_settings(secs);
                let applied = self.monitor.inactivity_threshold_secs();
                self.say(&format!("Wait time before action: {} seconds", applied));
            }
            ControlCommand::Action(action) => {
                self.monitor.set_action(action);
                self.say(&format!("Action: {}", action.label()));
            }
            ControlCommand::Status => {
                let summary = format!(
                    "enabled={} action={} wait={}s",
                    self.monitor.is_enabled(),
                    self.monitor.selected_action(),
                    self.monitor.inactivity_threshold_secs()
                );
                self.say(&summary);
                if let Some(last) = self.last_status.clone() {
                    self.say(&last);
                }
            }
            ControlCommand::Help => self.say(HELP_TEXT),
            ControlCommand::Quit => return Flow::Exit,
        }
        Flow::Continue
    }

    /// Prints the status text when it differs from the last one shown.
    fn publish(&mut self, status: &MonitorStatus) {
        let text = status.to_string();
        if self.last_status.as_deref() == Some(text.as_str()) {
            return;
        }
        self.say(&text);
        self.last_status = Some(text);
    }

    fn say(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{}", text) {
            warn!(error = %err, "Failed to write status");
        }
    }
}
