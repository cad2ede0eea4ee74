//! Inactivity detection.
//!
//! Decides when the configured action should fire, given one status snapshot
//! per tick. The monitor owns all timing state and is only ever mutated
//! through its own methods:
//!
//! ```text
//! Runner tick ──► poll(snapshot, now) ──► PollResult { decision, status }
//!                                              │
//!                     TriggerAction(kind) ─────┘──► executor ──► on_action_result(ok)
//! ```
//!
//! # Invariants
//!
//! - `below_threshold_since` is `None` while disabled or while any download
//!   is active.
//! - The action fires at most once per arming period. Disabling, or changing
//!   the threshold, starts a new period.
//! - While an action is in flight no second trigger is emitted.
//!
//! A failed action leaves the timer where it was, so the next qualifying poll
//! triggers again straight away. There is no cooldown.

mod status;

pub use status::MonitorStatus;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::actions::DEFAULT_SHUTDOWN_DELAY_SECS;
use crate::types::{ActionKind, StatusSnapshot};

/// Threshold used when a supplied value is unusable.
pub const DEFAULT_INACTIVITY_THRESHOLD_SECS: i64 = 300;

/// What the caller should do after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    NoOp,
    TriggerAction(ActionKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub decision: PollDecision,
    pub status: MonitorStatus,
}

impl PollResult {
    fn no_op(status: MonitorStatus) -> Self {
        Self {
            decision: PollDecision::NoOp,
            status,
        }
    }

    pub fn status_text(&self) -> String {
        self.status.to_string()
    }

    pub fn triggered(&self) -> Option<ActionKind> {
        match self.decision {
            PollDecision::TriggerAction(action) => Some(action),
            PollDecision::NoOp => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InactivityMonitor {
    enabled: bool,
    action_taken: Option<ActionKind>,
    action_in_flight: Option<ActionKind>,
    below_threshold_since: Option<DateTime<Utc>>,
    inactivity_threshold_secs: i64,
    selected_action: ActionKind,
    shutdown_delay_secs: u32,
}

impl InactivityMonitor {
    /// Creates a disarmed monitor. Invalid thresholds fall back to the default.
    pub fn new(inactivity_threshold_secs: i64, selected_action: ActionKind) -> Self {
        Self {
            enabled: false,
            action_taken: None,
            action_in_flight: None,
            below_threshold_since: None,
            inactivity_threshold_secs: sanitize_threshold(inactivity_threshold_secs),
            selected_action,
            shutdown_delay_secs: DEFAULT_SHUTDOWN_DELAY_SECS,
        }
    }

    /// Delay reported in the status once a shutdown has been scheduled.
    pub fn with_shutdown_delay(mut self, shutdown_delay_secs: u32) -> Self {
        self.shutdown_delay_secs = shutdown_delay_secs;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn action_taken(&self) -> bool {
        self.action_taken.is_some()
    }

    pub fn action_in_flight(&self) -> bool {
        self.action_in_flight.is_some()
    }

    pub fn below_threshold_since(&self) -> Option<DateTime<Utc>> {
        self.below_threshold_since
    }

    pub fn inactivity_threshold_secs(&self) -> i64 {
        self.inactivity_threshold_secs
    }

    pub fn selected_action(&self) -> ActionKind {
        self.selected_action
    }

    /// Evaluates one snapshot taken at `now`.
    pub fn poll(&mut self, snapshot: &StatusSnapshot, now: DateTime<Utc>) -> PollResult {
        if let Some(action) = self.action_taken {
            return PollResult::no_op(MonitorStatus::AlreadyTaken(action));
        }

        if !self.enabled {
            self.below_threshold_since = None;
            return PollResult::no_op(MonitorStatus::Disabled);
        }

        if snapshot.has_active_downloads() {
            if self.below_threshold_since.take().is_some() {
                debug!("Download activity resumed, timer cleared");
            }
            let names = snapshot
                .active_downloads
                .iter()
                .map(|download| download.display_name.clone())
                .collect();
            return PollResult::no_op(MonitorStatus::Downloading { names });
        }

        let Some(since) = self.below_threshold_since else {
            self.below_threshold_since = Some(now);
            debug!(at = %now, "No active downloads, starting timer");
            return PollResult::no_op(MonitorStatus::TimerStarted {
                remaining_secs: self.inactivity_threshold_secs,
            });
        };

        let elapsed = (now - since).max(Duration::zero());
        let threshold = Duration::seconds(self.inactivity_threshold_secs);
        if elapsed < threshold {
            let remaining_ms = (threshold - elapsed).num_milliseconds();
            return PollResult::no_op(MonitorStatus::CountingDown {
                remaining_secs: remaining_ms / 1000,
            });
        }

        if let Some(action) = self.action_in_flight {
            return PollResult::no_op(MonitorStatus::InFlight(action));
        }

        let action = self.selected_action;
        self.action_in_flight = Some(action);
        info!(
            action = %action,
            idle_secs = elapsed.num_seconds(),
            "Inactivity threshold reached, triggering action"
        );
        PollResult {
            decision: PollDecision::TriggerAction(action),
            status: MonitorStatus::Triggered(action),
        }
    }

    /// Records the outcome of the last triggered action.
    ///
    /// Returns `None` when no action was in flight.
    pub fn on_action_result(&mut self, success: bool) -> Option<MonitorStatus> {
        let Some(action) = self.action_in_flight.take() else {
            warn!(success, "Action result received with nothing in flight");
            return None;
        };

        if !success {
            warn!(action = %action, "Action failed, monitor stays armed");
            return Some(MonitorStatus::Failed(action));
        }

        if self.enabled {
            self.action_taken = Some(action);
        } else {
            debug!(action = %action, "Action finished after disarm, not marking taken");
        }
        info!(action = %action, "Action completed");
        if action == ActionKind::Shutdown {
            return Some(MonitorStatus::ShutdownScheduled {
                delay_secs: self.shutdown_delay_secs,
            });
        }
        Some(MonitorStatus::Succeeded(action))
    }

    /// Applies a new threshold and starts a fresh arming period.
    pub fn update_settings(&mut self, new_threshold_secs: i64) {
        let threshold = sanitize_threshold(new_threshold_secs);
        self.inactivity_threshold_secs = threshold;
        self.below_threshold_since = None;
        self.action_taken = None;
        info!(threshold_secs = threshold, "Settings updated");
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.below_threshold_since = None;
            self.action_taken = None;
        }
        info!(enabled, "Automatic actions toggled");
    }

    pub fn set_action(&mut self, action: ActionKind) {
        if self.selected_action != action {
            info!(action = %action, "Selected action changed");
        }
        self.selected_action = action;
    }
}

/// Whether `value` seconds is a usable threshold: positive and small enough
/// for chrono to represent.
pub(crate) fn threshold_in_range(value: i64) -> bool {
    value > 0 && Duration::try_seconds(value).is_some()
}

fn sanitize_threshold(value: i64) -> i64 {
    if threshold_in_range(value) {
        value
    } else {
        warn!(
            value,
            fallback = DEFAULT_INACTIVITY_THRESHOLD_SECS,
            "Invalid inactivity threshold, using default"
        );
        DEFAULT_INACTIVITY_THRESHOLD_SECS
    }
}
