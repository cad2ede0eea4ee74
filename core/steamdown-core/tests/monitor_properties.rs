//! Integration tests for the inactivity monitor's externally visible behaviour.

use chrono::{DateTime, Duration, Utc};
use steamdown_core::{
    ActionKind, DownloadInfo, InactivityMonitor, MonitorStatus, PollDecision, StatusSnapshot,
};

fn at(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .expect("parse")
        .with_timezone(&Utc)
}

fn snapshot(downloads: &[(&str, &str)]) -> StatusSnapshot {
    StatusSnapshot {
        steam_running: true,
        process_count: 4,
        active_downloads: downloads
            .iter()
            .map(|(id, name)| DownloadInfo::new(*id, *name))
            .collect(),
    }
}

#[test]
fn test_active_downloads_never_trigger() {
    let mut monitor = InactivityMonitor::new(1, ActionKind::Shutdown);
    monitor.set_enabled(true);
    let t0 = at("2026-05-10T08:00:00Z");
    let busy = snapshot(&[("570", "Dota 2"), ("620", "Portal 2")]);

    for offset in 0..600 {
        let result = monitor.poll(&busy, t0 + Duration::seconds(offset));
        assert_eq!(result.decision, PollDecision::NoOp);
        assert_eq!(monitor.below_threshold_since(), None);
    }
}

#[test]
fn test_disabled_monitor_never_triggers() {
    let mut monitor = InactivityMonitor::new(1, ActionKind::Shutdown);
    let t0 = at("2026-05-10T08:00:00Z");

    for offset in 0..600 {
        let snap = if offset % 7 == 0 {
            snapshot(&[("570", "Dota 2")])
        } else {
            snapshot(&[])
        };
        let result = monitor.poll(&snap, t0 + Duration::seconds(offset));
        assert_eq!(result.decision, PollDecision::NoOp);
        assert_eq!(result.status, MonitorStatus::Disabled);
    }
}

#[test]
fn test_threshold_timeline() {
    let threshold = 30;
    let mut monitor = InactivityMonitor::new(threshold, ActionKind::CloseSteam);
    monitor.set_enabled(true);
    let t0 = at("2026-05-10T08:00:00Z");
    let idle = snapshot(&[]);

    let start = monitor.poll(&idle, t0);
    assert_eq!(start.decision, PollDecision::NoOp);
    assert_eq!(monitor.below_threshold_since(), Some(t0));

    let almost = monitor.poll(&idle, t0 + Duration::seconds(threshold - 1));
    assert_eq!(almost.decision, PollDecision::NoOp);
    assert_eq!(almost.status, MonitorStatus::CountingDown { remaining_secs: 1 });

    let fire = monitor.poll(&idle, t0 + Duration::seconds(threshold));
    assert_eq!(
        fire.decision,
        PollDecision::TriggerAction(ActionKind::CloseSteam)
    );

    for extra in 1..10 {
        let result = monitor.poll(&idle, t0 + Duration::seconds(threshold + extra));
        assert_eq!(result.decision, PollDecision::NoOp);
    }
}

#[test]
fn test_success_silences_until_reset() {
    let mut monitor = InactivityMonitor::new(5, ActionKind::CloseSteam);
    monitor.set_enabled(true);
    let t0 = at("2026-05-10T08:00:00Z");
    let idle = snapshot(&[]);

    monitor.poll(&idle, t0);
    assert!(monitor
        .poll(&idle, t0 + Duration::seconds(5))
        .triggered()
        .is_some());
    monitor.on_action_result(true);

    for offset in 6..100 {
        let result = monitor.poll(&idle, t0 + Duration::seconds(offset));
        assert_eq!(result.decision, PollDecision::NoOp);
    }

    monitor.set_enabled(false);
    monitor.set_enabled(true);
    let t1 = t0 + Duration::seconds(200);
    monitor.poll(&idle, t1);
    assert_eq!(
        monitor.poll(&idle, t1 + Duration::seconds(5)).triggered(),
        Some(ActionKind::CloseSteam)
    );
}

#[test]
fn test_update_settings_rearms_after_success() {
    let mut monitor = InactivityMonitor::new(5, ActionKind::CloseSteam);
    monitor.set_enabled(true);
    let t0 = at("2026-05-10T08:00:00Z");
    let idle = snapshot(&[]);

    monitor.poll(&idle, t0);
    monitor.poll(&idle, t0 + Duration::seconds(5));
    monitor.on_action_result(true);
    assert!(monitor.action_taken());

    monitor.update_settings(10);
    assert!(!monitor.action_taken());
    let t1 = t0 + Duration::seconds(50);
    assert_eq!(
        monitor.poll(&idle, t1).status,
        MonitorStatus::TimerStarted { remaining_secs: 10 }
    );
}

#[test]
fn test_invalid_thresholds_fall_back_to_default() {
    let mut monitor = InactivityMonitor::new(60, ActionKind::CloseSteam);
    monitor.update_settings(0);
    assert_eq!(monitor.inactivity_threshold_secs(), 300);
    monitor.update_settings(-5);
    assert_eq!(monitor.inactivity_threshold_secs(), 300);

    let monitor = InactivityMonitor::new(0, ActionKind::CloseSteam);
    assert_eq!(monitor.inactivity_threshold_secs(), 300);
}

#[test]
fn test_status_text_lists_downloads() {
    let mut monitor = InactivityMonitor::new(60, ActionKind::CloseSteam);
    monitor.set_enabled(true);
    let result = monitor.poll(
        &snapshot(&[("570", "Dota 2"), ("620", "Portal 2")]),
        at("2026-05-10T08:00:00Z"),
    );
    assert_eq!(
        result.status_text(),
        "Active downloads:\n• Dota 2\n• Portal 2"
    );
}
