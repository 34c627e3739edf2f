// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use nfo_adapters::FakeHost;
use std::time::{Duration, Instant};

#[test]
fn wheel_fires_and_forgets() {
    let mut wheel = TimerWheel::new();
    let now = Instant::now();

    wheel.set("a", Duration::from_secs(10), now);
    wheel.set("b", Duration::from_secs(30), now);
    assert!(wheel.is_armed("a"));
    assert_eq!(wheel.next_deadline(), Some(now + Duration::from_secs(10)));

    let fired = wheel.fired(now + Duration::from_secs(15));
    assert_eq!(fired, vec!["a".to_string()]);
    assert!(!wheel.is_armed("a"));
    assert!(wheel.is_armed("b"));
}

#[test]
fn wheel_cancel_removes_the_deadline() {
    let mut wheel = TimerWheel::new();
    let now = Instant::now();
    wheel.set("a", Duration::from_secs(10), now);
    wheel.cancel("a");
    assert!(wheel.fired(now + Duration::from_secs(60)).is_empty());
    assert_eq!(wheel.next_deadline(), None);
}

#[test]
fn alarm_arms_and_cancels() {
    let mut wheel = TimerWheel::new();
    let now = Instant::now();
    let mut alarm = Alarm::new("nfosync.play_wait", BusMethod::WaitDone);

    assert!(!alarm.is_active());
    alarm.set(&mut wheel, 5, now);
    assert!(alarm.is_active());
    assert_eq!(alarm.minutes(), 5);
    assert_eq!(
        wheel.next_deadline(),
        Some(now + Duration::from_secs(5 * 60))
    );

    alarm.cancel(&mut wheel);
    assert!(!alarm.is_active());
    assert!(!wheel.is_armed("nfosync.play_wait"));
}

#[test]
fn alarm_set_zero_only_cancels() {
    let mut wheel = TimerWheel::new();
    let mut alarm = Alarm::new("nfosync.play_wait", BusMethod::WaitDone);
    alarm.set(&mut wheel, 5, Instant::now());
    alarm.set(&mut wheel, 0, Instant::now());
    assert!(!alarm.is_active());
    assert!(!wheel.is_armed("nfosync.play_wait"));
}

#[tokio::test]
async fn fire_emits_alarm_notification_then_rebroadcasts() {
    let (host, mut bus) = FakeHost::new();
    let mut wheel = TimerWheel::new();
    let now = Instant::now();
    let mut alarm = Alarm::new("nfosync.play_wait", BusMethod::WaitDone);
    alarm.set(&mut wheel, 5, now);

    // The wheel fires: the alarm emits its internal fire notification.
    alarm.on_fired(&mut wheel, &host, now).await;
    let note = bus.recv().await.unwrap();
    assert_eq!(note.method, "Other.nfosync.Alarm");
    assert_eq!(note.data["name"], "nfosync.play_wait");

    // Observing its own fire rebroadcasts the configured message and
    // deactivates the single-shot alarm.
    assert!(alarm.on_notification(&note.method, &note.data, &host).await);
    let rebroadcast = bus.recv().await.unwrap();
    assert_eq!(rebroadcast.method, "Other.nfosync.WaitDone");
    assert!(!alarm.is_active());
}

#[tokio::test]
async fn other_alarms_fires_are_ignored() {
    let (host, _bus) = FakeHost::new();
    let mut wheel = TimerWheel::new();
    let mut alarm = Alarm::new("nfosync.play_wait", BusMethod::WaitDone);
    alarm.set(&mut wheel, 5, Instant::now());

    let data = serde_json::json!({"name": "nfosync.periodic_trigger"});
    assert!(!alarm.on_notification("Other.nfosync.Alarm", &data, &host).await);
    assert!(alarm.is_active());
}

#[tokio::test]
async fn looping_alarm_stays_active_and_rearms() {
    let (host, mut bus) = FakeHost::new();
    let mut wheel = TimerWheel::new();
    let now = Instant::now();
    let mut alarm = Alarm::new(
        "nfosync.periodic_trigger",
        BusMethod::SyncAll,
    )
    .with_data(serde_json::json!({"patient": true}))
    .looping();

    alarm.set(&mut wheel, 60, now);
    let fired_at = now + Duration::from_secs(3600);
    for name in wheel.fired(fired_at) {
        assert_eq!(name, "nfosync.periodic_trigger");
        alarm.on_fired(&mut wheel, &host, fired_at).await;
    }

    // Re-armed for the next period.
    assert_eq!(
        wheel.next_deadline(),
        Some(fired_at + Duration::from_secs(3600))
    );

    let note = bus.recv().await.unwrap();
    assert!(alarm.on_notification(&note.method, &note.data, &host).await);
    assert!(alarm.is_active(), "looping alarm stays active after fire");

    let rebroadcast = bus.recv().await.unwrap();
    assert_eq!(rebroadcast.method, "Other.nfosync.SyncAll");
    assert_eq!(rebroadcast.data["patient"], true);
}
