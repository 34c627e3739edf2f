//! Play-avoidance gating of patient work.

use crate::prelude::*;
use nfo_core::BusMethod;
use serde_json::json;
use std::time::Duration;

fn playing() -> serde_json::Value {
    json!([{ "playerid": 1, "type": "video" }])
}

#[tokio::test]
async fn patient_sync_waits_for_playback_and_the_post_stop_delay() {
    let mut spec = spec(|s| {
        s.avoidance.is_enabled = true;
        s.avoidance.wait_time = 5;
    });
    spec.service.start().await;
    spec.host.set_response("Player.GetActivePlayers", playing());

    // A periodic patient sync arrives mid-playback: queued, not started.
    spec.notify_service(BusMethod::SyncAll.recv(), json!({ "patient": true }))
        .await;
    assert_eq!(spec.request_count("VideoLibrary.GetMovies"), 0);
    assert!(!spec.service.is_idle());

    // Playback stops: the post-stop wait keeps the gate closed.
    spec.host
        .set_response("Player.GetActivePlayers", json!([]));
    spec.notify_service("Player.OnStop", json!({})).await;
    assert_eq!(spec.request_count("VideoLibrary.GetMovies"), 0);

    // The wait elapses; WaitDone opens the gate and the sync begins.
    spec.clock.advance(Duration::from_secs(5 * 60));
    spec.service.on_timer_deadline().await;
    spec.pump().await;
    assert_eq!(spec.request_count("VideoLibrary.GetMovies"), 1);
    assert!(spec.service.is_idle());
}

#[tokio::test]
async fn replay_cancels_the_post_stop_wait() {
    let mut spec = spec(|s| {
        s.avoidance.is_enabled = true;
        s.avoidance.wait_time = 5;
    });
    spec.service.start().await;
    spec.host.set_response("Player.GetActivePlayers", playing());

    spec.notify_service(BusMethod::SyncAll.recv(), json!({ "patient": true }))
        .await;
    spec.notify_service("Player.OnStop", json!({})).await;

    // Playback resumes before the wait elapses: the wait is canceled and
    // the gate stays closed.
    spec.notify_service("Player.OnPlay", json!({})).await;
    assert_eq!(spec.service.next_deadline(), None);

    spec.clock.advance(Duration::from_secs(60 * 60));
    spec.service.on_timer_deadline().await;
    spec.pump().await;
    assert_eq!(spec.request_count("VideoLibrary.GetMovies"), 0);
}

#[tokio::test]
async fn urgent_work_ignores_playback() {
    let mut spec = spec(|s| {
        s.avoidance.is_enabled = true;
        s.avoidance.wait_time = 5;
    });
    spec.service.start().await;
    spec.host.set_response("Player.GetActivePlayers", playing());

    spec.notify_service(BusMethod::SyncAll.recv(), json!({ "patient": false }))
        .await;
    assert_eq!(spec.request_count("VideoLibrary.GetMovies"), 1);
    assert!(spec.service.is_idle());
}
