//! Dedup of bulk actions under event storms.

use crate::prelude::*;
use nfo_core::BusMethod;
use serde_json::json;

#[tokio::test]
async fn repeated_sync_all_requests_collapse_to_one() {
    let mut spec = spec(|s| s.sync.should_clean = true);
    spec.host.set_response("VideoLibrary.Clean", json!("OK"));
    spec.service.start().await;

    // The first sync starts and suspends awaiting the clean.
    spec.notify_service(BusMethod::SyncAll.recv(), json!({ "patient": false }))
        .await;
    assert_eq!(spec.request_count("VideoLibrary.Clean"), 1);

    // Two more requests arrive while it is still active: dropped silently.
    spec.notify_service(BusMethod::SyncAll.recv(), json!({ "patient": false }))
        .await;
    spec.notify_service(BusMethod::SyncAll.recv(), json!({ "patient": true }))
        .await;

    // The clean finishes; the one sync runs to completion and nothing else
    // remains.
    spec.notify_service("VideoLibrary.OnCleanFinished", json!({})).await;
    assert!(spec.service.is_idle());
    assert_eq!(spec.request_count("VideoLibrary.Clean"), 1);
    assert_eq!(spec.request_count("VideoLibrary.GetMovies"), 1);
}

#[tokio::test]
async fn different_bulk_kinds_do_not_dedup_each_other() {
    let mut spec = spec(|s| s.sync.should_clean = true);
    spec.host.set_response("VideoLibrary.Clean", json!("OK"));
    script_no_sidecars(&spec.host);
    spec.host.set_response("VideoLibrary.RefreshMovie", json!("OK"));
    spec.host.set_response("JSONRPC.Ping", json!("pong"));
    spec.service.start().await;

    spec.notify_service(BusMethod::SyncAll.recv(), json!({ "patient": false }))
        .await;
    // An import-all queues behind the active sync-all.
    spec.notify_service(BusMethod::ImportAll.recv(), json!({ "patient": false }))
        .await;
    assert!(!spec.service.is_idle());

    spec.notify_service("VideoLibrary.OnCleanFinished", json!({})).await;
    assert!(spec.service.is_idle());
    // Both bulk runs walked the library.
    assert_eq!(spec.request_count("VideoLibrary.GetMovies"), 2);
}
