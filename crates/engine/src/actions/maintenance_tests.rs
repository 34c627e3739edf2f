// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::test_ctx;
use nfo_core::MediaType;
use serde_json::json;

#[tokio::test]
async fn clean_requests_then_awaits_then_completes() {
    let mut t = test_ctx();
    t.host.set_response("VideoLibrary.Clean", json!("OK"));

    let mut clean = Clean::new();
    let done = clean.run(&mut t.ctx, None).await.unwrap();
    assert!(!done);
    assert_eq!(
        clean.awaiting().map(|e| e.method.as_str()),
        Some("VideoLibrary.OnCleanFinished")
    );
    let (method, params) = t.host.requests().remove(0);
    assert_eq!(method, "VideoLibrary.Clean");
    assert_eq!(params["showdialogs"], false);

    let done = clean.run(&mut t.ctx, Some(&json!({}))).await.unwrap();
    assert!(done);
    assert!(clean.awaiting().is_none());
}

#[tokio::test]
async fn scan_awaits_scan_finished() {
    let mut t = test_ctx();
    t.host.set_response("VideoLibrary.Scan", json!("OK"));

    let mut scan = Scan::new();
    assert!(!scan.run(&mut t.ctx, None).await.unwrap());
    assert_eq!(
        scan.awaiting().map(|e| e.method.as_str()),
        Some("VideoLibrary.OnScanFinished")
    );
}

#[tokio::test]
async fn clean_surfaces_host_errors() {
    let mut t = test_ctx();
    t.host.fail_method("VideoLibrary.Clean", "host gone");

    let mut clean = Clean::new();
    assert!(clean.run(&mut t.ctx, None).await.is_err());
}

#[tokio::test]
async fn write_changes_flushes_stores() {
    let mut t = test_ctx();
    t.ctx.last_known.set_checksum(MediaType::Movie, 1, 42);

    let mut write = WriteChanges::new();
    assert!(write.run(&mut t.ctx, None).await.unwrap());
    assert!(t.dir.path().join("movies.dat").exists());
}
