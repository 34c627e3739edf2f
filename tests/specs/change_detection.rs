//! Change detection: import precedence, both-sides ordering, echo
//! suppression.

use crate::prelude::*;
use chrono::TimeZone;
use nfo_core::{BusMethod, Clock, MediaItem, MediaType};
use nfo_engine::{MediaGateway, MediaInfo};
use nfo_storage::{LastKnown, Timestamps};
use serde_json::json;
use std::sync::Arc;

/// Current checksum of the scripted movie, computed the way the engine
/// computes it.
async fn checksum_of(host: &nfo_adapters::FakeHost, item: MediaItem) -> u32 {
    let gateway = MediaGateway::new(Arc::new(host.clone()));
    let mut info = MediaInfo::new(item);
    info.checksum(&gateway).await.unwrap()
}

#[tokio::test]
async fn newer_sidecar_imports_without_exporting() {
    let media_file = "/m/a.mkv".to_string();

    // Seed the stores: the checksum matches the host, so only the sidecar
    // side has changed.
    let (seed_host, _rx) = nfo_adapters::FakeHost::new();
    script_one_movie(&seed_host, 1, &media_file, "A Movie");
    let checksum = checksum_of(
        &seed_host,
        MediaItem::with_file(MediaType::Movie, 1, &media_file),
    )
    .await;

    let mut spec = spec_with_seed(
        |s| s.triggers.sync_on_start = true,
        |profile, _clock| {
            let mut last_known = LastKnown::load(profile).unwrap();
            last_known.set_checksum(MediaType::Movie, 1, checksum);
            last_known.write_changes().unwrap();

            let now = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let mut timestamps = Timestamps::load(profile, now);
            timestamps.set_last_sync(now).unwrap();
        },
    );
    script_one_movie(&spec.host, 1, &media_file, "A Movie");
    script_sidecar_mtime(&spec.host, "2024-02-01 00:00:00");

    let start = spec.clock.now_utc();
    spec.service.start().await;

    // The sync suspended on the import's completion event.
    assert!(!spec.service.is_idle());
    assert_eq!(spec.request_count("VideoLibrary.RefreshMovie"), 1);

    // The host removes and re-inserts the row; the removal completes the
    // refresh.
    spec.notify_service("VideoLibrary.OnRemove", json!({"id": 1, "type": "movie"}))
        .await;
    assert!(spec.service.is_idle());

    // No export happened: the item's details were fetched once for change
    // detection and never again for an export pass.
    assert_eq!(spec.request_count("VideoLibrary.GetMovieDetails"), 1);
    // The watermark advanced to the walk's start.
    let timestamps = Timestamps::load(spec.profile.path(), spec.clock.now_utc());
    assert!(timestamps.last_sync() >= start);
}

#[tokio::test]
async fn both_sides_changed_import_first_preserves_disk_tags() {
    let mut spec = spec(|s| {
        s.triggers.sync_on_start = true;
        s.sync.should_import_first = true;
    });
    let media_dir = spec.media_dir();
    let file = media_dir.join("a.mkv").to_string_lossy().into_owned();
    let nfo = media_dir.join("movie.nfo");
    std::fs::write(&nfo, "<movie><title>On disk</title></movie>").unwrap();

    script_one_movie(&spec.host, 1, &file, "A Movie");
    script_sidecar_mtime(&spec.host, "2024-02-01 00:00:00");
    // No last-known record and last_sync == clock start: both sides count
    // as changed.

    spec.service.start().await;

    // Import runs first: the sidecar is untouched while suspended.
    assert!(!spec.service.is_idle());
    assert_eq!(spec.request_count("VideoLibrary.RefreshMovie"), 1);
    assert_eq!(
        std::fs::read_to_string(&nfo).unwrap(),
        "<movie><title>On disk</title></movie>"
    );

    spec.notify_service("VideoLibrary.OnRemove", json!({"id": 1, "type": "movie"}))
        .await;
    assert!(spec.service.is_idle());

    // The follow-up export preserved what the refresh just injected and
    // only appended what the sidecar lacked.
    let written = std::fs::read_to_string(&nfo).unwrap();
    assert!(written.contains("<title>On disk</title>"));
    assert!(written.contains("<playcount>1</playcount>"));
}

#[tokio::test]
async fn add_update_echo_prevents_a_spurious_export() {
    let mut spec = spec(|_| {});
    let media_dir = spec.media_dir();
    let file = media_dir.join("a.mkv").to_string_lossy().into_owned();

    script_one_movie(&spec.host, 7, &file, "A Movie");
    script_no_sidecars(&spec.host);
    spec.service.start().await;

    // A refresh-caused echo arrives for a library addition.
    spec.notify_service(
        "VideoLibrary.OnUpdate",
        json!({ "item": { "type": "movie", "id": 7 }, "added": true, "transaction": false }),
    )
    .await;
    assert!(spec.service.is_idle(), "the echo must not queue an export");

    // A subsequent full sync sees the pinned checksum and exports nothing.
    spec.notify_service(BusMethod::SyncAll.recv(), json!({ "patient": false }))
        .await;
    assert!(spec.service.is_idle());
    assert!(!media_dir.join("movie.nfo").exists());
    assert!(!media_dir.join("a.nfo").exists());
}
