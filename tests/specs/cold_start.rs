//! Cold start: empty store, one movie, no sidecar.

use crate::prelude::*;
use nfo_core::MovieNfoNaming;
use nfo_storage::LastKnownStore;

#[tokio::test]
async fn cold_start_creates_the_sidecar_and_records_state() {
    let mut spec = spec(|s| {
        s.triggers.sync_on_start = true;
        s.export.can_create_nfo = true;
        s.export.movie_nfo_naming = MovieNfoNaming::Filename;
    });
    let media_dir = spec.media_dir();
    let file = media_dir.join("a.mkv").to_string_lossy().into_owned();

    script_one_movie(&spec.host, 1, &file, "A Movie");
    // No sidecar anywhere before the export: change detection probes both
    // movie.nfo and a.nfo, and the export probes them again before
    // creating. The post-export stat then reports the new file.
    for _ in 0..4 {
        spec.host.push_response("Files.GetFileDetails", serde_json::json!({}));
    }
    script_sidecar_mtime(&spec.host, "2024-01-01 00:05:00");

    spec.service.start().await;
    assert!(spec.service.is_idle());

    // The sidecar was created under the configured filename naming.
    let nfo = media_dir.join("a.nfo");
    let written = std::fs::read_to_string(&nfo).unwrap();
    assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<movie>"));
    assert!(written.contains("<!--Created "));
    assert!(written.contains("<title>A Movie</title>"));

    // One record for id 1 with a checksum and the host-reported mtime.
    let store = LastKnownStore::load(spec.profile.path().join("movies.dat")).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.checksum(1).is_some());
    let expected_mtime = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:05:00Z")
        .unwrap()
        .timestamp() as u64;
    assert_eq!(store.nfo_mtime(1), Some(expected_mtime));
}
