//! Test helpers for behavioral specifications.

#![allow(dead_code)]

use nfo_adapters::{FakeHost, FakeNotify, FakeProgress};
use nfo_core::{Clock, FakeClock, Notification, Settings};
use nfo_engine::{ActionCtx, MediaGateway};
use nfo_service::Service;
use nfo_storage::{LastKnown, Timestamps};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub struct Spec {
    pub service: Service,
    pub host: FakeHost,
    pub notify: FakeNotify,
    pub clock: FakeClock,
    pub bus: UnboundedReceiver<Notification>,
    pub profile: tempfile::TempDir,
}

/// Build a service over a fake host and a fresh profile directory.
///
/// `seed` runs against the profile directory before the stores are loaded,
/// so it can plant `.dat` files, `timestamps.json`, or media files.
pub fn spec_with_seed(
    configure: impl FnOnce(&mut Settings),
    seed: impl FnOnce(&std::path::Path, &FakeClock),
) -> Spec {
    let profile = tempfile::tempdir().unwrap();
    let (host, bus) = FakeHost::new();
    let notify = FakeNotify::new();
    let clock = FakeClock::new();

    seed(profile.path(), &clock);

    let mut settings = Settings::default();
    configure(&mut settings);

    let ctx = ActionCtx {
        gateway: MediaGateway::new(Arc::new(host.clone())),
        last_known: LastKnown::load(profile.path()).unwrap(),
        timestamps: Timestamps::load(profile.path(), clock.now_utc()),
        settings,
        notifier: Arc::new(notify.clone()),
        progress: Box::new(FakeProgress::new()),
        clock: Arc::new(clock.clone()),
        export_failures: 0,
    };

    let spec = Spec {
        service: Service::new(ctx),
        host,
        notify,
        clock,
        bus,
        profile,
    };
    script_empty_library(&spec.host);
    spec.host
        .set_response("Player.GetActivePlayers", json!([]));
    spec
}

pub fn spec(configure: impl FnOnce(&mut Settings)) -> Spec {
    spec_with_seed(configure, |_, _| {})
}

impl Spec {
    /// Deliver every pending loopback notification back into the service.
    pub async fn pump(&mut self) {
        while let Ok(note) = self.bus.try_recv() {
            self.service.on_notification(&note).await;
        }
    }

    pub async fn notify_service(&mut self, method: &str, data: serde_json::Value) {
        self.service
            .on_notification(&Notification::new(method, data))
            .await;
    }

    /// Count of requests issued for `method`.
    pub fn request_count(&self, method: &str) -> usize {
        self.host
            .request_methods()
            .iter()
            .filter(|m| *m == method)
            .count()
    }

    /// Directory for fake media files inside the profile.
    pub fn media_dir(&self) -> std::path::PathBuf {
        let dir = self.profile.path().join("media");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}

pub fn script_empty_library(host: &FakeHost) {
    host.set_response("VideoLibrary.GetMovies", json!({ "movies": [] }));
    host.set_response("VideoLibrary.GetTVShows", json!({ "tvshows": [] }));
    host.set_response("VideoLibrary.GetEpisodes", json!({ "episodes": [] }));
}

/// Script one movie with canned details and no art.
pub fn script_one_movie(host: &FakeHost, id: u32, file: &str, title: &str) {
    host.set_response(
        "VideoLibrary.GetMovies",
        json!({ "movies": [{ "movieid": id, "file": file }] }),
    );
    host.set_response(
        "VideoLibrary.GetMovieDetails",
        json!({ "moviedetails": { "title": title, "setid": 0, "playcount": 1 } }),
    );
    host.set_response(
        "VideoLibrary.GetAvailableArt",
        json!({ "availableart": [] }),
    );
    host.set_response("VideoLibrary.RefreshMovie", json!("OK"));
    host.set_response("JSONRPC.Ping", json!("pong"));
}

/// Script the sidecar stat to always miss.
pub fn script_no_sidecars(host: &FakeHost) {
    host.set_response("Files.GetFileDetails", json!({}));
}

/// Script the sidecar stat to always report `mtime`.
pub fn script_sidecar_mtime(host: &FakeHost, mtime: &str) {
    host.set_response(
        "Files.GetFileDetails",
        json!({ "filedetails": { "lastmodified": mtime } }),
    );
}
