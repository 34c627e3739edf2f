// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for engine tests.
#![allow(clippy::unwrap_used)]

use crate::actions::ActionCtx;
use crate::gateway::MediaGateway;
use nfo_adapters::{FakeHost, FakeNotify, FakeProgress, FakeProgressHandle};
use nfo_core::{Clock, FakeClock, Notification, Settings};
use nfo_storage::{LastKnown, Timestamps};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub struct TestCtx {
    pub ctx: ActionCtx,
    pub host: FakeHost,
    pub notify: FakeNotify,
    pub progress: FakeProgressHandle,
    pub clock: FakeClock,
    pub bus: UnboundedReceiver<Notification>,
    // Held for the profile directory's lifetime.
    pub dir: tempfile::TempDir,
}

pub fn test_ctx() -> TestCtx {
    let dir = tempfile::tempdir().unwrap();
    let (host, bus) = FakeHost::new();
    let notify = FakeNotify::new();
    let progress = FakeProgress::new();
    let progress_handle = progress.handle();
    let clock = FakeClock::new();

    let ctx = ActionCtx {
        gateway: MediaGateway::new(Arc::new(host.clone())),
        last_known: LastKnown::load(dir.path()).unwrap(),
        timestamps: Timestamps::load(dir.path(), clock.now_utc()),
        settings: Settings::default(),
        notifier: Arc::new(notify.clone()),
        progress: Box::new(progress),
        clock: Arc::new(clock.clone()),
        export_failures: 0,
    };

    TestCtx {
        ctx,
        host,
        notify,
        progress: progress_handle,
        clock,
        bus,
        dir,
    }
}

pub type ProbeLog = Arc<std::sync::Mutex<Vec<String>>>;

pub fn probe_log() -> ProbeLog {
    Arc::new(std::sync::Mutex::new(Vec::new()))
}

pub enum ProbeStep {
    Done,
    Suspend(crate::actions::Expected),
    Fail(u32),
}

/// Scripted action for scheduler and phased-driver tests.
pub struct Probe {
    kind: crate::actions::ActionKind,
    label: String,
    steps: std::collections::VecDeque<ProbeStep>,
    awaiting: Option<crate::actions::Expected>,
    log: ProbeLog,
}

impl Probe {
    pub fn new(
        kind: crate::actions::ActionKind,
        label: &str,
        steps: Vec<ProbeStep>,
        log: &ProbeLog,
    ) -> Box<Self> {
        Box::new(Self {
            kind,
            label: label.to_string(),
            steps: steps.into(),
            awaiting: None,
            log: Arc::clone(log),
        })
    }
}

#[async_trait::async_trait]
impl crate::actions::Action for Probe {
    fn kind(&self) -> crate::actions::ActionKind {
        self.kind
    }

    fn awaiting(&self) -> Option<&crate::actions::Expected> {
        self.awaiting.as_ref()
    }

    async fn run(
        &mut self,
        _ctx: &mut ActionCtx,
        event: Option<&serde_json::Value>,
    ) -> Result<bool, crate::error::ActionError> {
        let note = match event {
            Some(data) => format!("{}:run({data})", self.label),
            None => format!("{}:run", self.label),
        };
        self.log.lock().unwrap().push(note);

        match self.steps.pop_front() {
            None | Some(ProbeStep::Done) => {
                self.awaiting = None;
                Ok(true)
            }
            Some(ProbeStep::Suspend(expected)) => {
                self.awaiting = Some(expected);
                Ok(false)
            }
            Some(ProbeStep::Fail(code)) => {
                self.awaiting = None;
                Err(crate::error::ActionError::new(code, "scripted failure"))
            }
        }
    }
}

/// Script an empty library on all three list methods.
pub fn script_empty_library(host: &FakeHost) {
    host.set_response("VideoLibrary.GetMovies", json!({ "movies": [] }));
    host.set_response("VideoLibrary.GetTVShows", json!({ "tvshows": [] }));
    host.set_response("VideoLibrary.GetEpisodes", json!({ "episodes": [] }));
}

/// Script one movie with canned details and no art.
pub fn script_one_movie(host: &FakeHost, id: u32, file: &str, title: &str) {
    script_empty_library(host);
    host.set_response(
        "VideoLibrary.GetMovies",
        json!({ "movies": [{ "movieid": id, "file": file }] }),
    );
    host.set_response(
        "VideoLibrary.GetMovieDetails",
        json!({ "moviedetails": { "title": title, "setid": 0, "playcount": 0 } }),
    );
    host.set_response(
        "VideoLibrary.GetAvailableArt",
        json!({ "availableart": [] }),
    );
}
