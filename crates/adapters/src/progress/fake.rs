// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake progress sink for testing

use super::ProgressSink;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded progress event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Begin(String),
    Update {
        message: String,
        position: usize,
        total: usize,
    },
    Close,
}

#[derive(Default)]
struct FakeProgressState {
    events: Vec<ProgressEvent>,
    /// Report canceled once this many updates have been recorded.
    cancel_after_updates: Option<usize>,
    updates_seen: usize,
}

/// Shared handle for inspecting and scripting a [`FakeProgress`].
#[derive(Clone, Default)]
pub struct FakeProgressHandle {
    state: Arc<Mutex<FakeProgressState>>,
}

impl FakeProgressHandle {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.state.lock().events.clone()
    }

    pub fn was_closed(&self) -> bool {
        self.state
            .lock()
            .events
            .iter()
            .any(|e| *e == ProgressEvent::Close)
    }

    /// Script a user cancel after `n` updates have been reported.
    pub fn cancel_after_updates(&self, n: usize) {
        self.state.lock().cancel_after_updates = Some(n);
    }
}

/// Fake progress sink recording every call.
#[derive(Default)]
pub struct FakeProgress {
    handle: FakeProgressHandle,
}

impl FakeProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> FakeProgressHandle {
        self.handle.clone()
    }
}

impl ProgressSink for FakeProgress {
    fn begin(&mut self, heading: &str) {
        self.handle
            .state
            .lock()
            .events
            .push(ProgressEvent::Begin(heading.to_string()));
    }

    fn update(&mut self, message: &str, position: usize, total: usize) {
        let mut state = self.handle.state.lock();
        state.updates_seen += 1;
        state.events.push(ProgressEvent::Update {
            message: message.to_string(),
            position,
            total,
        });
    }

    fn close(&mut self) {
        self.handle.state.lock().events.push(ProgressEvent::Close);
    }

    fn is_canceled(&self) -> bool {
        let state = self.handle.state.lock();
        match state.cancel_after_updates {
            Some(n) => state.updates_seen >= n,
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
