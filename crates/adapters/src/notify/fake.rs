// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing

use super::NotifyAdapter;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCall {
    pub title: String,
    pub message: String,
}

/// Fake notification adapter for testing
#[derive(Clone, Default)]
pub struct FakeNotify {
    calls: Arc<Mutex<Vec<NotifyCall>>>,
}

impl FakeNotify {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().clone()
    }

    /// Message bodies of all recorded notifications
    pub fn messages(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.message.clone()).collect()
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotify {
    async fn notify(&self, title: &str, message: &str) {
        self.calls.lock().push(NotifyCall {
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
