// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op notification adapter, used when notifications are disabled.

use super::NotifyAdapter;
use async_trait::async_trait;

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpNotify;

impl NoOpNotify {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyAdapter for NoOpNotify {
    async fn notify(&self, title: &str, message: &str) {
        tracing::debug!(%title, %message, "notification suppressed");
    }
}
