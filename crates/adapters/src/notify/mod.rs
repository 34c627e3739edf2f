// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User notification adapters

mod desktop;
mod noop;

pub use desktop::DesktopNotify;
pub use noop::NoOpNotify;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotify, NotifyCall};

use async_trait::async_trait;

/// Adapter for surfacing a message to the user.
#[async_trait]
pub trait NotifyAdapter: Send + Sync {
    /// Send a notification with a title and message body
    async fn notify(&self, title: &str, message: &str);
}
