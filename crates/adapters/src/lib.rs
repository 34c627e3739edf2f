// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters between the nfosync engine and the outside world: the host's
//! JSON-RPC endpoint, user notifications, and progress reporting.

pub mod host;
pub mod notify;
pub mod progress;

pub use host::{HostAdapter, RequestError, SocketHost};
pub use notify::{DesktopNotify, NoOpNotify, NotifyAdapter};
pub use progress::{LogProgress, ProgressSink};

#[cfg(any(test, feature = "test-support"))]
pub use host::FakeHost;
#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotify;
#[cfg(any(test, feature = "test-support"))]
pub use progress::{FakeProgress, FakeProgressHandle};
