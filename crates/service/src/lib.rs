// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nfo-service: the long-lived sync service.
//!
//! Owns the event loop: bus notifications in, scheduler and alarms driven,
//! persistent state flushed on the way out. The binary (`nfosyncd`) wires
//! the service to the real host socket; tests drive [`Service`] directly.

pub mod service;

pub use service::Service;
