// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Persistent state for the nfosync engine

mod last_known;
mod timestamps;

pub use last_known::{LastKnown, LastKnownRecord, LastKnownStore, StoreError};
pub use timestamps::{schedule_epoch, Timestamps, TimestampsError};
