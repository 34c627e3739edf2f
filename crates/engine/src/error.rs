// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use nfo_adapters::RequestError;
use nfo_core::messages;
use nfo_storage::{StoreError, TimestampsError};
use thiserror::Error;

/// A graceful, reportable action failure.
///
/// `code` identifies the user-facing message in the catalog; phased actions
/// wrap bubbled errors with their own contextual code while preserving the
/// underlying message for the log.
#[derive(Debug, Error)]
#[error("action failed ({code}): {message}")]
pub struct ActionError {
    pub code: u32,
    pub message: String,
}

impl ActionError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Replace the notification code with an enclosing action's context.
    pub fn wrap(self, code: u32) -> Self {
        Self {
            code,
            message: self.message,
        }
    }
}

impl From<RequestError> for ActionError {
    fn from(e: RequestError) -> Self {
        Self::new(messages::MSG_SYNC_FAILED, e.to_string())
    }
}

impl From<StoreError> for ActionError {
    fn from(e: StoreError) -> Self {
        Self::new(messages::MSG_SYNC_FAILED, e.to_string())
    }
}

impl From<TimestampsError> for ActionError {
    fn from(e: TimestampsError) -> Self {
        Self::new(messages::MSG_TIMESTAMPS_WRITE_FAILED, e.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
