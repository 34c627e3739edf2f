// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host JSON-RPC adapter.
//!
//! The media host exposes a synchronous request/response JSON-RPC surface
//! and a broadcast bus. Requests either return a result or surface a
//! [`RequestError`]; bus traffic arrives out-of-band on a notification
//! channel owned by whoever connected the adapter.

mod socket;

pub use socket::SocketHost;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHost;

use async_trait::async_trait;
use nfo_core::BUS_SENDER;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors from host requests.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("transport failure for {method}: {message}")]
    Transport { method: String, message: String },
    #[error("host rejected {method} ({code}): {message}")]
    Host {
        method: String,
        code: i64,
        message: String,
    },
    #[error("malformed response for {method}: {message}")]
    Malformed { method: String, message: String },
}

/// Adapter over the host's JSON-RPC endpoint.
#[async_trait]
pub trait HostAdapter: Send + Sync {
    /// Issue a request and return its `result` member.
    async fn request(&self, method: &str, params: Value) -> Result<Value, RequestError>;

    /// Broadcast an internal message on the host bus.
    ///
    /// The bus echoes it back to every listener, this process included.
    async fn notify(&self, method: &str, data: Value) -> Result<(), RequestError> {
        self.request(
            "JSONRPC.NotifyAll",
            json!({
                "sender": BUS_SENDER,
                "message": method,
                "data": data,
            }),
        )
        .await
        .map(|_| ())
    }
}
