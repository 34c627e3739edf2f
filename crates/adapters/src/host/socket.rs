// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket-backed host adapter.
//!
//! Speaks line-delimited JSON-RPC 2.0 over the host's Unix socket. A reader
//! task routes responses (messages carrying an `id`) to their waiting
//! request and forwards id-less messages to the notification channel handed
//! out at connect time.

use super::{HostAdapter, RequestError};
use async_trait::async_trait;
use nfo_core::Notification;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Sender name the host uses for its own bus events. Events from any other
/// sender are delivered in their `Other.`-prefixed receive form.
const HOST_SENDER: &str = "xbmc";

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;

/// Host adapter over a Unix socket.
pub struct SocketHost {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    pending: PendingMap,
    next_id: AtomicU64,
}

impl SocketHost {
    /// Connect to the host socket.
    ///
    /// Returns the adapter and the channel inbound bus notifications are
    /// delivered on. The channel closes when the host hangs up.
    pub async fn connect(
        path: &Path,
    ) -> io::Result<(Self, mpsc::Receiver<Notification>)> {
        let stream = UnixStream::connect(path).await?;
        let (read_half, write_half) = stream.into_split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (notify_tx, notify_rx) = mpsc::channel(256);

        tokio::spawn(read_loop(read_half, notify_tx, Arc::clone(&pending)));

        Ok((
            Self {
                writer: tokio::sync::Mutex::new(write_half),
                pending,
                next_id: AtomicU64::new(1),
            },
            notify_rx,
        ))
    }
}

async fn read_loop(
    read_half: OwnedReadHalf,
    notify_tx: mpsc::Sender<Notification>,
    pending: PendingMap,
) {
    let mut lines = BufReader::new(read_half).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "host socket read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let message: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "discarding unparseable host message");
                continue;
            }
        };

        if let Some(id) = message.get("id").and_then(Value::as_u64) {
            let waiter = pending.lock().remove(&id);
            match waiter {
                Some(tx) => {
                    let _ = tx.send(message);
                }
                None => debug!(id, "response for unknown request id"),
            }
            continue;
        }

        // Id-less message: a bus notification.
        let Some(method) = message.get("method").and_then(Value::as_str) else {
            continue;
        };
        let params = message.get("params").cloned().unwrap_or(Value::Null);
        let sender = params
            .get("sender")
            .and_then(Value::as_str)
            .unwrap_or(HOST_SENDER);
        let data = params.get("data").cloned().unwrap_or(Value::Null);

        let method = if sender == HOST_SENDER {
            method.to_string()
        } else {
            format!("Other.{method}")
        };

        if notify_tx
            .send(Notification::new(method, data))
            .await
            .is_err()
        {
            // Receiver gone; the service is shutting down.
            break;
        }
    }

    // Fail any requests still waiting for a response.
    pending.lock().clear();
}

#[async_trait]
impl HostAdapter for SocketHost {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RequestError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let mut line = envelope.to_string();
        line.push('\n');
        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                self.pending.lock().remove(&id);
                return Err(RequestError::Transport {
                    method: method.to_string(),
                    message: e.to_string(),
                });
            }
        }

        let response = rx.await.map_err(|_| RequestError::Transport {
            method: method.to_string(),
            message: "connection closed before response".to_string(),
        })?;

        if let Some(error) = response.get("error") {
            return Err(RequestError::Host {
                method: method.to_string(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
