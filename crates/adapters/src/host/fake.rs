// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake host adapter for testing

use super::{HostAdapter, RequestError};
use async_trait::async_trait;
use nfo_core::Notification;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;

struct FakeHostState {
    /// One-shot responses consumed FIFO per method.
    queued: HashMap<String, VecDeque<Value>>,
    /// Sticky responses used when the queue for a method is empty.
    canned: HashMap<String, Value>,
    /// Methods that fail with a transport error.
    failing: HashMap<String, String>,
    /// Every request issued, in order.
    requests: Vec<(String, Value)>,
}

/// Fake host adapter.
///
/// Requests are answered from scripted responses and recorded. Outbound
/// bus messages loop back onto the notification channel in their
/// `Other.`-prefixed receive form, mirroring the real bus.
#[derive(Clone)]
pub struct FakeHost {
    state: Arc<Mutex<FakeHostState>>,
    notify_tx: mpsc::UnboundedSender<Notification>,
}

impl FakeHost {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        (
            Self {
                state: Arc::new(Mutex::new(FakeHostState {
                    queued: HashMap::new(),
                    canned: HashMap::new(),
                    failing: HashMap::new(),
                    requests: Vec::new(),
                })),
                notify_tx,
            },
            notify_rx,
        )
    }

    /// Queue a one-shot response for `method`.
    pub fn push_response(&self, method: &str, response: Value) {
        self.state
            .lock()
            .queued
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    /// Set the sticky response used whenever no queued response remains.
    pub fn set_response(&self, method: &str, response: Value) {
        self.state
            .lock()
            .canned
            .insert(method.to_string(), response);
    }

    /// Make `method` fail with a transport error.
    pub fn fail_method(&self, method: &str, message: &str) {
        self.state
            .lock()
            .failing
            .insert(method.to_string(), message.to_string());
    }

    /// Deliver a notification as if the host had broadcast it.
    pub fn push_notification(&self, method: &str, data: Value) {
        let _ = self.notify_tx.send(Notification::new(method, data));
    }

    /// All requests issued so far.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.state.lock().requests.clone()
    }

    /// Methods of all requests issued so far.
    pub fn request_methods(&self) -> Vec<String> {
        self.state
            .lock()
            .requests
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }
}

#[async_trait]
impl HostAdapter for FakeHost {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RequestError> {
        let response = {
            let mut state = self.state.lock();
            state.requests.push((method.to_string(), params.clone()));

            if let Some(message) = state.failing.get(method) {
                return Err(RequestError::Transport {
                    method: method.to_string(),
                    message: message.clone(),
                });
            }

            let queued = state.queued.get_mut(method).and_then(VecDeque::pop_front);
            match queued {
                Some(response) => Some(response),
                None => state.canned.get(method).cloned(),
            }
        };

        // Loop outbound bus messages back to the notification channel.
        if method == "JSONRPC.NotifyAll" {
            let message = params
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let data = params.get("data").cloned().unwrap_or(Value::Null);
            let _ = self
                .notify_tx
                .send(Notification::new(format!("Other.{message}"), data));
            return Ok(json!("OK"));
        }

        match response {
            Some(value) => Ok(value),
            None => Err(RequestError::Transport {
                method: method.to_string(),
                message: "no scripted response".to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
