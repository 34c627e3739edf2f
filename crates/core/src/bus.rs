// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal bus methods.
//!
//! The service talks to itself (and the one-shot CLI talks to the service)
//! over the host's broadcast bus: a message sent as `nfosync.<Method>` via
//! `JSONRPC.NotifyAll` is delivered back to every listener as
//! `Other.nfosync.<Method>`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::media::MediaType;

/// Sender name used for all outbound bus messages.
pub const BUS_SENDER: &str = "nfosync";

/// A notification observed on the host bus.
#[derive(Debug, Clone)]
pub struct Notification {
    pub method: String,
    pub data: Value,
}

impl Notification {
    pub fn new(method: impl Into<String>, data: Value) -> Self {
        Self {
            method: method.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusMethod {
    SyncAll,
    SyncOne,
    ImportAll,
    ExportOne,
    ExportAll,
    WaitDone,
    Alarm,
}

impl BusMethod {
    /// Method name used when sending.
    pub fn send(&self) -> &'static str {
        match self {
            BusMethod::SyncAll => "nfosync.SyncAll",
            BusMethod::SyncOne => "nfosync.SyncOne",
            BusMethod::ImportAll => "nfosync.ImportAll",
            BusMethod::ExportOne => "nfosync.ExportOne",
            BusMethod::ExportAll => "nfosync.ExportAll",
            BusMethod::WaitDone => "nfosync.WaitDone",
            BusMethod::Alarm => "nfosync.Alarm",
        }
    }

    /// Method name the bus delivers back to listeners.
    pub fn recv(&self) -> &'static str {
        match self {
            BusMethod::SyncAll => "Other.nfosync.SyncAll",
            BusMethod::SyncOne => "Other.nfosync.SyncOne",
            BusMethod::ImportAll => "Other.nfosync.ImportAll",
            BusMethod::ExportOne => "Other.nfosync.ExportOne",
            BusMethod::ExportAll => "Other.nfosync.ExportAll",
            BusMethod::WaitDone => "Other.nfosync.WaitDone",
            BusMethod::Alarm => "Other.nfosync.Alarm",
        }
    }
}

/// Payload for bulk-action bus messages.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PatientPayload {
    #[serde(default)]
    pub patient: bool,
}

/// Payload for single-item bus messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPayload {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub id: u32,
    #[serde(default)]
    pub patient: bool,
}

/// Payload carried by alarm fire notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmPayload {
    pub name: String,
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
