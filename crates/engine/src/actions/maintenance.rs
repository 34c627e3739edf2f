// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Library maintenance actions: clean, scan, and store flush.

use super::{Action, ActionCtx, ActionKind, Expected};
use crate::error::ActionError;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Ask the host to remove stale library rows, then wait for it to finish.
#[derive(Default)]
pub struct Clean {
    awaiting: Option<Expected>,
    requested: bool,
}

impl Clean {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Action for Clean {
    fn kind(&self) -> ActionKind {
        ActionKind::Clean
    }

    fn awaiting(&self) -> Option<&Expected> {
        self.awaiting.as_ref()
    }

    async fn run(
        &mut self,
        ctx: &mut ActionCtx,
        _event: Option<&Value>,
    ) -> Result<bool, ActionError> {
        if !self.requested {
            ctx.gateway
                .host()
                .request("VideoLibrary.Clean", json!({ "showdialogs": false }))
                .await?;
            self.requested = true;
            self.awaiting = Some(Expected::method("VideoLibrary.OnCleanFinished"));
            return Ok(false);
        }
        self.awaiting = None;
        Ok(true)
    }
}

/// Ask the host to discover new files, then wait for it to finish.
#[derive(Default)]
pub struct Scan {
    awaiting: Option<Expected>,
    requested: bool,
}

impl Scan {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Action for Scan {
    fn kind(&self) -> ActionKind {
        ActionKind::Scan
    }

    fn awaiting(&self) -> Option<&Expected> {
        self.awaiting.as_ref()
    }

    async fn run(
        &mut self,
        ctx: &mut ActionCtx,
        _event: Option<&Value>,
    ) -> Result<bool, ActionError> {
        if !self.requested {
            ctx.gateway
                .host()
                .request("VideoLibrary.Scan", json!({ "showdialogs": false }))
                .await?;
            self.requested = true;
            self.awaiting = Some(Expected::method("VideoLibrary.OnScanFinished"));
            return Ok(false);
        }
        self.awaiting = None;
        Ok(true)
    }
}

/// Flush the in-memory last-known stores to disk.
#[derive(Default)]
pub struct WriteChanges;

impl WriteChanges {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Action for WriteChanges {
    fn kind(&self) -> ActionKind {
        ActionKind::WriteChanges
    }

    fn awaiting(&self) -> Option<&Expected> {
        None
    }

    async fn run(
        &mut self,
        ctx: &mut ActionCtx,
        _event: Option<&Value>,
    ) -> Result<bool, ActionError> {
        ctx.last_known.write_changes()?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
