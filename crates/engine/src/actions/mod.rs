// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resumable units of work.
//!
//! Every action follows one contract: `run` works until it either completes
//! (`Ok(true)`) or reaches a suspension point, in which case it records the
//! event it is awaiting and yields the scheduler's active slot by returning
//! `Ok(false)`. Delivery of the awaited event re-enters `run` with the
//! event payload.
//!
//! Three shapes cover everything here: atomic actions that finish in one
//! call, request-response actions that suspend on a host notification, and
//! phased actions that drive an ordered sequence of sub-actions pulled from
//! a [`PhaseSource`].

mod export;
mod import;
mod maintenance;
mod sync;

pub use export::{export_all, ExportOne};
pub use import::{import_all, ImportOne};
pub use maintenance::{Clean, Scan, WriteChanges};
pub use sync::{sync_all, sync_changes, sync_one};

use crate::error::ActionError;
use crate::gateway::MediaGateway;
use async_trait::async_trait;
use nfo_adapters::{NotifyAdapter, ProgressSink};
use nfo_core::{messages, Clock, Settings};
use nfo_storage::{LastKnown, Timestamps};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Action discriminator, used for bulk-action dedup and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    SyncAll,
    SyncChanges,
    SyncOne,
    ImportAll,
    ImportOne,
    ExportAll,
    ExportOne,
    Clean,
    Scan,
    WriteChanges,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::SyncAll => "sync all",
            ActionKind::SyncChanges => "sync changes",
            ActionKind::SyncOne => "sync one",
            ActionKind::ImportAll => "import all",
            ActionKind::ImportOne => "import one",
            ActionKind::ExportAll => "export all",
            ActionKind::ExportOne => "export one",
            ActionKind::Clean => "clean",
            ActionKind::Scan => "scan",
            ActionKind::WriteChanges => "write changes",
        }
    }

    /// Bulk kinds are deduplicated at enqueue time.
    pub fn is_bulk(&self) -> bool {
        matches!(
            self,
            ActionKind::SyncAll | ActionKind::ImportAll | ActionKind::ExportAll
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The event a suspended action resumes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expected {
    pub method: String,
    /// When set, the event payload must carry this library id, either
    /// top-level (`{id}`) or nested (`{item: {id}}`).
    pub item_id: Option<u32>,
}

impl Expected {
    pub fn method(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            item_id: None,
        }
    }

    pub fn item(method: impl Into<String>, item_id: u32) -> Self {
        Self {
            method: method.into(),
            item_id: Some(item_id),
        }
    }

    pub fn matches(&self, method: &str, data: &Value) -> bool {
        if self.method != method {
            return false;
        }
        let Some(expected_id) = self.item_id else {
            return true;
        };
        let id = data
            .get("id")
            .and_then(Value::as_u64)
            .or_else(|| data.pointer("/item/id").and_then(Value::as_u64));
        id == Some(u64::from(expected_id))
    }
}

/// Shared engine state every action runs against.
pub struct ActionCtx {
    pub gateway: MediaGateway,
    pub last_known: LastKnown,
    pub timestamps: Timestamps,
    pub settings: Settings,
    pub notifier: Arc<dyn NotifyAdapter>,
    pub progress: Box<dyn ProgressSink>,
    pub clock: Arc<dyn Clock>,
    /// Graceful export failures in the current bulk run.
    pub export_failures: usize,
}

impl ActionCtx {
    /// Surface a catalog message to the user.
    pub async fn notify_code(&self, code: u32) {
        self.notifier
            .notify(
                nfo_core::message(messages::MSG_SYNC_HEADING),
                nfo_core::message(code),
            )
            .await;
    }
}

#[async_trait]
pub trait Action: Send {
    fn kind(&self) -> ActionKind;

    /// The event this action is suspended on; `None` while runnable or done.
    fn awaiting(&self) -> Option<&Expected>;

    /// Work until done (`true`) or a suspension point (`false`).
    ///
    /// `event` carries the payload of the awaited event on resumption and
    /// is forwarded at most once into the active sub-action.
    async fn run(
        &mut self,
        ctx: &mut ActionCtx,
        event: Option<&Value>,
    ) -> Result<bool, ActionError>;
}

/// Pull source of sub-actions for a [`Phased`] action.
#[async_trait]
pub trait PhaseSource: Send {
    /// Produce the next sub-action, or `None` when the sequence is spent.
    async fn next(&mut self, ctx: &mut ActionCtx) -> Result<Option<Box<dyn Action>>, ActionError>;

    /// Called once when the sequence finished or the user canceled.
    async fn finish(&mut self, _ctx: &mut ActionCtx, _canceled: bool) -> Result<(), ActionError> {
        Ok(())
    }
}

/// Driver for an ordered, lazily produced sequence of sub-actions.
///
/// Sub-actions run strictly in order and never overlap. A suspending
/// sub-action propagates its `awaiting` upward; a failing one has its error
/// wrapped with this action's contextual code, the progress sink closed,
/// and the error re-raised. Cancellation is checked at sub-action
/// boundaries.
pub struct Phased {
    kind: ActionKind,
    source: Box<dyn PhaseSource>,
    current: Option<Box<dyn Action>>,
    awaiting: Option<Expected>,
    wrap_code: Option<u32>,
    close_progress: bool,
}

impl Phased {
    pub fn new(kind: ActionKind, source: impl PhaseSource + 'static) -> Self {
        Self {
            kind,
            source: Box::new(source),
            current: None,
            awaiting: None,
            wrap_code: None,
            close_progress: false,
        }
    }

    /// Wrap bubbled errors with this contextual catalog code.
    pub fn wrap_code(mut self, code: u32) -> Self {
        self.wrap_code = Some(code);
        self
    }

    /// Close the progress sink when this action ends, however it ends.
    pub fn close_progress(mut self) -> Self {
        self.close_progress = true;
        self
    }

    fn cleanup(&self, ctx: &mut ActionCtx) {
        if self.close_progress {
            ctx.progress.close();
        }
    }

    fn fail(&self, ctx: &mut ActionCtx, error: ActionError) -> ActionError {
        self.cleanup(ctx);
        match self.wrap_code {
            Some(code) => error.wrap(code),
            None => error,
        }
    }
}

#[async_trait]
impl Action for Phased {
    fn kind(&self) -> ActionKind {
        self.kind
    }

    fn awaiting(&self) -> Option<&Expected> {
        self.awaiting.as_ref()
    }

    async fn run(
        &mut self,
        ctx: &mut ActionCtx,
        event: Option<&Value>,
    ) -> Result<bool, ActionError> {
        self.awaiting = None;
        let mut event = event;

        loop {
            if self.current.is_none() {
                match self.source.next(ctx).await {
                    Ok(Some(sub)) => self.current = Some(sub),
                    Ok(None) => {
                        let result = self.source.finish(ctx, false).await;
                        self.cleanup(ctx);
                        result.map_err(|e| match self.wrap_code {
                            Some(code) => e.wrap(code),
                            None => e,
                        })?;
                        return Ok(true);
                    }
                    Err(e) => return Err(self.fail(ctx, e)),
                }
            }

            let Some(sub) = self.current.as_mut() else {
                continue;
            };
            match sub.run(ctx, event.take()).await {
                Ok(true) => {
                    self.current = None;
                    if ctx.progress.is_canceled() {
                        debug!(kind = %self.kind, "bulk action canceled");
                        let result = self.source.finish(ctx, true).await;
                        self.cleanup(ctx);
                        result?;
                        return Ok(true);
                    }
                }
                Ok(false) => {
                    self.awaiting = sub.awaiting().cloned();
                    return Ok(false);
                }
                Err(e) => return Err(self.fail(ctx, e)),
            }
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
