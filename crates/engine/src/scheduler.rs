// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two-lane action scheduler.
//!
//! One action owns the active slot at a time; everything else waits in the
//! urgent or patient queue. Urgent work always runs; patient work only
//! starts while the patient gate is open (no playback to avoid, no
//! post-stop wait pending). A suspended action holds the slot until its
//! awaited event arrives.
//!
//! The scheduler is cooperative and single-threaded: its methods are only
//! invoked from the service event loop, and suspension is a return, never a
//! block.

use crate::actions::{Action, ActionCtx, ActionKind, Expected};
use crate::error::ActionError;
use nfo_core::messages;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, error};

#[derive(Default)]
pub struct Scheduler {
    urgent: VecDeque<Box<dyn Action>>,
    patient: VecDeque<Box<dyn Action>>,
    active: Option<Box<dyn Action>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action. Bulk kinds are deduplicated: a second instance is
    /// dropped while one is active or queued anywhere. Returns whether the
    /// action was accepted.
    ///
    /// Call [`Scheduler::run_loop`] afterwards to let it start.
    pub fn enqueue(&mut self, action: Box<dyn Action>, patient: bool) -> bool {
        let kind = action.kind();
        if kind.is_bulk() && self.contains(kind) {
            debug!(%kind, "dropping duplicate bulk action");
            return false;
        }

        debug!(%kind, patient, "queueing action");
        if patient {
            self.patient.push_back(action);
        } else {
            self.urgent.push_back(action);
        }
        true
    }

    fn contains(&self, kind: ActionKind) -> bool {
        self.active.as_ref().is_some_and(|a| a.kind() == kind)
            || self.urgent.iter().any(|a| a.kind() == kind)
            || self.patient.iter().any(|a| a.kind() == kind)
    }

    pub fn active_kind(&self) -> Option<ActionKind> {
        self.active.as_ref().map(|a| a.kind())
    }

    /// The event the active action is suspended on, if any.
    pub fn awaiting(&self) -> Option<&Expected> {
        self.active.as_ref().and_then(|a| a.awaiting())
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.urgent.is_empty() && self.patient.is_empty()
    }

    /// Drain queues until a queue empties or an action suspends.
    ///
    /// A no-op while an action holds the active slot. `patient_open` is the
    /// patient gate as evaluated by the caller for this invocation.
    pub async fn run_loop(&mut self, ctx: &mut ActionCtx, patient_open: bool) {
        if self.active.is_some() {
            return;
        }

        while let Some(mut action) = self.urgent.pop_front() {
            match action.run(ctx, None).await {
                Ok(true) => {}
                Ok(false) => {
                    self.active = Some(action);
                    return;
                }
                Err(e) => report(ctx, e).await,
            }
        }

        if !patient_open {
            return;
        }
        while let Some(mut action) = self.patient.pop_front() {
            match action.run(ctx, None).await {
                Ok(true) => {}
                Ok(false) => {
                    self.active = Some(action);
                    return;
                }
                Err(e) => report(ctx, e).await,
            }
        }
    }

    /// Deliver a bus event. Returns whether the active action consumed it.
    ///
    /// Events that match nothing are dropped; there is no buffering of
    /// unmatched events.
    pub async fn on_event(
        &mut self,
        ctx: &mut ActionCtx,
        method: &str,
        data: &Value,
        patient_open: bool,
    ) -> bool {
        let matched = self
            .active
            .as_ref()
            .and_then(|a| a.awaiting())
            .is_some_and(|expected| expected.matches(method, data));
        if !matched {
            return false;
        }

        if let Some(active) = self.active.as_mut() {
            match active.run(ctx, Some(data)).await {
                Ok(true) => {
                    self.active = None;
                    self.run_loop(ctx, patient_open).await;
                }
                Ok(false) => {}
                Err(e) => {
                    report(ctx, e).await;
                    self.active = None;
                    self.run_loop(ctx, patient_open).await;
                }
            }
        }
        true
    }
}

/// Top-level failure handling: log, tell the user, carry on.
async fn report(ctx: &ActionCtx, e: ActionError) {
    error!(code = e.code, message = %e.message, "action failed");
    ctx.notifier
        .notify(
            nfo_core::message(messages::MSG_SYNC_HEADING),
            nfo_core::message(e.code),
        )
        .await;
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
