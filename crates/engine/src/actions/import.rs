// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Import actions: host-driven sidecar refreshes.

use super::{Action, ActionCtx, ActionKind, Expected, PhaseSource, Phased};
use crate::error::ActionError;
use async_trait::async_trait;
use nfo_core::{messages, MediaItem, MediaType};
use serde_json::{json, Value};
use std::collections::VecDeque;
use tracing::debug;

/// Ask the host to re-read one item's sidecar, then wait for the library
/// event that marks the refresh as applied.
///
/// The host signals completion differently per type: a refreshed tvshow is
/// updated in place (`OnUpdate`), while a movie or episode row is removed
/// and re-inserted (`OnRemove` arrives when the old row goes away).
pub struct ImportOne {
    item: MediaItem,
    awaiting: Option<Expected>,
    requested: bool,
}

impl ImportOne {
    pub fn new(item: MediaItem) -> Self {
        Self {
            item,
            awaiting: None,
            requested: false,
        }
    }
}

#[async_trait]
impl Action for ImportOne {
    fn kind(&self) -> ActionKind {
        ActionKind::ImportOne
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
            debug!(item = %self.item, "requesting refresh");
            let media_type = self.item.media_type;
            ctx.gateway
                .host()
                .request(
                    media_type.refresh_method(),
                    json!({ (media_type.id_key()): self.item.library_id }),
                )
                .await?;
            // The host answers the ping only once the refresh request is
            // being processed; this keeps refreshes from stacking up.
            ctx.gateway.host().request("JSONRPC.Ping", json!({})).await?;

            self.requested = true;
            self.awaiting = Some(match media_type {
                MediaType::TvShow => {
                    Expected::item("VideoLibrary.OnUpdate", self.item.library_id)
                }
                _ => Expected::item("VideoLibrary.OnRemove", self.item.library_id),
            });
            return Ok(false);
        }

        self.awaiting = None;
        Ok(true)
    }
}

/// Refresh every item of every type, in the fixed type order.
pub fn import_all() -> Phased {
    Phased::new(ActionKind::ImportAll, ImportAllSource::default())
        .wrap_code(messages::MSG_IMPORT_ALL_FAILED)
        .close_progress()
}

fn stage_message(media_type: MediaType) -> u32 {
    match media_type {
        MediaType::Movie => messages::MSG_IMPORTING_MOVIES,
        MediaType::TvShow => messages::MSG_IMPORTING_TVSHOWS,
        MediaType::Episode => messages::MSG_IMPORTING_EPISODES,
    }
}

#[derive(Default)]
struct ImportAllSource {
    began: bool,
    stage: usize,
    pending: VecDeque<MediaItem>,
    position: usize,
    total: usize,
}

#[async_trait]
impl PhaseSource for ImportAllSource {
    async fn next(&mut self, ctx: &mut ActionCtx) -> Result<Option<Box<dyn Action>>, ActionError> {
        if !self.began {
            self.began = true;
            ctx.progress
                .begin(nfo_core::message(messages::MSG_IMPORT_ALL_HEADING));
        }

        loop {
            if let Some(item) = self.pending.pop_front() {
                self.position += 1;
                ctx.progress.update(
                    nfo_core::message(stage_message(item.media_type)),
                    self.position,
                    self.total,
                );
                return Ok(Some(Box::new(ImportOne::new(item))));
            }

            let Some(media_type) = MediaType::ALL.get(self.stage).copied() else {
                return Ok(None);
            };
            self.stage += 1;
            self.pending = ctx.gateway.get_all(media_type).await?.into();
            self.position = 0;
            self.total = self.pending.len();
        }
    }
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
