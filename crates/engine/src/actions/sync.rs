// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync actions: per-item change detection and the full sync pipeline.

use super::{
    Action, ActionCtx, ActionKind, Clean, ExportOne, ImportOne, PhaseSource, Phased, Scan,
    WriteChanges,
};
use crate::error::ActionError;
use crate::gateway::MediaInfo;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nfo_core::config::SyncSettings;
use nfo_core::{messages, MediaItem, MediaType};
use std::collections::VecDeque;
use tracing::debug;

/// Sync one item: export when the library changed, import when the sidecar
/// changed, both (in configured order) when both did.
pub fn sync_one(item: MediaItem) -> Phased {
    Phased::new(
        ActionKind::SyncOne,
        SyncOneSource::new(item, false),
    )
    .wrap_code(messages::MSG_SYNC_ONE_FAILED)
}

fn sync_one_subtask(item: MediaItem) -> Phased {
    Phased::new(ActionKind::SyncOne, SyncOneSource::new(item, true))
        .wrap_code(messages::MSG_SYNC_ONE_FAILED)
}

struct SyncOneSource {
    item: MediaItem,
    subtask: bool,
    decided: bool,
    queue: VecDeque<Box<dyn Action>>,
}

impl SyncOneSource {
    fn new(item: MediaItem, subtask: bool) -> Self {
        Self {
            item,
            subtask,
            decided: false,
            queue: VecDeque::new(),
        }
    }

    async fn decide(&mut self, ctx: &mut ActionCtx) -> Result<(), ActionError> {
        let item = self.item.clone();
        let mut info = MediaInfo::new(item.clone());

        let current = info.checksum(&ctx.gateway).await?;
        let should_export =
            ctx.last_known.checksum(item.media_type, item.library_id) != Some(current);

        let should_import = match info.nfo_mtime(&ctx.gateway).await? {
            None => false,
            Some(mtime) => {
                let last_sync = ctx.timestamps.last_sync();
                let threshold = match ctx.last_known.nfo_mtime(item.media_type, item.library_id)
                {
                    Some(known) => known.max(last_sync),
                    None => last_sync,
                };
                mtime > threshold
            }
        };

        debug!(
            item = %item,
            should_import,
            should_export,
            "change detection"
        );

        match (should_import, should_export) {
            (true, true) if ctx.settings.sync.should_import_first => {
                // Refresh first, then export without clobbering the tags
                // the refresh just read from disk.
                self.queue.push_back(Box::new(ImportOne::new(item.clone())));
                self.queue
                    .push_back(Box::new(ExportOne::with_overwrite(item, false).subtask()));
            }
            (true, true) => {
                self.queue
                    .push_back(Box::new(ExportOne::with_overwrite(item.clone(), true).subtask()));
                self.queue.push_back(Box::new(ImportOne::new(item)));
            }
            (true, false) => {
                self.queue.push_back(Box::new(ImportOne::new(item)));
            }
            (false, true) => {
                self.queue
                    .push_back(Box::new(ExportOne::new(item).subtask()));
            }
            (false, false) => {}
        }

        if !self.subtask && !self.queue.is_empty() {
            self.queue.push_back(Box::new(WriteChanges::new()));
        }
        Ok(())
    }
}

#[async_trait]
impl PhaseSource for SyncOneSource {
    async fn next(&mut self, ctx: &mut ActionCtx) -> Result<Option<Box<dyn Action>>, ActionError> {
        if !self.decided {
            self.decided = true;
            self.decide(ctx).await?;
        }
        Ok(self.queue.pop_front())
    }
}

/// Walk every item of every type and sync the changed ones, then advance
/// the sync watermark to the walk's start time.
pub fn sync_changes() -> Phased {
    Phased::new(ActionKind::SyncChanges, SyncChangesSource::default())
}

#[derive(Default)]
struct SyncChangesSource {
    stage: usize,
    pending: VecDeque<MediaItem>,
    started_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl PhaseSource for SyncChangesSource {
    async fn next(&mut self, ctx: &mut ActionCtx) -> Result<Option<Box<dyn Action>>, ActionError> {
        if self.started_at.is_none() {
            self.started_at = Some(ctx.clock.now_utc());
        }

        loop {
            if let Some(item) = self.pending.pop_front() {
                return Ok(Some(Box::new(sync_one_subtask(item))));
            }

            let Some(media_type) = MediaType::ALL.get(self.stage).copied() else {
                return Ok(None);
            };
            self.stage += 1;
            self.pending = ctx.gateway.get_all(media_type).await?.into();
        }
    }

    async fn finish(&mut self, ctx: &mut ActionCtx, canceled: bool) -> Result<(), ActionError> {
        if canceled {
            return Ok(());
        }
        if let Some(started_at) = self.started_at {
            ctx.timestamps.set_last_sync(started_at)?;
        }
        Ok(())
    }
}

enum SyncStage {
    Clean,
    Changes,
    Flush,
    Scan,
}

/// Full sync pipeline: optional clean, change sync with store flush, then
/// an optional scan for new files.
///
/// Settings are snapshotted at construction so a mid-sync settings change
/// cannot reshape a running pipeline.
pub fn sync_all(settings: &SyncSettings, skip_scan: bool) -> Phased {
    let mut stages = VecDeque::new();
    if settings.should_clean {
        stages.push_back(SyncStage::Clean);
    }
    if settings.should_import || settings.should_export {
        stages.push_back(SyncStage::Changes);
        stages.push_back(SyncStage::Flush);
    }
    if settings.should_scan && !skip_scan {
        stages.push_back(SyncStage::Scan);
    }

    let total = stages
        .iter()
        .filter(|s| !matches!(s, SyncStage::Flush))
        .count();

    Phased::new(
        ActionKind::SyncAll,
        SyncAllSource {
            stages,
            total,
            done: 0,
            began: false,
        },
    )
    .wrap_code(messages::MSG_SYNC_FAILED)
    .close_progress()
}

struct SyncAllSource {
    stages: VecDeque<SyncStage>,
    total: usize,
    done: usize,
    began: bool,
}

impl SyncAllSource {
    fn update_progress(&mut self, ctx: &mut ActionCtx, message_code: u32) {
        self.done += 1;
        ctx.progress
            .update(nfo_core::message(message_code), self.done, self.total);
    }
}

#[async_trait]
impl PhaseSource for SyncAllSource {
    async fn next(&mut self, ctx: &mut ActionCtx) -> Result<Option<Box<dyn Action>>, ActionError> {
        if !self.began {
            self.began = true;
            ctx.export_failures = 0;
            ctx.progress
                .begin(nfo_core::message(messages::MSG_SYNC_HEADING));
        }

        Ok(match self.stages.pop_front() {
            Some(SyncStage::Clean) => {
                self.update_progress(ctx, messages::MSG_CLEANING);
                Some(Box::new(Clean::new()))
            }
            Some(SyncStage::Changes) => {
                self.update_progress(ctx, messages::MSG_SYNCING_CHANGES);
                Some(Box::new(sync_changes()))
            }
            Some(SyncStage::Flush) => Some(Box::new(WriteChanges::new())),
            Some(SyncStage::Scan) => {
                self.update_progress(ctx, messages::MSG_SCANNING);
                Some(Box::new(Scan::new()))
            }
            None => None,
        })
    }

    async fn finish(&mut self, ctx: &mut ActionCtx, _canceled: bool) -> Result<(), ActionError> {
        if ctx.export_failures > 0 {
            ctx.notify_code(messages::MSG_SYNC_FAILED).await;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
