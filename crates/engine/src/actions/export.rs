// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Export actions: writing library state out to sidecar files.

use super::{Action, ActionCtx, ActionKind, Expected, PhaseSource, Phased};
use crate::error::ActionError;
use crate::exporter::{root_tag, ExportSource, Exporter};
use crate::gateway::MediaInfo;
use crate::nfo::Element;
use async_trait::async_trait;
use nfo_adapters::RequestError;
use nfo_core::{messages, MediaItem, MediaType};
use nfo_storage::StoreError;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::warn;

static NULL: Value = Value::Null;

enum ExportError {
    /// Graceful sidecar trouble: logged and reported, never fatal.
    Failure(String),
    /// Transient host trouble: fatal to the enclosing action.
    Rpc(RequestError),
    Store(StoreError),
}

impl From<RequestError> for ExportError {
    fn from(e: RequestError) -> Self {
        ExportError::Rpc(e)
    }
}

/// Export one item's library state into its sidecar.
///
/// `overwrite` pins the tag-replacement policy for this run; `None` defers
/// to configuration. As a subtask the store flush is left to the enclosing
/// bulk action and failures stay quiet.
pub struct ExportOne {
    item: MediaItem,
    overwrite: Option<bool>,
    subtask: bool,
}

impl ExportOne {
    pub fn new(item: MediaItem) -> Self {
        Self {
            item,
            overwrite: None,
            subtask: false,
        }
    }

    pub fn with_overwrite(item: MediaItem, overwrite: bool) -> Self {
        Self {
            item,
            overwrite: Some(overwrite),
            subtask: false,
        }
    }

    pub fn subtask(mut self) -> Self {
        self.subtask = true;
        self
    }
}

#[async_trait]
impl Action for ExportOne {
    fn kind(&self) -> ActionKind {
        ActionKind::ExportOne
    }

    fn awaiting(&self) -> Option<&Expected> {
        None
    }

    async fn run(
        &mut self,
        ctx: &mut ActionCtx,
        _event: Option<&Value>,
    ) -> Result<bool, ActionError> {
        match export_item(ctx, &self.item, self.overwrite, self.subtask).await {
            Ok(()) => Ok(true),
            Err(ExportError::Failure(message)) => {
                warn!(item = %self.item, message, "export failure");
                ctx.export_failures += 1;
                if !self.subtask {
                    ctx.notify_code(messages::MSG_EXPORT_FAILED).await;
                }
                Ok(true)
            }
            Err(ExportError::Rpc(e)) => Err(e.into()),
            Err(ExportError::Store(e)) => Err(e.into()),
        }
    }
}

async fn export_item(
    ctx: &mut ActionCtx,
    item: &MediaItem,
    overwrite: Option<bool>,
    subtask: bool,
) -> Result<(), ExportError> {
    let can_overwrite = overwrite.unwrap_or(ctx.settings.export.can_overwrite);
    let mut info = MediaInfo::new(item.clone());

    let nfo_path = info.nfo_path(&ctx.gateway).await?;
    let mut tree = match &nfo_path {
        Some(path) => read_sidecar(path)?,
        None if ctx.settings.export.can_create_nfo => Element::new(root_tag(item.media_type)),
        // Nothing on disk and creation is off: quietly done.
        None => return Ok(()),
    };

    let file = info.file(&ctx.gateway).await?;
    let checksum = info.checksum(&ctx.gateway).await?;

    let source = ExportSource {
        media_type: item.media_type,
        file: &file,
        details: info.cached_details().unwrap_or(&NULL),
        art: info.cached_art().unwrap_or(&NULL),
        movieset: info.cached_movieset().unwrap_or(&NULL),
        seasons: info.cached_seasons(),
    };
    Exporter::new(&mut tree, source, &ctx.settings.export, can_overwrite).apply();

    let write_path = match nfo_path {
        Some(path) => path,
        None => {
            info.create_nfo_path(&ctx.gateway, ctx.settings.export.movie_nfo_naming)
                .await?
        }
    };

    let comment = format!(
        "Created {} by nfosyncd {}",
        ctx.clock.now_local().format("%Y-%m-%d %H:%M:%S"),
        env!("CARGO_PKG_VERSION"),
    );
    let xml = tree.to_xml(Some(&comment));
    std::fs::write(&write_path, xml).map_err(|e| {
        ExportError::Failure(format!("unable to write sidecar \"{write_path}\": {e}"))
    })?;

    match ctx.gateway.file_mtime(&write_path).await {
        Some(mtime) => ctx
            .last_known
            .set_nfo_mtime(item.media_type, item.library_id, mtime),
        None => warn!(
            item = %item,
            path = %write_path,
            "unable to record sidecar mtime after export"
        ),
    }
    ctx.last_known
        .set_checksum(item.media_type, item.library_id, checksum);

    if !subtask {
        ctx.last_known.write_changes().map_err(ExportError::Store)?;
    }
    Ok(())
}

fn read_sidecar(path: &str) -> Result<Element, ExportError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ExportError::Failure(format!("unable to read sidecar \"{path}\": {e}")))?;
    if contents.trim().is_empty() {
        return Err(ExportError::Failure(format!(
            "sidecar is empty - \"{path}\""
        )));
    }
    Element::parse(&contents).map_err(|e| {
        ExportError::Failure(format!("unable to parse sidecar \"{path}\": {e}"))
    })
}

/// Export every item of every type, in the fixed type order.
pub fn export_all() -> Phased {
    Phased::new(ActionKind::ExportAll, ExportAllSource::default()).close_progress()
}

fn stage_message(media_type: MediaType) -> u32 {
    match media_type {
        MediaType::Movie => messages::MSG_EXPORTING_MOVIES,
        MediaType::TvShow => messages::MSG_EXPORTING_TVSHOWS,
        MediaType::Episode => messages::MSG_EXPORTING_EPISODES,
    }
}

#[derive(Default)]
struct ExportAllSource {
    began: bool,
    stage: usize,
    pending: VecDeque<MediaItem>,
    position: usize,
    total: usize,
}

#[async_trait]
impl PhaseSource for ExportAllSource {
    async fn next(&mut self, ctx: &mut ActionCtx) -> Result<Option<Box<dyn Action>>, ActionError> {
        if !self.began {
            self.began = true;
            ctx.export_failures = 0;
            ctx.progress
                .begin(nfo_core::message(messages::MSG_EXPORT_ALL_HEADING));
        }

        loop {
            if let Some(item) = self.pending.pop_front() {
                self.position += 1;
                ctx.progress.update(
                    nfo_core::message(stage_message(item.media_type)),
                    self.position,
                    self.total,
                );
                return Ok(Some(Box::new(ExportOne::new(item).subtask())));
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

    async fn finish(&mut self, ctx: &mut ActionCtx, _canceled: bool) -> Result<(), ActionError> {
        ctx.last_known.write_changes()?;
        if ctx.export_failures > 0 {
            ctx.notify_code(messages::MSG_EXPORT_ALL_FAILURES).await;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
