// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-item last-known state, one compact binary file per media type.
//!
//! Each record remembers the checksum the engine last saw for an item and
//! the modification time of its sidecar file. Change detection compares
//! against these; an absent record means the item has never been observed
//! and forces a sync on first encounter.
//!
//! On-disk layout (little-endian):
//!
//! ```text
//! file   := version:u16 record*
//! record := id:u32 status:u8 checksum:u32 nfo_mtime:u40
//! ```
//!
//! Status bit 0 marks the checksum as present, bit 1 the mtime. Absent
//! fields still occupy their bytes with value zero. Reads stop at the first
//! short record so a truncated file yields every record before the cut.

use chrono::{DateTime, Utc};
use nfo_core::MediaType;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const FORMAT_VERSION: u16 = 0;
const VERSION_LEN: usize = 2;
const RECORD_LEN: usize = 4 + 1 + 4 + 5;

const CHECKSUM_BIT: u8 = 1 << 0;
const MTIME_BIT: u8 = 1 << 1;

/// Largest value representable in the 40-bit mtime field.
const MTIME_MAX: u64 = (1 << 40) - 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to read store {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("unable to write store {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Last-known facts about a single library item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastKnownRecord {
    pub checksum: Option<u32>,
    /// Seconds since the Unix epoch, 40 bits on disk.
    pub nfo_mtime: Option<u64>,
}

impl LastKnownRecord {
    fn is_empty(&self) -> bool {
        self.checksum.is_none() && self.nfo_mtime.is_none()
    }
}

/// Binary store of [`LastKnownRecord`]s for one media type.
///
/// Mutations only touch memory; [`LastKnownStore::write`] persists them
/// atomically and is a no-op while nothing changed since load.
#[derive(Debug)]
pub struct LastKnownStore {
    path: PathBuf,
    contents: BTreeMap<u32, LastKnownRecord>,
    dirty: bool,
}

impl LastKnownStore {
    /// Load the store at `path`; a missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        Ok(Self {
            contents: decode(&bytes, &path),
            path,
            dirty: false,
        })
    }

    pub fn get(&self, id: u32) -> Option<LastKnownRecord> {
        self.contents.get(&id).copied()
    }

    pub fn checksum(&self, id: u32) -> Option<u32> {
        self.contents.get(&id).and_then(|r| r.checksum)
    }

    pub fn nfo_mtime(&self, id: u32) -> Option<u64> {
        self.contents.get(&id).and_then(|r| r.nfo_mtime)
    }

    pub fn set_checksum(&mut self, id: u32, checksum: u32) {
        self.dirty = true;
        self.contents.entry(id).or_default().checksum = Some(checksum);
    }

    pub fn set_nfo_mtime(&mut self, id: u32, epoch_seconds: u64) {
        self.dirty = true;
        self.contents.entry(id).or_default().nfo_mtime = Some(epoch_seconds.min(MTIME_MAX));
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist pending mutations atomically (write to temp, rename).
    ///
    /// A no-op when nothing was mutated since the last load or write.
    pub fn write(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }

        let bytes = encode(&self.contents);
        let write = || -> io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let tmp_path = self.path.with_extension("tmp");
            fs::write(&tmp_path, &bytes)?;
            fs::rename(&tmp_path, &self.path)
        };
        write().map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        self.dirty = false;
        Ok(())
    }
}

fn decode(bytes: &[u8], path: &Path) -> BTreeMap<u32, LastKnownRecord> {
    let mut contents = BTreeMap::new();
    if bytes.len() < VERSION_LEN {
        return contents;
    }

    // Version is not interpreted yet; skip over it.
    let mut rest = &bytes[VERSION_LEN..];
    while rest.len() >= RECORD_LEN {
        let (chunk, tail) = rest.split_at(RECORD_LEN);
        rest = tail;

        let id = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let status = chunk[4];
        let checksum = u32::from_le_bytes([chunk[5], chunk[6], chunk[7], chunk[8]]);
        let mtime = u64::from_le_bytes([
            chunk[9], chunk[10], chunk[11], chunk[12], chunk[13], 0, 0, 0,
        ]);

        let record = LastKnownRecord {
            checksum: (status & CHECKSUM_BIT != 0).then_some(checksum),
            nfo_mtime: (status & MTIME_BIT != 0).then_some(mtime),
        };
        if !record.is_empty() {
            contents.insert(id, record);
        }
    }

    if !rest.is_empty() {
        debug!(
            path = %path.display(),
            trailing = rest.len(),
            "store file ends mid-record, keeping records read so far"
        );
    }

    contents
}

fn encode(contents: &BTreeMap<u32, LastKnownRecord>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(VERSION_LEN + contents.len() * RECORD_LEN);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());

    for (id, record) in contents {
        bytes.extend_from_slice(&id.to_le_bytes());

        let mut status = 0u8;
        if record.checksum.is_some() {
            status |= CHECKSUM_BIT;
        }
        if record.nfo_mtime.is_some() {
            status |= MTIME_BIT;
        }
        bytes.push(status);

        bytes.extend_from_slice(&record.checksum.unwrap_or(0).to_le_bytes());
        let mtime = record.nfo_mtime.unwrap_or(0).min(MTIME_MAX);
        bytes.extend_from_slice(&mtime.to_le_bytes()[..5]);
    }

    bytes
}

/// The three per-type stores, addressed by `(MediaType, id)`.
///
/// Sidecar mtimes cross this boundary as UTC datetimes; the epoch-seconds
/// representation stays private to the codec.
#[derive(Debug)]
pub struct LastKnown {
    movies: LastKnownStore,
    tvshows: LastKnownStore,
    episodes: LastKnownStore,
}

impl LastKnown {
    pub fn load(profile_dir: &Path) -> Result<Self, StoreError> {
        let store = |media_type: MediaType| {
            LastKnownStore::load(profile_dir.join(format!("{}.dat", media_type.store_stem())))
        };
        Ok(Self {
            movies: store(MediaType::Movie)?,
            tvshows: store(MediaType::TvShow)?,
            episodes: store(MediaType::Episode)?,
        })
    }

    fn store(&self, media_type: MediaType) -> &LastKnownStore {
        match media_type {
            MediaType::Movie => &self.movies,
            MediaType::TvShow => &self.tvshows,
            MediaType::Episode => &self.episodes,
        }
    }

    fn store_mut(&mut self, media_type: MediaType) -> &mut LastKnownStore {
        match media_type {
            MediaType::Movie => &mut self.movies,
            MediaType::TvShow => &mut self.tvshows,
            MediaType::Episode => &mut self.episodes,
        }
    }

    pub fn checksum(&self, media_type: MediaType, id: u32) -> Option<u32> {
        self.store(media_type).checksum(id)
    }

    pub fn set_checksum(&mut self, media_type: MediaType, id: u32, checksum: u32) {
        self.store_mut(media_type).set_checksum(id, checksum);
    }

    pub fn nfo_mtime(&self, media_type: MediaType, id: u32) -> Option<DateTime<Utc>> {
        self.store(media_type)
            .nfo_mtime(id)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn set_nfo_mtime(&mut self, media_type: MediaType, id: u32, mtime: DateTime<Utc>) {
        let epoch_seconds = u64::try_from(mtime.timestamp()).unwrap_or(0);
        self.store_mut(media_type).set_nfo_mtime(id, epoch_seconds);
    }

    /// Flush every store that accumulated changes.
    pub fn write_changes(&mut self) -> Result<(), StoreError> {
        for store in [&mut self.movies, &mut self.tvshows, &mut self.episodes] {
            if let Err(e) = store.write() {
                warn!(error = %e, "unable to write last-known store");
                return Err(e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "last_known_tests.rs"]
mod tests;
