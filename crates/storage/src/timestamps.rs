// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync watermarks, persisted as a small JSON sidecar.
//!
//! `last_sync` is the UTC watermark used by change detection; items whose
//! sidecar is newer than it (and than their last-known mtime) are imported.
//! `next_scheduled` is the local wall-clock time of the next calendar sync.
//!
//! The file is rewritten on every mutation. An unreadable or malformed file
//! resets both fields to defaults rather than failing startup.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const FILE_NAME: &str = "timestamps.json";

#[derive(Debug, Error)]
pub enum TimestampsError {
    #[error("unable to write timestamps file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("unable to encode timestamps: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Contents {
    last_sync: DateTime<Utc>,
    next_scheduled: NaiveDateTime,
}

/// Default `next_scheduled`: far enough in the past that any enabled
/// schedule is immediately due for recomputation.
pub fn schedule_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1980, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Persistent `{last_sync, next_scheduled}` pair.
#[derive(Debug)]
pub struct Timestamps {
    path: PathBuf,
    last_sync: DateTime<Utc>,
    next_scheduled: NaiveDateTime,
}

impl Timestamps {
    /// Load from `<profile>/timestamps.json`, resetting to defaults when
    /// the file is absent or malformed.
    pub fn load(profile_dir: &Path, now: DateTime<Utc>) -> Self {
        let path = profile_dir.join(FILE_NAME);

        let contents = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| match serde_json::from_str::<Contents>(&raw) {
                Ok(contents) => Some(contents),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "resetting malformed timestamps file");
                    None
                }
            });

        match contents {
            Some(c) => Self {
                path,
                last_sync: c.last_sync,
                next_scheduled: c.next_scheduled,
            },
            None => Self {
                path,
                last_sync: now,
                next_scheduled: schedule_epoch(),
            },
        }
    }

    pub fn last_sync(&self) -> DateTime<Utc> {
        self.last_sync
    }

    pub fn next_scheduled(&self) -> NaiveDateTime {
        self.next_scheduled
    }

    pub fn set_last_sync(&mut self, value: DateTime<Utc>) -> Result<(), TimestampsError> {
        self.last_sync = value;
        self.write()
    }

    pub fn set_next_scheduled(&mut self, value: NaiveDateTime) -> Result<(), TimestampsError> {
        self.next_scheduled = value;
        self.write()
    }

    fn write(&self) -> Result<(), TimestampsError> {
        let contents = Contents {
            last_sync: self.last_sync,
            next_scheduled: self.next_scheduled,
        };
        let json = serde_json::to_string(&contents)?;

        let io = || -> io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let tmp_path = self.path.with_extension("tmp");
            fs::write(&tmp_path, json.as_bytes())?;
            fs::rename(&tmp_path, &self.path)
        };
        io().map_err(|source| TimestampsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
#[path = "timestamps_tests.rs"]
mod tests;
