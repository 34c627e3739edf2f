// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service settings, loaded from `settings.toml` in the profile directory.
//!
//! Every key has a default so a missing or partial file is never an error;
//! only malformed TOML is reported. The file is re-read on SIGHUP.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Naming scheme for a movie sidecar created on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieNfoNaming {
    /// `<dir>/movie.nfo`
    Movie,
    /// `<basename>.nfo`
    Filename,
}

/// Policy for actor tags already present in a sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorHandling {
    Leave,
    Update,
    Overwrite,
    Merge,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Unix socket the host's JSON-RPC endpoint listens on.
    pub socket: PathBuf,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            socket: PathBuf::from("/run/mediahost/jsonrpc.sock"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub should_clean: bool,
    pub should_import: bool,
    pub should_export: bool,
    pub should_scan: bool,
    /// When both sides changed, refresh from disk before exporting.
    pub should_import_first: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            should_clean: false,
            should_import: true,
            should_export: true,
            should_scan: false,
            should_import_first: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub can_create_nfo: bool,
    pub movie_nfo_naming: MovieNfoNaming,
    pub is_minimal: bool,
    pub can_overwrite: bool,
    pub actor_handling: ActorHandling,
    pub should_export_plugin_trailers: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            can_create_nfo: true,
            movie_nfo_naming: MovieNfoNaming::Movie,
            is_minimal: false,
            can_overwrite: true,
            actor_handling: ActorHandling::Merge,
            should_export_plugin_trailers: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriggerSettings {
    pub sync_on_start: bool,
    pub sync_on_scan: bool,
    pub export_on_update: bool,
    pub ignores_add_updates: bool,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            sync_on_start: false,
            sync_on_scan: false,
            export_on_update: true,
            ignores_add_updates: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AvoidanceSettings {
    pub is_enabled: bool,
    /// Minutes to hold the patient gate closed after playback stops.
    pub wait_time: u32,
}

impl AvoidanceSettings {
    /// Post-stop wait, zero when avoidance is disabled.
    pub fn wait_minutes(&self) -> u32 {
        if self.is_enabled {
            self.wait_time
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PeriodicSettings {
    pub is_enabled: bool,
    /// Minutes between patient syncs.
    pub period: u32,
}

impl Default for PeriodicSettings {
    fn default() -> Self {
        Self {
            is_enabled: false,
            period: 60,
        }
    }
}

impl PeriodicSettings {
    /// Alarm period, zero when disabled.
    pub fn period_minutes(&self) -> u32 {
        if self.is_enabled {
            self.period
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduledSettings {
    pub is_enabled: bool,
    /// Local time of day, `HH:MM`.
    pub time: String,
    /// Weekdays the sync may run, Monday = 0.
    pub days: Vec<u8>,
    pub run_missed_syncs: bool,
}

impl Default for ScheduledSettings {
    fn default() -> Self {
        Self {
            is_enabled: false,
            time: "00:00".to_string(),
            days: Vec::new(),
            run_missed_syncs: false,
        }
    }
}

impl ScheduledSettings {
    /// Parse the configured time of day; `None` when malformed.
    pub fn time_hm(&self) -> Option<(u32, u32)> {
        let (h, m) = self.time.split_once(':')?;
        let hour: u32 = h.parse().ok()?;
        let minute: u32 = m.parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some((hour, minute))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub should_show_sync: bool,
    pub should_show_notifications: bool,
    pub is_logging_verbose: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            should_show_sync: true,
            should_show_notifications: true,
            is_logging_verbose: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub host: HostSettings,
    pub sync: SyncSettings,
    pub export: ExportSettings,
    pub triggers: TriggerSettings,
    pub avoidance: AvoidanceSettings,
    pub periodic: PeriodicSettings,
    pub scheduled: ScheduledSettings,
    pub ui: UiSettings,
}

impl Settings {
    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Profile directory holding settings, stores, and logs.
///
/// `$NFOSYNC_PROFILE` overrides; otherwise the platform state directory
/// (`~/.local/state/nfosync`), falling back to `~/.nfosync`.
pub fn profile_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("NFOSYNC_PROFILE") {
        return PathBuf::from(dir);
    }
    if let Some(state) = dirs::state_dir() {
        return state.join("nfosync");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".nfosync")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
