// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing message catalog.
//!
//! Engine code refers to messages by numeric code so failure context can be
//! attached cheaply and carried through action wrappers; the text is only
//! resolved at the notification boundary.

/// Progress: cleaning the library.
pub const MSG_CLEANING: u32 = 32003;
/// Failure: timestamps file could not be written.
pub const MSG_TIMESTAMPS_WRITE_FAILED: u32 = 32006;
/// Progress: syncing changed items.
pub const MSG_SYNCING_CHANGES: u32 = 32010;
/// Heading for sync progress.
pub const MSG_SYNC_HEADING: u32 = 32011;
/// Progress: scanning for new files.
pub const MSG_SCANNING: u32 = 32012;
/// Failure: one item could not be exported.
pub const MSG_EXPORT_FAILED: u32 = 32043;
/// Failure: a sync run did not complete cleanly.
pub const MSG_SYNC_FAILED: u32 = 32064;
/// Heading for import-all progress.
pub const MSG_IMPORT_ALL_HEADING: u32 = 32065;
pub const MSG_IMPORTING_MOVIES: u32 = 32066;
pub const MSG_IMPORTING_TVSHOWS: u32 = 32067;
pub const MSG_IMPORTING_EPISODES: u32 = 32068;
/// Heading for export-all progress.
pub const MSG_EXPORT_ALL_HEADING: u32 = 32069;
pub const MSG_EXPORTING_MOVIES: u32 = 32070;
pub const MSG_EXPORTING_TVSHOWS: u32 = 32071;
pub const MSG_EXPORTING_EPISODES: u32 = 32072;
/// Failure: some exports in a bulk run failed.
pub const MSG_EXPORT_ALL_FAILURES: u32 = 32073;
/// Failure: the one-shot command was invoked with bad arguments.
pub const MSG_BAD_INVOCATION: u32 = 32074;
/// Failure: an import-all run did not complete cleanly.
pub const MSG_IMPORT_ALL_FAILED: u32 = 32085;
/// Failure: a single-item sync did not complete cleanly.
pub const MSG_SYNC_ONE_FAILED: u32 = 32086;

/// Resolve a catalog code to its message text.
pub fn message(code: u32) -> &'static str {
    match code {
        MSG_CLEANING => "Cleaning the library",
        MSG_TIMESTAMPS_WRITE_FAILED => "Unable to save sync timestamps",
        MSG_SYNCING_CHANGES => "Syncing changes",
        MSG_SYNC_HEADING => "NFO Sync",
        MSG_SCANNING => "Scanning for new files",
        MSG_EXPORT_FAILED => "Unable to export to file",
        MSG_SYNC_FAILED => "Sync failed",
        MSG_IMPORT_ALL_HEADING => "Importing all items",
        MSG_IMPORTING_MOVIES => "Importing movies",
        MSG_IMPORTING_TVSHOWS => "Importing TV shows",
        MSG_IMPORTING_EPISODES => "Importing episodes",
        MSG_EXPORT_ALL_HEADING => "Exporting all items",
        MSG_EXPORTING_MOVIES => "Exporting movies",
        MSG_EXPORTING_TVSHOWS => "Exporting TV shows",
        MSG_EXPORTING_EPISODES => "Exporting episodes",
        MSG_EXPORT_ALL_FAILURES => "Some items could not be exported",
        MSG_BAD_INVOCATION => "Invalid command arguments",
        MSG_IMPORT_ALL_FAILED => "Import failed",
        MSG_SYNC_ONE_FAILED => "Item sync failed",
        _ => "Unknown message",
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
