// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Calendar math for scheduled syncs.

use chrono::{Datelike, Days, NaiveDateTime, NaiveTime};
use nfo_core::config::ScheduledSettings;
use tracing::warn;

/// Compute the next scheduled sync after `now` (local wall-clock).
///
/// Starts today, moves to tomorrow when today's slot has passed, then
/// walks forward one day at a time to the next allowed weekday. An empty
/// day set means every day. `None` when the configured time is malformed.
pub fn update_schedule(now: NaiveDateTime, settings: &ScheduledSettings) -> Option<NaiveDateTime> {
    let (hour, minute) = match settings.time_hm() {
        Some(hm) => hm,
        None => {
            warn!(time = %settings.time, "ignoring malformed scheduled sync time");
            return None;
        }
    };
    let slot = NaiveTime::from_hms_opt(hour, minute, 0)?;

    let mut date = now.date();
    if now.time() > slot {
        date = date.checked_add_days(Days::new(1))?;
    }

    if !settings.days.is_empty() {
        for _ in 0..7 {
            let weekday = date.weekday().num_days_from_monday() as u8;
            if settings.days.contains(&weekday) {
                break;
            }
            date = date.checked_add_days(Days::new(1))?;
        }
    }

    Some(date.and_time(slot))
}

/// Whether the scheduled sync is due.
pub fn is_scheduled_sync_due(
    settings: &ScheduledSettings,
    now: NaiveDateTime,
    next_scheduled: NaiveDateTime,
) -> bool {
    settings.is_enabled && now >= next_scheduled
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
