// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress sink that reports through the service log.

use super::ProgressSink;
use tracing::info;

/// Background progress indicator writing to the log.
///
/// Visibility mirrors the `ui.should_show_sync` setting: an invisible sink
/// swallows updates unless it was already opened when visibility changed.
#[derive(Debug)]
pub struct LogProgress {
    visible: bool,
    active: bool,
    heading: String,
}

impl LogProgress {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            active: false,
            heading: String::new(),
        }
    }
}

impl ProgressSink for LogProgress {
    fn begin(&mut self, heading: &str) {
        if !self.visible && !self.active {
            return;
        }
        if !self.active {
            self.active = true;
            info!(heading, "progress started");
        }
        self.heading = heading.to_string();
    }

    fn update(&mut self, message: &str, position: usize, total: usize) {
        if !self.active {
            return;
        }
        let percent = if total == 0 {
            100
        } else {
            position * 100 / total
        };
        info!(heading = %self.heading, message, percent, "progress");
    }

    fn close(&mut self) {
        if self.active {
            info!(heading = %self.heading, "progress finished");
            self.active = false;
        }
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
