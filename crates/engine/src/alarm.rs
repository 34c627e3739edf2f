// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named timers and bus-rebroadcasting alarms.
//!
//! The [`TimerWheel`] holds named deadlines; the service loop sleeps until
//! the earliest one and drains fired names. An [`Alarm`] wraps one named
//! timer: firing emits the internal `Alarm {name}` bus notification, and on
//! observing its own fire the alarm rebroadcasts its configured message.
//! The indirection keeps all alarm effects on the bus, where the scheduler
//! and tests can see them.

use nfo_core::{AlarmPayload, BusMethod};
use nfo_adapters::HostAdapter;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Named single-shot deadlines.
#[derive(Debug, Default)]
pub struct TimerWheel {
    timers: HashMap<String, Instant>,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, duration: Duration, now: Instant) {
        self.timers.insert(name.into(), now + duration);
    }

    pub fn cancel(&mut self, name: &str) {
        self.timers.remove(name);
    }

    pub fn is_armed(&self, name: &str) -> bool {
        self.timers.contains_key(name)
    }

    /// Remove and return the names of all timers that have fired.
    pub fn fired(&mut self, now: Instant) -> Vec<String> {
        let fired: Vec<String> = self
            .timers
            .iter()
            .filter(|(_, fires_at)| **fires_at <= now)
            .map(|(name, _)| name.clone())
            .collect();
        for name in &fired {
            self.timers.remove(name);
        }
        fired
    }

    /// Earliest pending deadline, for the event-loop sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().min().copied()
    }
}

/// Named, cancellable, optionally looping single-shot timer that emits a
/// bus notification on fire.
pub struct Alarm {
    name: String,
    message: BusMethod,
    data: Option<Value>,
    looping: bool,
    minutes: u32,
}

impl Alarm {
    pub fn new(name: impl Into<String>, message: BusMethod) -> Self {
        Self {
            name: name.into(),
            message,
            data: None,
            looping: false,
            minutes: 0,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Active from arming until fire (looping alarms stay active).
    pub fn is_active(&self) -> bool {
        self.minutes > 0
    }

    /// Arm for `minutes`, replacing any prior instance. Zero just cancels.
    pub fn set(&mut self, wheel: &mut TimerWheel, minutes: u32, now: Instant) {
        self.cancel(wheel);
        if minutes > 0 {
            self.minutes = minutes;
            wheel.set(
                self.name.clone(),
                Duration::from_secs(u64::from(minutes) * 60),
                now,
            );
        }
    }

    pub fn cancel(&mut self, wheel: &mut TimerWheel) {
        wheel.cancel(&self.name);
        self.minutes = 0;
    }

    /// Handle this alarm's timer firing: emit the internal fire
    /// notification and re-arm when looping.
    pub async fn on_fired(
        &mut self,
        wheel: &mut TimerWheel,
        host: &dyn HostAdapter,
        now: Instant,
    ) {
        if self.looping && self.minutes > 0 {
            wheel.set(
                self.name.clone(),
                Duration::from_secs(u64::from(self.minutes) * 60),
                now,
            );
        }
        let payload = json!(AlarmPayload {
            name: self.name.clone(),
        });
        if let Err(e) = host.notify(BusMethod::Alarm.send(), payload).await {
            debug!(alarm = %self.name, error = %e, "alarm fire notification failed");
        }
    }

    /// Observe a bus notification; on this alarm's own fire, rebroadcast
    /// the configured message. Returns whether the notification was ours.
    pub async fn on_notification(
        &mut self,
        method: &str,
        data: &Value,
        host: &dyn HostAdapter,
    ) -> bool {
        if method != BusMethod::Alarm.recv() {
            return false;
        }
        if data.get("name").and_then(Value::as_str) != Some(self.name.as_str()) {
            return false;
        }

        debug!(alarm = %self.name, "alarm fired");
        let data = self.data.clone().unwrap_or_else(|| json!({}));
        if let Err(e) = host.notify(self.message.send(), data).await {
            debug!(alarm = %self.name, error = %e, "alarm rebroadcast failed");
        }
        if !self.looping {
            self.minutes = 0;
        }
        true
    }
}

#[cfg(test)]
#[path = "alarm_tests.rs"]
mod tests;
