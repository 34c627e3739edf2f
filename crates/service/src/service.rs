// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The service event loop's brain.
//!
//! [`Service`] holds the scheduler, the two alarms (periodic trigger and
//! post-stop play wait), and the action context. The surrounding event loop
//! feeds it bus notifications, timer deadlines, a coarse schedule tick, and
//! settings reloads; every method runs to completion before the next is
//! invoked, which is what serializes the whole engine.

use nfo_core::{
    messages, BusMethod, ItemPayload, MediaItem, Notification, PatientPayload, Settings,
};
use nfo_engine::actions::{export_all, import_all, sync_all, sync_one, ExportOne};
use nfo_engine::schedule;
use nfo_engine::{ActionCtx, Alarm, MediaInfo, Scheduler, TimerWheel};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const PERIODIC_ALARM: &str = "nfosync.periodic_trigger";
const PLAY_WAIT_ALARM: &str = "nfosync.play_wait";

pub struct Service {
    scheduler: Scheduler,
    ctx: ActionCtx,
    timers: TimerWheel,
    periodic_trigger: Alarm,
    play_wait: Alarm,
}

impl Service {
    pub fn new(ctx: ActionCtx) -> Self {
        Self {
            scheduler: Scheduler::new(),
            ctx,
            timers: TimerWheel::new(),
            periodic_trigger: Alarm::new(PERIODIC_ALARM, BusMethod::SyncAll)
                .with_data(json!({ "patient": true }))
                .looping(),
            play_wait: Alarm::new(PLAY_WAIT_ALARM, BusMethod::WaitDone),
        }
    }

    /// Start-up sequence: queue the initial sync when configured or when a
    /// scheduled sync was missed, compute the next scheduled slot, and arm
    /// the periodic trigger.
    pub async fn start(&mut self) {
        if self.ctx.settings.triggers.sync_on_start {
            info!("start-up sync");
            self.enqueue_sync_all(false, false);
        } else if self.ctx.settings.scheduled.run_missed_syncs && self.is_scheduled_sync_due() {
            info!("running missed scheduled sync");
            self.enqueue_sync_all(false, false);
        }

        self.refresh_schedule().await;

        let period = self.ctx.settings.periodic.period_minutes();
        self.periodic_trigger
            .set(&mut self.timers, period, self.ctx.clock.instant());

        self.run_loop().await;
    }

    /// Earliest alarm deadline, for the event-loop sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Whether the scheduler has nothing active and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Dispatch one bus notification. Stops at the first match.
    pub async fn on_notification(&mut self, notification: &Notification) {
        let method = notification.method.as_str();
        let data = &notification.data;

        // Alarm fires rebroadcast through the bus before anything else
        // reacts; nothing awaits the internal alarm method.
        if method == BusMethod::Alarm.recv() {
            let host = Arc::clone(self.ctx.gateway.host());
            if !self
                .periodic_trigger
                .on_notification(method, data, host.as_ref())
                .await
            {
                self.play_wait
                    .on_notification(method, data, host.as_ref())
                    .await;
            }
            return;
        }

        // The active action's awaited event.
        let patient_open = self.patient_gate_open().await;
        if self
            .scheduler
            .on_event(&mut self.ctx, method, data, patient_open)
            .await
        {
            return;
        }

        if method == BusMethod::SyncAll.recv() {
            self.enqueue_sync_all(false, patient_of(data));
            self.run_loop().await;
        } else if method == BusMethod::SyncOne.recv() {
            if let Some((item, patient)) = item_of(data) {
                self.scheduler.enqueue(Box::new(sync_one(item)), patient);
                self.run_loop().await;
            }
        } else if method == BusMethod::ImportAll.recv() {
            self.scheduler
                .enqueue(Box::new(import_all()), patient_of(data));
            self.run_loop().await;
        } else if method == BusMethod::ExportOne.recv() {
            if let Some((item, patient)) = item_of(data) {
                self.scheduler
                    .enqueue(Box::new(ExportOne::new(item)), patient);
                self.run_loop().await;
            }
        } else if method == BusMethod::ExportAll.recv() {
            self.scheduler
                .enqueue(Box::new(export_all()), patient_of(data));
            self.run_loop().await;
        } else if method == BusMethod::WaitDone.recv() {
            self.play_wait.cancel(&mut self.timers);
            self.run_loop().await;
        } else if method == "Player.OnPlay" {
            self.play_wait.cancel(&mut self.timers);
        } else if method == "Player.OnStop" {
            self.on_player_stopped().await;
        } else if method == "VideoLibrary.OnUpdate" {
            if self.ctx.settings.triggers.export_on_update {
                self.on_library_update(data).await;
            }
        } else if method == "VideoLibrary.OnScanFinished" {
            if self.ctx.settings.triggers.sync_on_scan {
                self.enqueue_sync_all(true, true);
                self.run_loop().await;
            }
        } else {
            debug!(method, "ignoring notification");
        }
    }

    /// Coarse periodic check (~60s): queue the scheduled sync when due.
    pub async fn tick(&mut self) {
        if self.is_scheduled_sync_due() {
            info!("scheduled sync due");
            self.enqueue_sync_all(false, true);
            self.refresh_schedule().await;
        }
        self.run_loop().await;
    }

    /// Drain fired timers into their alarms.
    pub async fn on_timer_deadline(&mut self) {
        let now = self.ctx.clock.instant();
        let host = Arc::clone(self.ctx.gateway.host());
        for name in self.timers.fired(now) {
            if name == self.periodic_trigger.name() {
                self.periodic_trigger
                    .on_fired(&mut self.timers, host.as_ref(), now)
                    .await;
            } else if name == self.play_wait.name() {
                self.play_wait
                    .on_fired(&mut self.timers, host.as_ref(), now)
                    .await;
            } else {
                debug!(timer = %name, "ignoring unknown timer");
            }
        }
    }

    /// Apply freshly loaded settings: re-arm alarms whose inputs changed,
    /// recompute the schedule, and re-run the loop (the change may have
    /// opened the patient gate).
    pub async fn on_settings_changed(&mut self, settings: Settings) {
        let old_period = self.ctx.settings.periodic.period_minutes();
        let old_wait = self.ctx.settings.avoidance.wait_minutes();
        self.ctx.settings = settings;

        let now = self.ctx.clock.instant();
        let new_period = self.ctx.settings.periodic.period_minutes();
        if new_period != old_period {
            self.periodic_trigger.set(&mut self.timers, new_period, now);
        }
        let new_wait = self.ctx.settings.avoidance.wait_minutes();
        if self.play_wait.is_active() && new_wait != old_wait {
            self.play_wait.set(&mut self.timers, new_wait, now);
        }

        self.refresh_schedule().await;
        self.run_loop().await;
    }

    /// Final flush before exit. The current action, if any, is abandoned.
    pub async fn shutdown(&mut self) {
        if let Some(kind) = self.scheduler.active_kind() {
            warn!(action = %kind, "abandoning active action on shutdown");
        }
        if let Err(e) = self.ctx.last_known.write_changes() {
            warn!(error = %e, "final state flush failed");
        }
        info!("service stopped");
    }

    async fn run_loop(&mut self) {
        let patient_open = self.patient_gate_open().await;
        self.scheduler.run_loop(&mut self.ctx, patient_open).await;
    }

    /// Patient work may start only while nothing is playing (when avoidance
    /// is on) and no post-stop wait is pending.
    async fn patient_gate_open(&self) -> bool {
        if self.play_wait.is_active() {
            return false;
        }
        if self.ctx.settings.avoidance.is_enabled && self.ctx.gateway.is_playback_active().await {
            return false;
        }
        true
    }

    fn enqueue_sync_all(&mut self, skip_scan: bool, patient: bool) {
        let action = sync_all(&self.ctx.settings.sync, skip_scan);
        self.scheduler.enqueue(Box::new(action), patient);
    }

    async fn on_player_stopped(&mut self) {
        let wait = self.ctx.settings.avoidance.wait_minutes();
        if wait > 0 {
            self.play_wait
                .set(&mut self.timers, wait, self.ctx.clock.instant());
        } else if let Err(e) = self
            .ctx
            .gateway
            .host()
            .notify(BusMethod::WaitDone.send(), json!({}))
            .await
        {
            debug!(error = %e, "wait-done notification failed");
        }
    }

    /// Library update: suppress refresh echoes and plain additions (while
    /// pinning their checksum so a later sync stays quiet); export anything
    /// else.
    async fn on_library_update(&mut self, data: &Value) {
        let Some(item) = update_item_of(data) else {
            return;
        };

        let added = data.get("added").and_then(Value::as_bool).unwrap_or(false);
        let transaction = data
            .get("transaction")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if added && (self.ctx.settings.triggers.ignores_add_updates || !transaction) {
            debug!(item = %item, "suppressing add-update echo");
            let mut info = MediaInfo::new(item.clone());
            match info.checksum(&self.ctx.gateway).await {
                Ok(checksum) => {
                    self.ctx
                        .last_known
                        .set_checksum(item.media_type, item.library_id, checksum);
                }
                Err(e) => debug!(item = %item, error = %e, "checksum for echo suppression failed"),
            }
            return;
        }

        self.scheduler
            .enqueue(Box::new(ExportOne::new(item)), false);
        self.run_loop().await;
    }

    fn is_scheduled_sync_due(&self) -> bool {
        schedule::is_scheduled_sync_due(
            &self.ctx.settings.scheduled,
            self.ctx.clock.now_local(),
            self.ctx.timestamps.next_scheduled(),
        )
    }

    async fn refresh_schedule(&mut self) {
        if !self.ctx.settings.scheduled.is_enabled {
            return;
        }
        let Some(next) =
            schedule::update_schedule(self.ctx.clock.now_local(), &self.ctx.settings.scheduled)
        else {
            return;
        };
        if self.ctx.timestamps.next_scheduled() == next {
            return;
        }
        debug!(%next, "next scheduled sync");
        if self.ctx.timestamps.set_next_scheduled(next).is_err() {
            self.ctx
                .notify_code(messages::MSG_TIMESTAMPS_WRITE_FAILED)
                .await;
        }
    }
}

fn patient_of(data: &Value) -> bool {
    serde_json::from_value::<PatientPayload>(data.clone())
        .map(|p| p.patient)
        .unwrap_or(false)
}

fn item_of(data: &Value) -> Option<(MediaItem, bool)> {
    let payload: ItemPayload = match serde_json::from_value(data.clone()) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "malformed item payload");
            return None;
        }
    };
    Some((
        MediaItem::new(payload.media_type, payload.id),
        payload.patient,
    ))
}

/// Item of a `VideoLibrary.OnUpdate` payload; `None` for non-video types.
fn update_item_of(data: &Value) -> Option<MediaItem> {
    let item = data.get("item")?;
    let media_type = item.get("type")?.as_str()?.parse().ok()?;
    let id = u32::try_from(item.get("id")?.as_u64()?).ok()?;
    Some(MediaItem::new(media_type, id))
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
