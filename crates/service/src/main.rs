// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nfosync service (nfosyncd)
//!
//! Long-lived process keeping the host's video library and per-item
//! sidecar files in sync.
//!
//! Architecture:
//! - A socket reader task turns host traffic into a notification mailbox
//! - The event loop below drains that mailbox serially and drives the
//!   engine; alarms and the schedule tick share the same loop

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use nfo_adapters::{
    DesktopNotify, HostAdapter, LogProgress, NoOpNotify, NotifyAdapter, ProgressSink, SocketHost,
};
use nfo_core::{Clock, Notification, Settings, SystemClock};
use nfo_engine::{ActionCtx, MediaGateway};
use nfo_service::Service;
use nfo_storage::{LastKnown, Timestamps};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter};

type FilterHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("nfosyncd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("nfosyncd {}", env!("CARGO_PKG_VERSION"));
                println!("Keeps the media host's video library in sync with sidecar files");
                println!();
                println!("USAGE:");
                println!("    nfosyncd");
                println!();
                println!("Settings are read from <profile>/settings.toml; the profile");
                println!("directory honors $NFOSYNC_PROFILE. One-shot commands are sent");
                println!("with the `nfosync` CLI over the host bus.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -V, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: nfosyncd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let profile = nfo_core::profile_dir();
    std::fs::create_dir_all(&profile)?;
    let settings_path = profile.join("settings.toml");
    let settings = Settings::load(&settings_path)?;

    let (filter_handle, _log_guard) = setup_logging(&profile, &settings)?;
    info!(profile = %profile.display(), "starting nfosync service");

    let (host, notifications) = SocketHost::connect(&settings.host.socket).await?;
    let host: Arc<dyn HostAdapter> = Arc::new(host);

    let notifier: Arc<dyn NotifyAdapter> = if settings.ui.should_show_notifications {
        Arc::new(DesktopNotify::new())
    } else {
        Arc::new(NoOpNotify::new())
    };
    let progress: Box<dyn ProgressSink> = Box::new(LogProgress::new(settings.ui.should_show_sync));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let ctx = ActionCtx {
        gateway: MediaGateway::new(host),
        last_known: LastKnown::load(&profile)?,
        timestamps: Timestamps::load(&profile, Utc::now()),
        settings,
        notifier,
        progress,
        clock,
        export_failures: 0,
    };

    let mut service = Service::new(ctx);
    service.start().await;

    run_event_loop(&mut service, notifications, &settings_path, &filter_handle).await;

    service.shutdown().await;
    Ok(())
}

async fn run_event_loop(
    service: &mut Service,
    mut notifications: mpsc::Receiver<Notification>,
    settings_path: &Path,
    filter_handle: &FilterHandle,
) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "unable to install SIGTERM handler");
            return;
        }
    };
    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "unable to install SIGHUP handler");
            return;
        }
    };

    // Coarse re-check of the scheduled-sync clock.
    let mut schedule_check = tokio::time::interval(Duration::from_secs(60));
    schedule_check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            notification = notifications.recv() => match notification {
                Some(notification) => service.on_notification(&notification).await,
                None => {
                    warn!("host connection closed");
                    break;
                }
            },
            _ = sleep_until(service.next_deadline()) => service.on_timer_deadline().await,
            _ = schedule_check.tick() => service.tick().await,
            _ = sighup.recv() => reload_settings(service, settings_path, filter_handle).await,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
            _ = sigterm.recv() => {
                info!("termination requested");
                break;
            }
        }
    }
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

async fn reload_settings(service: &mut Service, path: &Path, filter_handle: &FilterHandle) {
    match Settings::load(path) {
        Ok(settings) => {
            info!("settings reloaded");
            if let Err(e) = filter_handle.reload(filter_for(&settings)) {
                warn!(error = %e, "unable to re-apply log verbosity");
            }
            service.on_settings_changed(settings).await;
        }
        Err(e) => warn!(error = %e, "keeping previous settings"),
    }
}

fn filter_for(settings: &Settings) -> EnvFilter {
    let level = if settings.ui.is_logging_verbose {
        "debug"
    } else {
        "info"
    };
    EnvFilter::new(level)
}

fn setup_logging(
    profile: &Path,
    settings: &Settings,
) -> Result<(FilterHandle, tracing_appender::non_blocking::WorkerGuard), Box<dyn std::error::Error>>
{
    let file_appender = tracing_appender::rolling::never(profile, "nfosyncd.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let (filter, filter_handle) = reload::Layer::new(filter_for(settings));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    Ok((filter_handle, guard))
}
