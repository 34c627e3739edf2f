// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nfosync one-shot command.
//!
//! Each verb broadcasts the matching internal bus message and exits; the
//! running service picks the message up and does the work. A trailing
//! `patient` token defers the work while media is playing.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use nfo_adapters::{DesktopNotify, HostAdapter, NotifyAdapter, SocketHost};
use nfo_core::{messages, BusMethod, ItemPayload, MediaType, PatientPayload, Settings};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "nfosync", version, about = "Send a one-shot command to the nfosync service")]
struct Cli {
    #[command(subcommand)]
    verb: Verb,
}

#[derive(Subcommand)]
enum Verb {
    /// Sync every library item both ways
    #[command(name = "sync_all")]
    SyncAll { patient: Option<String> },
    /// Sync a single item: `sync_one <type> <id>`
    #[command(name = "sync_one")]
    SyncOne {
        media_type: String,
        id: u32,
        patient: Option<String>,
    },
    /// Refresh every item from its sidecar
    #[command(name = "import_all")]
    ImportAll { patient: Option<String> },
    /// Export a single item: `export_one <type> <id>`
    #[command(name = "export_one")]
    ExportOne {
        media_type: String,
        id: u32,
        patient: Option<String>,
    },
    /// Export every library item to its sidecar
    #[command(name = "export_all")]
    ExportAll { patient: Option<String> },
}

/// Interpret the optional trailing token; anything but `patient` is an
/// invocation error.
fn patience(token: Option<String>) -> Result<bool, String> {
    match token.as_deref() {
        None => Ok(false),
        Some("patient") => Ok(true),
        Some(other) => Err(format!("unexpected trailing argument '{other}'")),
    }
}

fn parse_type(raw: &str) -> Result<MediaType, String> {
    raw.parse()
        .map_err(|_| format!("unknown media type '{raw}' (expected movie, tvshow, or episode)"))
}

/// Resolve a verb to the bus message it broadcasts.
fn resolve(verb: Verb) -> Result<(BusMethod, Value), String> {
    match verb {
        Verb::SyncAll { patient } => Ok((
            BusMethod::SyncAll,
            json!(PatientPayload {
                patient: patience(patient)?,
            }),
        )),
        Verb::SyncOne {
            media_type,
            id,
            patient,
        } => Ok((
            BusMethod::SyncOne,
            json!(ItemPayload {
                media_type: parse_type(&media_type)?,
                id,
                patient: patience(patient)?,
            }),
        )),
        Verb::ImportAll { patient } => Ok((
            BusMethod::ImportAll,
            json!(PatientPayload {
                patient: patience(patient)?,
            }),
        )),
        Verb::ExportOne {
            media_type,
            id,
            patient,
        } => Ok((
            BusMethod::ExportOne,
            json!(ItemPayload {
                media_type: parse_type(&media_type)?,
                id,
                patient: patience(patient)?,
            }),
        )),
        Verb::ExportAll { patient } => Ok((
            BusMethod::ExportAll,
            json!(PatientPayload {
                patient: patience(patient)?,
            }),
        )),
    }
}

async fn notify_bad_invocation() {
    DesktopNotify::new()
        .notify(
            nfo_core::message(messages::MSG_SYNC_HEADING),
            nfo_core::message(messages::MSG_BAD_INVOCATION),
        )
        .await;
}

async fn run() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            e.print().ok();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            notify_bad_invocation().await;
            std::process::exit(2);
        }
    };

    let (method, data) = match resolve(cli.verb) {
        Ok(resolved) => resolved,
        Err(message) => {
            eprintln!("error: {message}");
            notify_bad_invocation().await;
            std::process::exit(2);
        }
    };

    let profile = nfo_core::profile_dir();
    let settings = Settings::load(&profile.join("settings.toml"))
        .context("unable to load settings")?;

    let (host, _notifications) = SocketHost::connect(&settings.host.socket)
        .await
        .with_context(|| {
            format!(
                "unable to reach the media host at {}",
                settings.host.socket.display()
            )
        })?;
    host.notify(method.send(), data)
        .await
        .context("unable to broadcast the command")?;

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
