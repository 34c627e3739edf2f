// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-through accessor over the host's video library RPC.
//!
//! [`MediaGateway`] wraps the raw host adapter with typed list, stat, and
//! player queries. [`MediaInfo`] is a lazily populated view of one item:
//! each attribute is fetched on first access and cached for the life of the
//! value, and the raw response text is kept so the checksum reflects any
//! host-visible change.

use chrono::{DateTime, NaiveDateTime, Utc};
use nfo_adapters::{HostAdapter, RequestError};
use nfo_core::{MediaItem, MediaType, MovieNfoNaming};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Strip the host's `image://` wrapping and percent-encoding from an art URL.
pub fn decode_image(path: &str) -> String {
    let stripped = path.strip_prefix("image://").unwrap_or(path);
    let stripped = stripped.strip_suffix('/').unwrap_or(stripped);
    percent_decode(stripped)
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let decoded = (bytes[i] == b'%' && i + 2 < bytes.len())
            .then(|| std::str::from_utf8(&bytes[i + 1..i + 3]).ok())
            .flatten()
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match decoded {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Swap a path's extension, `"/a/b.mkv" -> "/a/b.nfo"`.
pub fn replace_extension(path: &str, extension: &str) -> String {
    match path.rfind('.') {
        Some(dot) if !path[dot..].contains('/') => format!("{}{extension}", &path[..dot]),
        _ => format!("{path}{extension}"),
    }
}

fn sibling(path: &str, name: &str) -> String {
    match path.rfind('/') {
        Some(slash) => format!("{}/{name}", &path[..slash]),
        None => name.to_string(),
    }
}

/// `<dir>/movie.nfo` for a movie content path.
pub fn movie_nfo(path: &str) -> String {
    sibling(path, "movie.nfo")
}

/// `<basename>.nfo` for a movie or episode content path.
pub fn filename_nfo(path: &str) -> String {
    replace_extension(path, ".nfo")
}

/// `<dir>/tvshow.nfo` for a tvshow directory path.
pub fn tvshow_nfo(path: &str) -> String {
    format!("{}/tvshow.nfo", path.trim_end_matches('/'))
}

/// Typed read-through accessor over the host RPC.
#[derive(Clone)]
pub struct MediaGateway {
    host: Arc<dyn HostAdapter>,
}

impl MediaGateway {
    pub fn new(host: Arc<dyn HostAdapter>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Arc<dyn HostAdapter> {
        &self.host
    }

    /// List every library item of a type, with its content path.
    pub async fn get_all(&self, media_type: MediaType) -> Result<Vec<MediaItem>, RequestError> {
        let result = self
            .host
            .request(media_type.list_method(), json!({ "properties": ["file"] }))
            .await?;

        let Some(entries) = result
            .get(media_type.list_container())
            .and_then(Value::as_array)
        else {
            return Ok(Vec::new());
        };

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let id = entry.get(media_type.id_key())?.as_u64()?;
                let id = u32::try_from(id).ok()?;
                Some(match entry.get("file").and_then(Value::as_str) {
                    Some(file) => MediaItem::with_file(media_type, id, file),
                    None => MediaItem::new(media_type, id),
                })
            })
            .collect())
    }

    /// Modification time of a file through the host's stat RPC, in UTC.
    ///
    /// A missing file, failed stat, or unparseable timestamp yields `None`.
    pub async fn file_mtime(&self, path: &str) -> Option<DateTime<Utc>> {
        let result = match self
            .host
            .request(
                "Files.GetFileDetails",
                json!({ "file": path, "properties": ["lastmodified"] }),
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                debug!(path, error = %e, "file stat failed");
                return None;
            }
        };

        let stamp = result
            .get("filedetails")
            .and_then(|d| d.get("lastmodified"))
            .and_then(Value::as_str)?;
        parse_host_timestamp(stamp)
    }

    /// Whether the host is currently playing anything.
    pub async fn is_playback_active(&self) -> bool {
        match self
            .host
            .request("Player.GetActivePlayers", json!({}))
            .await
        {
            Ok(result) => result.as_array().is_some_and(|players| !players.is_empty()),
            Err(e) => {
                debug!(error = %e, "active player query failed");
                false
            }
        }
    }
}

fn parse_host_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(stamp) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Details and art of one season of a tvshow.
#[derive(Debug, Clone)]
pub struct SeasonInfo {
    pub number: i64,
    pub details: Value,
    pub art: Value,
}

enum NfoPath {
    Unresolved,
    Missing,
    At(String),
}

/// Lazily populated view of a [`MediaItem`].
pub struct MediaInfo {
    item: MediaItem,
    file: Option<String>,
    nfo: NfoPath,
    details: Option<Value>,
    raw_details: Option<String>,
    art: Option<Value>,
    raw_art: Option<String>,
    movieset: Option<Value>,
    raw_movieset: Option<String>,
    seasons: Option<Vec<SeasonInfo>>,
    raw_seasons: Option<String>,
    checksum: Option<u32>,
}

impl MediaInfo {
    pub fn new(item: MediaItem) -> Self {
        let file = item.file.clone();
        Self {
            item,
            file,
            nfo: NfoPath::Unresolved,
            details: None,
            raw_details: None,
            art: None,
            raw_art: None,
            movieset: None,
            raw_movieset: None,
            seasons: None,
            raw_seasons: None,
            checksum: None,
        }
    }

    pub fn item(&self) -> &MediaItem {
        &self.item
    }

    pub fn media_type(&self) -> MediaType {
        self.item.media_type
    }

    pub fn library_id(&self) -> u32 {
        self.item.library_id
    }

    /// Content path, fetched from the host when the item arrived without one.
    pub async fn file(&mut self, gateway: &MediaGateway) -> Result<String, RequestError> {
        if self.file.is_none() {
            let media_type = self.item.media_type;
            let result = gateway
                .host()
                .request(
                    media_type.details_method(),
                    json!({ (media_type.id_key()): self.item.library_id, "properties": ["file"] }),
                )
                .await?;
            let file = result
                .get(media_type.details_container())
                .and_then(|d| d.get("file"))
                .and_then(Value::as_str)
                .ok_or_else(|| RequestError::Malformed {
                    method: media_type.details_method().to_string(),
                    message: "details response carries no file path".to_string(),
                })?;
            self.file = Some(file.to_string());
        }
        Ok(self.file.clone().unwrap_or_default())
    }

    /// Path of the existing sidecar, or `None` when the item has none.
    pub async fn nfo_path(&mut self, gateway: &MediaGateway) -> Result<Option<String>, RequestError> {
        self.resolve_nfo(gateway).await?;
        Ok(match &self.nfo {
            NfoPath::At(path) => Some(path.clone()),
            _ => None,
        })
    }

    /// Modification time of the existing sidecar; `None` when absent.
    pub async fn nfo_mtime(
        &mut self,
        gateway: &MediaGateway,
    ) -> Result<Option<DateTime<Utc>>, RequestError> {
        self.resolve_nfo(gateway).await?;
        Ok(match &self.nfo {
            NfoPath::At(path) => gateway.file_mtime(path).await,
            _ => None,
        })
    }

    /// Choose the path a fresh sidecar will be created at.
    pub async fn create_nfo_path(
        &mut self,
        gateway: &MediaGateway,
        naming: MovieNfoNaming,
    ) -> Result<String, RequestError> {
        let file = self.file(gateway).await?;
        let path = match self.item.media_type {
            MediaType::Movie => match naming {
                MovieNfoNaming::Movie => movie_nfo(&file),
                MovieNfoNaming::Filename => filename_nfo(&file),
            },
            MediaType::TvShow => tvshow_nfo(&file),
            MediaType::Episode => filename_nfo(&file),
        };
        self.nfo = NfoPath::At(path.clone());
        Ok(path)
    }

    async fn resolve_nfo(&mut self, gateway: &MediaGateway) -> Result<(), RequestError> {
        if !matches!(self.nfo, NfoPath::Unresolved) {
            return Ok(());
        }
        let file = self.file(gateway).await?;

        let candidates: Vec<String> = match self.item.media_type {
            MediaType::Movie => vec![movie_nfo(&file), filename_nfo(&file)],
            MediaType::TvShow => vec![tvshow_nfo(&file)],
            MediaType::Episode => vec![filename_nfo(&file)],
        };

        for candidate in candidates {
            if gateway.file_mtime(&candidate).await.is_some() {
                self.nfo = NfoPath::At(candidate);
                return Ok(());
            }
        }
        self.nfo = NfoPath::Missing;
        Ok(())
    }

    /// Full item details, fetched once.
    pub async fn details(&mut self, gateway: &MediaGateway) -> Result<&Value, RequestError> {
        if self.details.is_none() {
            let media_type = self.item.media_type;
            let result = gateway
                .host()
                .request(
                    media_type.details_method(),
                    json!({
                        (media_type.id_key()): self.item.library_id,
                        "properties": media_type.detail_properties(),
                    }),
                )
                .await?;
            let details = result
                .get(media_type.details_container())
                .cloned()
                .unwrap_or_else(|| json!({}));
            self.raw_details = Some(details.to_string());
            self.details = Some(details);
        }
        Ok(self.details.get_or_insert_with(Value::default))
    }

    /// Available artwork entries (`{arttype, url, previewurl?}`).
    pub async fn art(&mut self, gateway: &MediaGateway) -> Result<&Value, RequestError> {
        if self.art.is_none() {
            let art = request_art(
                gateway,
                self.item.media_type.id_key(),
                u64::from(self.item.library_id),
            )
            .await?;
            self.raw_art = Some(art.to_string());
            self.art = Some(art);
        }
        Ok(self.art.get_or_insert_with(Value::default))
    }

    /// Movie set details, or an empty object when the item has no set.
    pub async fn movieset(&mut self, gateway: &MediaGateway) -> Result<&Value, RequestError> {
        if self.movieset.is_none() {
            let set_id = if self.item.media_type == MediaType::Movie {
                self.details(gateway)
                    .await?
                    .get("setid")
                    .and_then(Value::as_u64)
                    .unwrap_or(0)
            } else {
                0
            };

            let movieset = if set_id == 0 {
                json!({})
            } else {
                let result = gateway
                    .host()
                    .request(
                        "VideoLibrary.GetMovieSetDetails",
                        json!({ "setid": set_id, "properties": ["title", "plot"] }),
                    )
                    .await?;
                result.get("setdetails").cloned().unwrap_or_else(|| json!({}))
            };
            self.raw_movieset = Some(movieset.to_string());
            self.movieset = Some(movieset);
        }
        Ok(self.movieset.get_or_insert_with(Value::default))
    }

    /// Seasons with per-season art; empty for anything but a tvshow.
    pub async fn seasons(&mut self, gateway: &MediaGateway) -> Result<&[SeasonInfo], RequestError> {
        if self.seasons.is_none() {
            let mut seasons = Vec::new();
            let mut raw_parts = Vec::new();

            if self.item.media_type == MediaType::TvShow {
                let result = gateway
                    .host()
                    .request(
                        "VideoLibrary.GetSeasons",
                        json!({
                            "tvshowid": self.item.library_id,
                            "properties": ["title", "season"],
                        }),
                    )
                    .await?;
                let entries = result
                    .get("seasons")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();

                for entry in entries {
                    let art = match entry.get("seasonid").and_then(Value::as_u64) {
                        Some(season_id) => request_art(gateway, "seasonid", season_id).await?,
                        None => json!([]),
                    };
                    let number = entry.get("season").and_then(Value::as_i64).unwrap_or(0);
                    raw_parts.push(json!({ "details": entry.clone(), "art": art.clone() }));
                    seasons.push(SeasonInfo {
                        number,
                        details: entry,
                        art,
                    });
                }
            }

            self.raw_seasons = Some(Value::Array(raw_parts).to_string());
            self.seasons = Some(seasons);
        }
        Ok(self.seasons.get_or_insert_with(Vec::new))
    }

    /// Already-fetched details; `None` before the first [`MediaInfo::details`] call.
    pub fn cached_details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    pub fn cached_art(&self) -> Option<&Value> {
        self.art.as_ref()
    }

    pub fn cached_movieset(&self) -> Option<&Value> {
        self.movieset.as_ref()
    }

    pub fn cached_seasons(&self) -> &[SeasonInfo] {
        self.seasons.as_deref().unwrap_or(&[])
    }

    /// CRC32 over the raw host responses, in fetch order.
    ///
    /// Sensitive to any host-visible change in details, art, movie set, or
    /// seasons; computing it twice without refetching returns the same value.
    pub async fn checksum(&mut self, gateway: &MediaGateway) -> Result<u32, RequestError> {
        if let Some(checksum) = self.checksum {
            return Ok(checksum);
        }

        self.details(gateway).await?;
        self.art(gateway).await?;
        self.movieset(gateway).await?;
        self.seasons(gateway).await?;

        let mut hasher = crc32fast::Hasher::new();
        for raw in [
            &self.raw_details,
            &self.raw_art,
            &self.raw_movieset,
            &self.raw_seasons,
        ]
        .into_iter()
        .flatten()
        {
            hasher.update(raw.as_bytes());
        }

        let checksum = hasher.finalize();
        self.checksum = Some(checksum);
        Ok(checksum)
    }
}

async fn request_art(
    gateway: &MediaGateway,
    id_key: &str,
    id: u64,
) -> Result<Value, RequestError> {
    let result = gateway
        .host()
        .request(
            "VideoLibrary.GetAvailableArt",
            json!({ "item": { (id_key): id } }),
        )
        .await?;
    Ok(result
        .get("availableart")
        .cloned()
        .unwrap_or_else(|| json!([])))
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
