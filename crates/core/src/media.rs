// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Library media types and items.
//!
//! A [`MediaItem`] identifies one entry in the host's video library. The
//! host addresses each kind of entry through its own set of RPC methods and
//! JSON keys; those names live here so callers never build them by hand.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// The kinds of library entries the engine synchronizes.
///
/// Bulk operations always walk types in [`MediaType::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    #[serde(rename = "tvshow")]
    TvShow,
    Episode,
}

/// Error for an unrecognized media type string.
#[derive(Debug, Error)]
#[error("unknown media type: {0}")]
pub struct UnknownMediaType(pub String);

impl MediaType {
    /// Fixed processing order for bulk actions.
    pub const ALL: [MediaType; 3] = [MediaType::Movie, MediaType::TvShow, MediaType::Episode];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::TvShow => "tvshow",
            MediaType::Episode => "episode",
        }
    }

    /// Host method that lists every item of this type.
    pub fn list_method(&self) -> &'static str {
        match self {
            MediaType::Movie => "VideoLibrary.GetMovies",
            MediaType::TvShow => "VideoLibrary.GetTVShows",
            MediaType::Episode => "VideoLibrary.GetEpisodes",
        }
    }

    /// Host method that returns one item's details.
    pub fn details_method(&self) -> &'static str {
        match self {
            MediaType::Movie => "VideoLibrary.GetMovieDetails",
            MediaType::TvShow => "VideoLibrary.GetTVShowDetails",
            MediaType::Episode => "VideoLibrary.GetEpisodeDetails",
        }
    }

    /// Host method that re-reads one item's sidecar.
    pub fn refresh_method(&self) -> &'static str {
        match self {
            MediaType::Movie => "VideoLibrary.RefreshMovie",
            MediaType::TvShow => "VideoLibrary.RefreshTVShow",
            MediaType::Episode => "VideoLibrary.RefreshEpisode",
        }
    }

    /// JSON key carrying the library id in requests and responses.
    pub fn id_key(&self) -> &'static str {
        match self {
            MediaType::Movie => "movieid",
            MediaType::TvShow => "tvshowid",
            MediaType::Episode => "episodeid",
        }
    }

    /// JSON key wrapping the item list in a list response.
    pub fn list_container(&self) -> &'static str {
        match self {
            MediaType::Movie => "movies",
            MediaType::TvShow => "tvshows",
            MediaType::Episode => "episodes",
        }
    }

    /// JSON key wrapping the item object in a details response.
    pub fn details_container(&self) -> &'static str {
        match self {
            MediaType::Movie => "moviedetails",
            MediaType::TvShow => "tvshowdetails",
            MediaType::Episode => "episodedetails",
        }
    }

    /// Detail properties requested from the host for this type.
    pub fn detail_properties(&self) -> &'static [&'static str] {
        match self {
            MediaType::Movie => &[
                "title", "genre", "year", "director", "trailer", "tagline", "plot",
                "plotoutline", "originaltitle", "lastplayed", "playcount", "writer",
                "studio", "mpaa", "cast", "country", "runtime", "setid", "showlink",
                "streamdetails", "top250", "sorttitle", "dateadded", "tag",
                "userrating", "ratings", "premiered", "uniqueid",
            ],
            MediaType::TvShow => &[
                "title", "genre", "year", "plot", "studio", "mpaa", "cast", "playcount",
                "episode", "premiered", "lastplayed", "originaltitle", "sorttitle",
                "season", "dateadded", "tag", "userrating", "ratings", "runtime",
                "uniqueid",
            ],
            MediaType::Episode => &[
                "title", "plot", "writer", "firstaired", "playcount", "runtime",
                "director", "season", "episode", "originaltitle", "showtitle", "cast",
                "streamdetails", "lastplayed", "dateadded", "uniqueid",
                "specialsortseason", "specialsortepisode", "userrating", "ratings",
            ],
        }
    }

    /// File stem of the persistent last-known store for this type.
    pub fn store_stem(&self) -> &'static str {
        match self {
            MediaType::Movie => "movies",
            MediaType::TvShow => "tvshows",
            MediaType::Episode => "episodes",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = UnknownMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "tvshow" => Ok(MediaType::TvShow),
            "episode" => Ok(MediaType::Episode),
            other => Err(UnknownMediaType(other.to_string())),
        }
    }
}

/// One entry of the host's video library.
///
/// `file` is the content path as reported by the host and is carried
/// opportunistically; identity is `(media_type, library_id)` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub library_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl MediaItem {
    pub fn new(media_type: MediaType, library_id: u32) -> Self {
        Self {
            media_type,
            library_id,
            file: None,
        }
    }

    pub fn with_file(media_type: MediaType, library_id: u32, file: impl Into<String>) -> Self {
        Self {
            media_type,
            library_id,
            file: Some(file.into()),
        }
    }
}

impl PartialEq for MediaItem {
    fn eq(&self, other: &Self) -> bool {
        self.media_type == other.media_type && self.library_id == other.library_id
    }
}

impl Eq for MediaItem {}

impl Hash for MediaItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.media_type.hash(state);
        self.library_id.hash(state);
    }
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.media_type, self.library_id)
    }
}

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;
