// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sidecar field mapping.
//!
//! Takes the host's view of an item (details, art, movie set, seasons) and
//! folds it into a sidecar element tree. Each detail field is routed to a
//! handler; fields without one go through the generic tag emitter with a
//! small remap table. Existing tags are preserved when overwriting is not
//! allowed, with play-state tags as the exception: those always track the
//! library.

use crate::gateway::{decode_image, replace_extension, SeasonInfo};
use crate::nfo::Element;
use nfo_core::config::ExportSettings;
use nfo_core::{ActorHandling, MediaType};
use serde_json::Value;

/// Fields never emitted to a sidecar. `label` duplicates `title` in every
/// host response, the id keys are library-local.
const IGNORED_FIELDS: [&str; 4] = ["label", "movieid", "episodeid", "tvshowid"];

/// Fields kept when `export.is_minimal` is on.
const MINIMAL_FIELDS: [&str; 2] = ["playcount", "lastplayed"];

const TAG_REMAPS: [(&str, &str); 5] = [
    ("plotoutline", "outline"),
    ("writer", "credits"),
    ("firstaired", "aired"),
    ("specialsortseason", "displayseason"),
    ("specialsortepisode", "displayepisode"),
];

/// Root tag for a created sidecar.
pub fn root_tag(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movie => "movie",
        MediaType::TvShow => "tvshow",
        MediaType::Episode => "episodedetails",
    }
}

/// The host's view of one item, as handed to the exporter.
pub struct ExportSource<'a> {
    pub media_type: MediaType,
    pub file: &'a str,
    pub details: &'a Value,
    pub art: &'a Value,
    pub movieset: &'a Value,
    pub seasons: &'a [SeasonInfo],
}

/// Applies one item's fields to a sidecar tree.
pub struct Exporter<'a> {
    tree: &'a mut Element,
    source: ExportSource<'a>,
    settings: &'a ExportSettings,
    can_overwrite: bool,
    fanart_created: bool,
    cleared_arts: Vec<String>,
}

impl<'a> Exporter<'a> {
    pub fn new(
        tree: &'a mut Element,
        source: ExportSource<'a>,
        settings: &'a ExportSettings,
        can_overwrite: bool,
    ) -> Self {
        Self {
            tree,
            source,
            settings,
            can_overwrite,
            fanart_created: false,
            cleared_arts: Vec::new(),
        }
    }

    /// Fold every exported field into the tree.
    pub fn apply(&mut self) {
        let source_details = self.source.details;
        let Some(details) = source_details.as_object() else {
            return;
        };

        if self.settings.is_minimal {
            for field in MINIMAL_FIELDS {
                if let Some(value) = details.get(field) {
                    self.dispatch(field, value);
                }
            }
            return;
        }

        for (field, value) in details {
            if IGNORED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            self.dispatch(field, value);
        }

        let art = self.source.art;
        if let Some(entries) = art.as_array() {
            for entry in entries {
                self.convert_art(entry, None);
            }
        }

        if self.source.media_type == MediaType::TvShow {
            let seasons = self.source.seasons;
            for season in seasons {
                self.convert_season(season);
            }
        }
    }

    fn dispatch(&mut self, field: &str, value: &Value) {
        match field {
            "cast" => self.convert_cast(value),
            "lastplayed" => self.convert_lastplayed(value),
            "playcount" => self.convert_playcount(value),
            "ratings" => self.convert_ratings(value),
            "setid" => self.convert_set(value),
            "streamdetails" => self.convert_streamdetails(value),
            "uniqueid" => self.convert_uniqueid(value),
            "trailer" => self.convert_trailer(value),
            _ => self.convert_generic(field, value),
        }
    }

    fn convert_generic(&mut self, field: &str, value: &Value) {
        if value.is_null() || value.as_str().is_some_and(str::is_empty) {
            return;
        }

        let tag = TAG_REMAPS
            .iter()
            .find(|(from, _)| *from == field)
            .map_or(field, |(_, to)| to);

        if !self.try_clear_tags(tag) {
            return;
        }

        match value.as_array() {
            Some(items) => {
                for item in items {
                    self.tree.add_text_tag(tag, value_text(item));
                }
            }
            None => {
                self.tree.add_text_tag(tag, value_text(value));
            }
        }
    }

    fn convert_art(&mut self, entry: &Value, season: Option<i64>) {
        let Some(art_type) = entry.get("arttype").and_then(Value::as_str) else {
            return;
        };
        let Some(url) = entry.get("url").and_then(Value::as_str) else {
            return;
        };
        let path = decode_image(url);
        let preview = entry
            .get("previewurl")
            .and_then(Value::as_str)
            .map(decode_image);

        if self.is_ignored_image(art_type, &path, season) {
            return;
        }

        if season.is_none() && art_type == "fanart" {
            self.convert_fanart(preview, path);
        } else {
            self.convert_thumb(art_type, preview, path, season);
        }
    }

    fn is_ignored_image(&self, art_type: &str, path: &str, season: Option<i64>) -> bool {
        if path == "DefaultVideo.png"
            || path == "DefaultFolder.png"
            || path.starts_with("video@")
            || art_type.starts_with("tvshow.")
            || art_type.starts_with("season.")
        {
            return true;
        }

        let extensionless = replace_extension(path, "");
        let file = self.source.file;
        if self.source.media_type == MediaType::TvShow {
            if extensionless == format!("{file}{art_type}") {
                return true;
            }
            if let Some(season) = season {
                let season_name = if season == 0 {
                    "season-specials".to_string()
                } else {
                    format!("season{season:02}")
                };
                if extensionless == format!("{file}{season_name}-{art_type}")
                    || extensionless == format!("{file}season-all-{art_type}")
                {
                    return true;
                }
            }
        } else if extensionless == format!("{}-{art_type}", replace_extension(file, "")) {
            return true;
        }

        false
    }

    fn convert_fanart(&mut self, preview: Option<String>, path: String) {
        // Clear old fanart once, so newly added thumbs survive.
        if !self.fanart_created {
            if !self.try_clear_tags("fanart") {
                return;
            }
            self.tree.add_tag("fanart");
            self.fanart_created = true;
        }

        if let Some(fanart) = self.tree.find_mut("fanart") {
            let thumb = fanart.add_text_tag("thumb", path);
            if let Some(preview) = preview {
                thumb.set_attr("preview", preview);
            }
        }
    }

    fn convert_thumb(
        &mut self,
        art_type: &str,
        preview: Option<String>,
        path: String,
        season: Option<i64>,
    ) {
        // Clear art of the same type once, seasonally for tvshows.
        let art_code = match season {
            None => art_type.to_string(),
            Some(season) => format!("{art_type}.season{season}"),
        };
        if !self.cleared_arts.contains(&art_code) {
            if !self.try_clear_art(art_type, season) {
                return;
            }
            self.cleared_arts.push(art_code);
        }

        let thumb = self.tree.add_text_tag("thumb", path);
        thumb.set_attr("aspect", art_type);
        if let Some(preview) = preview {
            thumb.set_attr("preview", preview);
        }
        if let Some(season) = season {
            thumb.set_attr("season", season.to_string());
            thumb.set_attr("type", "season");
        }
    }

    fn try_clear_art(&mut self, art_type: &str, season: Option<i64>) -> bool {
        match season {
            None => {
                // Season thumbs are skipped in non-season clears.
                let matches = |e: &Element| {
                    e.tag() == "thumb"
                        && e.attr("aspect") == Some(art_type)
                        && e.attr("season").is_none()
                };
                if self.tree.any_matching(matches) && !self.can_overwrite {
                    return false;
                }
                self.tree.remove_matching(matches);
                true
            }
            Some(season) => {
                let season = season.to_string();
                self.try_clear_where(|e| {
                    e.tag() == "thumb"
                        && e.attr("aspect") == Some(art_type)
                        && e.attr("season") == Some(season.as_str())
                })
            }
        }
    }

    fn convert_cast(&mut self, actors: &Value) {
        let has_existing = self.tree.any_matching(|e| e.tag() == "actor");
        if has_existing
            && (self.settings.actor_handling == ActorHandling::Leave || !self.can_overwrite)
        {
            return;
        }

        let bin = if self.settings.actor_handling == ActorHandling::Overwrite {
            self.tree.remove_matching(|e| e.tag() == "actor");
            Vec::new()
        } else {
            self.tree.take_matching(|e| e.tag() == "actor")
        };

        let new_actors = actors.as_array().cloned().unwrap_or_default();
        if self.settings.actor_handling == ActorHandling::Update {
            self.update_cast(&new_actors, bin);
        } else {
            self.merge_cast(&new_actors, bin);
        }
    }

    fn update_cast(&mut self, new_actors: &[Value], bin: Vec<Element>) {
        for element in bin {
            let name = element.child_text("name").map(str::to_string);
            let element = self.tree.add_child(element);
            let details = name.and_then(|name| {
                new_actors
                    .iter()
                    .find(|a| a.get("name").and_then(Value::as_str) == Some(name.as_str()))
            });
            if let Some(details) = details {
                update_actor(element, details);
            }
        }
    }

    fn merge_cast(&mut self, new_actors: &[Value], mut bin: Vec<Element>) {
        for actor in new_actors {
            let name = actor.get("name").and_then(Value::as_str);
            let existing = name.and_then(|name| {
                bin.iter()
                    .position(|e| e.child_text("name") == Some(name))
            });
            let element = match existing {
                Some(index) => self.tree.add_child(bin.remove(index)),
                None => self.tree.add_tag("actor"),
            };
            update_actor(element, actor);
        }
    }

    fn convert_lastplayed(&mut self, date: &Value) {
        self.tree.set_tag("lastplayed", value_text(date));
    }

    fn convert_playcount(&mut self, count: &Value) {
        let count = count.as_i64().unwrap_or(0);
        let watched = if count > 0 { "true" } else { "false" };
        self.tree.set_tag("playcount", count.to_string());
        self.tree.set_tag("watched", watched);
    }

    fn convert_ratings(&mut self, ratings: &Value) {
        if !self.try_clear_tags("ratings") {
            return;
        }

        let element = self.tree.add_tag("ratings");
        let Some(ratings) = ratings.as_object() else {
            return;
        };
        for (rater, details) in ratings {
            let rating = element.add_tag("rating");
            rating.set_attr("name", rater.as_str());
            // Regardless of origin, the host normalizes ratings to out-of-10.
            rating.set_attr("max", "10");
            let default = details
                .get("default")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            rating.set_attr("default", if default { "true" } else { "false" });

            let value = details.get("rating").and_then(Value::as_f64).unwrap_or(0.0);
            rating.add_text_tag("value", format!("{:.1}", value));
            if let Some(votes) = details.get("votes") {
                rating.add_text_tag("votes", value_text(votes));
            }
        }
    }

    fn convert_set(&mut self, set_id: &Value) {
        if set_id.as_i64().unwrap_or(0) == 0 {
            return;
        }
        if !self.try_clear_tags("set") {
            return;
        }

        let title = value_text(self.source.movieset.get("title").unwrap_or(&Value::Null));
        let plot = value_text(self.source.movieset.get("plot").unwrap_or(&Value::Null));
        let element = self.tree.add_tag("set");
        element.add_text_tag("title", title);
        element.add_text_tag("overview", plot);
    }

    fn convert_streamdetails(&mut self, details: &Value) {
        if !self.try_clear_tags("fileinfo") {
            return;
        }

        let file_info = self.tree.add_tag("fileinfo");
        let stream_details = file_info.add_tag("streamdetails");

        for video in array_of(details, "video") {
            let mut video = video.as_object().cloned().unwrap_or_default();
            let aspect = video.get("aspect").and_then(Value::as_f64).unwrap_or(0.0);
            video.insert("aspect".to_string(), Value::from(format!("{aspect:.6}")));
            let duration = video.remove("duration").unwrap_or(Value::Null);
            video.insert("durationinseconds".to_string(), duration);
            add_details_set("video", stream_details, &video);
        }
        for audio in array_of(details, "audio") {
            if let Some(audio) = audio.as_object() {
                add_details_set("audio", stream_details, audio);
            }
        }
        for subtitle in array_of(details, "subtitle") {
            if let Some(subtitle) = subtitle.as_object() {
                add_details_set("subtitle", stream_details, subtitle);
            }
        }
    }

    fn convert_trailer(&mut self, path: &Value) {
        let Some(path) = path.as_str() else {
            return;
        };
        // A local `-trailer` companion file will be rediscovered by the host.
        if replace_extension(path, "")
            == format!("{}-trailer", replace_extension(self.source.file, ""))
        {
            return;
        }
        if path.starts_with("plugin://") && !self.settings.should_export_plugin_trailers {
            return;
        }

        if !self.try_clear_tags("trailer") {
            return;
        }
        self.tree.add_text_tag("trailer", path);
    }

    fn convert_uniqueid(&mut self, unique_ids: &Value) {
        let default = self
            .tree
            .find_where(|e| e.tag() == "uniqueid" && e.attr("default") == Some("true"))
            .and_then(|e| e.attr("type"))
            .map(str::to_string);

        if !self.try_clear_tags("uniqueid") {
            return;
        }

        let Some(unique_ids) = unique_ids.as_object() else {
            return;
        };
        for (service, service_id) in unique_ids {
            let element = self.tree.add_text_tag("uniqueid", value_text(service_id));
            element.set_attr("type", service.as_str());
            if default.as_deref() == Some(service.as_str()) {
                element.set_attr("default", "true");
            }
        }
    }

    fn convert_season(&mut self, season: &SeasonInfo) {
        let number = season.number;
        if let Some(title) = season.details.get("title") {
            let number_text = number.to_string();
            if self.try_clear_where(|e| {
                e.tag() == "namedseason" && e.attr("number") == Some(number_text.as_str())
            }) {
                let named = self.tree.add_text_tag("namedseason", value_text(title));
                named.set_attr("number", number_text);
            }
        }

        if let Some(art) = season.art.as_array() {
            for entry in art {
                self.convert_art(entry, Some(number));
            }
        }
    }

    fn try_clear_tags(&mut self, tag: &str) -> bool {
        self.try_clear_where(|e| e.tag() == tag)
    }

    fn try_clear_where(&mut self, pred: impl Fn(&Element) -> bool) -> bool {
        if self.tree.any_matching(&pred) && !self.can_overwrite {
            return false;
        }
        self.tree.remove_matching(pred);
        true
    }
}

fn update_actor(element: &mut Element, details: &Value) {
    if let Some(name) = details.get("name") {
        element.set_tag("name", value_text(name));
    }
    if let Some(role) = details.get("role") {
        element.set_tag("role", value_text(role));
    }
    if let Some(order) = details.get("order") {
        element.set_tag("order", value_text(order));
    }
    if let Some(thumbnail) = details.get("thumbnail").and_then(Value::as_str) {
        element.set_tag("thumb", decode_image(thumbnail));
    }
}

fn add_details_set(
    details_type: &str,
    parent: &mut Element,
    info: &serde_json::Map<String, Value>,
) {
    let element = parent.add_tag(details_type);
    for (property, value) in info {
        if value.is_null() || value.as_str().is_some_and(str::is_empty) {
            continue;
        }
        element.add_text_tag(property.as_str(), value_text(value));
    }
}

fn array_of<'v>(details: &'v Value, key: &str) -> Vec<&'v Value> {
    details
        .get(key)
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "exporter_tests.rs"]
mod tests;
