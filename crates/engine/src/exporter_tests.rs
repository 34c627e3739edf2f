// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn settings() -> ExportSettings {
    ExportSettings {
        can_create_nfo: true,
        movie_nfo_naming: nfo_core::MovieNfoNaming::Movie,
        is_minimal: false,
        can_overwrite: true,
        actor_handling: ActorHandling::Merge,
        should_export_plugin_trailers: false,
    }
}

struct Fixture {
    tree: Element,
    details: Value,
    art: Value,
    movieset: Value,
    seasons: Vec<SeasonInfo>,
    settings: ExportSettings,
    can_overwrite: bool,
    file: String,
    media_type: MediaType,
}

impl Fixture {
    fn movie(details: Value) -> Self {
        Self {
            tree: Element::new("movie"),
            details,
            art: json!([]),
            movieset: json!({}),
            seasons: Vec::new(),
            settings: settings(),
            can_overwrite: true,
            file: "/m/a.mkv".to_string(),
            media_type: MediaType::Movie,
        }
    }

    fn apply(&mut self) {
        let source = ExportSource {
            media_type: self.media_type,
            file: &self.file,
            details: &self.details,
            art: &self.art,
            movieset: &self.movieset,
            seasons: &self.seasons,
        };
        Exporter::new(&mut self.tree, source, &self.settings, self.can_overwrite).apply();
    }
}

#[test]
fn generic_fields_remap_tags() {
    let mut f = Fixture::movie(json!({
        "title": "A",
        "plotoutline": "short",
        "writer": ["X", "Y"],
        "label": "A",
    }));
    f.apply();

    assert_eq!(f.tree.child_text("title"), Some("A"));
    assert_eq!(f.tree.child_text("outline"), Some("short"));
    let credits: Vec<_> = f
        .tree
        .children_named("credits")
        .map(|e| e.text().to_string())
        .collect();
    assert_eq!(credits, vec!["X", "Y"]);
    // label is never exported.
    assert!(f.tree.find("label").is_none());
}

#[test]
fn empty_values_are_skipped() {
    let mut f = Fixture::movie(json!({ "tagline": "", "year": 2020 }));
    f.apply();
    assert!(f.tree.find("tagline").is_none());
    assert_eq!(f.tree.child_text("year"), Some("2020"));
}

#[test]
fn overwrite_off_preserves_existing_tags() {
    let mut f = Fixture::movie(json!({ "title": "New", "playcount": 2 }));
    f.tree = Element::parse("<movie><title>Old</title></movie>").unwrap();
    f.can_overwrite = false;
    f.apply();

    assert_eq!(f.tree.child_text("title"), Some("Old"));
    // Play state always tracks the library.
    assert_eq!(f.tree.child_text("playcount"), Some("2"));
    assert_eq!(f.tree.child_text("watched"), Some("true"));
}

#[test]
fn playcount_zero_is_unwatched() {
    let mut f = Fixture::movie(json!({ "playcount": 0 }));
    f.apply();
    assert_eq!(f.tree.child_text("playcount"), Some("0"));
    assert_eq!(f.tree.child_text("watched"), Some("false"));
}

#[test]
fn minimal_mode_restricts_fields() {
    let mut f = Fixture::movie(json!({
        "title": "A",
        "playcount": 1,
        "lastplayed": "2024-01-01 10:00:00",
    }));
    f.settings.is_minimal = true;
    f.apply();

    assert!(f.tree.find("title").is_none());
    assert_eq!(f.tree.child_text("playcount"), Some("1"));
    assert_eq!(f.tree.child_text("lastplayed"), Some("2024-01-01 10:00:00"));
}

#[test]
fn ratings_export_with_max_and_default() {
    let mut f = Fixture::movie(json!({
        "ratings": {
            "imdb": { "rating": 7.456, "votes": 100, "default": true },
            "themoviedb": { "rating": 6.0 },
        }
    }));
    f.apply();

    let ratings = f.tree.find("ratings").unwrap();
    let imdb = ratings
        .find_where(|e| e.attr("name") == Some("imdb"))
        .unwrap();
    assert_eq!(imdb.attr("max"), Some("10"));
    assert_eq!(imdb.attr("default"), Some("true"));
    assert_eq!(imdb.child_text("value"), Some("7.5"));
    assert_eq!(imdb.child_text("votes"), Some("100"));

    let tmdb = ratings
        .find_where(|e| e.attr("name") == Some("themoviedb"))
        .unwrap();
    assert_eq!(tmdb.attr("default"), Some("false"));
    assert_eq!(tmdb.child_text("value"), Some("6.0"));
}

#[test]
fn movie_set_exports_title_and_overview() {
    let mut f = Fixture::movie(json!({ "setid": 3 }));
    f.movieset = json!({ "title": "Trilogy", "plot": "All three" });
    f.apply();

    let set = f.tree.find("set").unwrap();
    assert_eq!(set.child_text("title"), Some("Trilogy"));
    assert_eq!(set.child_text("overview"), Some("All three"));
}

#[test]
fn zero_set_id_is_skipped() {
    let mut f = Fixture::movie(json!({ "setid": 0 }));
    f.apply();
    assert!(f.tree.find("set").is_none());
}

#[test]
fn stream_details_format_aspect_and_duration() {
    let mut f = Fixture::movie(json!({
        "streamdetails": {
            "video": [{ "codec": "h264", "aspect": 1.7777, "duration": 5400 }],
            "audio": [{ "codec": "ac3", "channels": 6 }],
            "subtitle": [],
        }
    }));
    f.apply();

    let stream = f
        .tree
        .find("fileinfo")
        .and_then(|e| e.find("streamdetails"))
        .unwrap();
    let video = stream.find("video").unwrap();
    assert_eq!(video.child_text("aspect"), Some("1.777700"));
    assert_eq!(video.child_text("durationinseconds"), Some("5400"));
    assert!(video.find("duration").is_none());
    let audio = stream.find("audio").unwrap();
    assert_eq!(audio.child_text("channels"), Some("6"));
}

#[yare::parameterized(
    plugin_suppressed = { "plugin://trailer.plugin/x", false, false },
    plugin_allowed    = { "plugin://trailer.plugin/x", true, true },
    http_kept         = { "http://site/trailer.mov", false, true },
)]
fn trailer_rules(path: &str, allow_plugin: bool, expect_tag: bool) {
    let mut f = Fixture::movie(json!({ "trailer": path }));
    f.settings.should_export_plugin_trailers = allow_plugin;
    f.apply();
    assert_eq!(f.tree.find("trailer").is_some(), expect_tag);
}

#[test]
fn local_companion_trailer_is_skipped() {
    let mut f = Fixture::movie(json!({ "trailer": "/m/a-trailer.mp4" }));
    f.apply();
    assert!(f.tree.find("trailer").is_none());
}

#[test]
fn uniqueid_preserves_default_flag() {
    let mut f = Fixture::movie(json!({ "uniqueid": { "imdb": "tt1", "tmdb": "99" } }));
    f.tree = Element::parse(
        "<movie><uniqueid type=\"tmdb\" default=\"true\">old</uniqueid></movie>",
    )
    .unwrap();
    f.apply();

    let ids: Vec<_> = f.tree.children_named("uniqueid").collect();
    assert_eq!(ids.len(), 2);
    let tmdb = f
        .tree
        .find_where(|e| e.tag() == "uniqueid" && e.attr("type") == Some("tmdb"))
        .unwrap();
    assert_eq!(tmdb.attr("default"), Some("true"));
    assert_eq!(tmdb.text(), "99");
    let imdb = f
        .tree
        .find_where(|e| e.tag() == "uniqueid" && e.attr("type") == Some("imdb"))
        .unwrap();
    assert_eq!(imdb.attr("default"), None);
}

#[test]
fn cast_merge_updates_known_and_adds_new() {
    let mut f = Fixture::movie(json!({
        "cast": [
            { "name": "Alice", "role": "Lead", "order": 0 },
            { "name": "Bob", "role": "Support", "order": 1 },
        ]
    }));
    f.tree = Element::parse(
        "<movie><actor><name>Alice</name><role>Old role</role><custom>keep</custom></actor></movie>",
    )
    .unwrap();
    f.apply();

    let actors: Vec<_> = f.tree.children_named("actor").collect();
    assert_eq!(actors.len(), 2);
    let alice = actors[0];
    assert_eq!(alice.child_text("role"), Some("Lead"));
    // Unknown child tags on a merged actor survive.
    assert_eq!(alice.child_text("custom"), Some("keep"));
    assert_eq!(actors[1].child_text("name"), Some("Bob"));
}

#[test]
fn cast_leave_keeps_sidecar_actors() {
    let mut f = Fixture::movie(json!({ "cast": [{ "name": "New" }] }));
    f.settings.actor_handling = ActorHandling::Leave;
    f.tree = Element::parse("<movie><actor><name>Old</name></actor></movie>").unwrap();
    f.apply();

    let actors: Vec<_> = f.tree.children_named("actor").collect();
    assert_eq!(actors.len(), 1);
    assert_eq!(actors[0].child_text("name"), Some("Old"));
}

#[test]
fn cast_overwrite_discards_sidecar_actors() {
    let mut f = Fixture::movie(json!({ "cast": [{ "name": "New" }] }));
    f.settings.actor_handling = ActorHandling::Overwrite;
    f.tree = Element::parse(
        "<movie><actor><name>Old</name><custom>gone</custom></actor></movie>",
    )
    .unwrap();
    f.apply();

    let actors: Vec<_> = f.tree.children_named("actor").collect();
    assert_eq!(actors.len(), 1);
    assert_eq!(actors[0].child_text("name"), Some("New"));
    assert!(actors[0].find("custom").is_none());
}

#[test]
fn cast_update_keeps_only_sidecar_roster() {
    let mut f = Fixture::movie(json!({
        "cast": [{ "name": "Alice", "role": "Lead" }, { "name": "Bob" }]
    }));
    f.settings.actor_handling = ActorHandling::Update;
    f.tree = Element::parse("<movie><actor><name>Alice</name></actor></movie>").unwrap();
    f.apply();

    let actors: Vec<_> = f.tree.children_named("actor").collect();
    // Update never adds actors the sidecar doesn't already have.
    assert_eq!(actors.len(), 1);
    assert_eq!(actors[0].child_text("role"), Some("Lead"));
}

#[test]
fn fanart_and_poster_art_export() {
    let mut f = Fixture::movie(json!({}));
    f.art = json!([
        { "arttype": "fanart", "url": "image://http%3a%2f%2fx%2ff1.jpg/", "previewurl": "image://http%3a%2f%2fx%2fp1.jpg/" },
        { "arttype": "fanart", "url": "image://http%3a%2f%2fx%2ff2.jpg/" },
        { "arttype": "poster", "url": "image://http%3a%2f%2fx%2fposter.jpg/" },
        { "arttype": "poster", "url": "DefaultVideo.png" },
    ]);
    f.apply();

    let fanart = f.tree.find("fanart").unwrap();
    let thumbs: Vec<_> = fanart.children_named("thumb").collect();
    assert_eq!(thumbs.len(), 2);
    assert_eq!(thumbs[0].text(), "http://x/f1.jpg");
    assert_eq!(thumbs[0].attr("preview"), Some("http://x/p1.jpg"));

    let poster = f
        .tree
        .find_where(|e| e.tag() == "thumb" && e.attr("aspect") == Some("poster"))
        .unwrap();
    assert_eq!(poster.text(), "http://x/poster.jpg");
}

#[test]
fn local_artwork_is_not_exported() {
    let mut f = Fixture::movie(json!({}));
    f.art = json!([
        { "arttype": "poster", "url": "/m/a-poster.jpg" },
    ]);
    f.apply();
    assert!(f.tree.find("thumb").is_none());
}

#[test]
fn tvshow_seasons_export_named_seasons_and_season_art() {
    let mut f = Fixture::movie(json!({}));
    f.media_type = MediaType::TvShow;
    f.file = "/tv/Show/".to_string();
    f.tree = Element::new("tvshow");
    f.seasons = vec![SeasonInfo {
        number: 1,
        details: json!({ "season": 1, "title": "First Steps" }),
        art: json!([{ "arttype": "poster", "url": "http://x/s1.jpg" }]),
    }];
    f.apply();

    let named = f.tree.find("namedseason").unwrap();
    assert_eq!(named.text(), "First Steps");
    assert_eq!(named.attr("number"), Some("1"));

    let season_thumb = f
        .tree
        .find_where(|e| e.tag() == "thumb" && e.attr("season") == Some("1"))
        .unwrap();
    assert_eq!(season_thumb.attr("aspect"), Some("poster"));
    assert_eq!(season_thumb.attr("type"), Some("season"));
}
