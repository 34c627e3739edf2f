// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    movie   = { "movie", MediaType::Movie },
    tvshow  = { "tvshow", MediaType::TvShow },
    episode = { "episode", MediaType::Episode },
)]
fn parse_round_trips(s: &str, expected: MediaType) {
    let parsed: MediaType = s.parse().unwrap();
    assert_eq!(parsed, expected);
    assert_eq!(parsed.as_str(), s);
}

#[test]
fn parse_rejects_unknown() {
    assert!("movieset".parse::<MediaType>().is_err());
    assert!("".parse::<MediaType>().is_err());
}

#[test]
fn serde_uses_lowercase_names() {
    let json = serde_json::to_string(&MediaType::TvShow).unwrap();
    assert_eq!(json, "\"tvshow\"");
    let back: MediaType = serde_json::from_str("\"episode\"").unwrap();
    assert_eq!(back, MediaType::Episode);
}

#[test]
fn item_equality_ignores_file() {
    let a = MediaItem::with_file(MediaType::Movie, 5, "/m/a.mkv");
    let b = MediaItem::new(MediaType::Movie, 5);
    assert_eq!(a, b);

    let c = MediaItem::new(MediaType::Episode, 5);
    assert_ne!(a, c);
}

#[test]
fn bulk_order_is_movie_tvshow_episode() {
    assert_eq!(
        MediaType::ALL,
        [MediaType::Movie, MediaType::TvShow, MediaType::Episode]
    );
}

#[test]
fn id_keys_match_host_conventions() {
    assert_eq!(MediaType::Movie.id_key(), "movieid");
    assert_eq!(MediaType::TvShow.id_key(), "tvshowid");
    assert_eq!(MediaType::Episode.id_key(), "episodeid");
}
