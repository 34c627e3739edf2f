// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn sync_all_resolves_with_patience() {
    let (method, data) = resolve(Verb::SyncAll {
        patient: Some("patient".to_string()),
    })
    .unwrap();
    assert_eq!(method, BusMethod::SyncAll);
    assert_eq!(data, json!({ "patient": true }));
}

#[test]
fn sync_all_defaults_to_urgent() {
    let (_, data) = resolve(Verb::SyncAll { patient: None }).unwrap();
    assert_eq!(data, json!({ "patient": false }));
}

#[test]
fn item_verbs_carry_type_and_id() {
    let (method, data) = resolve(Verb::ExportOne {
        media_type: "tvshow".to_string(),
        id: 42,
        patient: None,
    })
    .unwrap();
    assert_eq!(method, BusMethod::ExportOne);
    assert_eq!(data, json!({ "type": "tvshow", "id": 42, "patient": false }));
}

#[test]
fn bad_media_type_is_rejected() {
    let err = resolve(Verb::SyncOne {
        media_type: "movieset".to_string(),
        id: 1,
        patient: None,
    })
    .unwrap_err();
    assert!(err.contains("movieset"));
}

#[test]
fn stray_trailing_token_is_rejected() {
    let err = resolve(Verb::ImportAll {
        patient: Some("later".to_string()),
    })
    .unwrap_err();
    assert!(err.contains("later"));
}

#[yare::parameterized(
    sync_all   = { vec!["nfosync", "sync_all"], true },
    sync_one   = { vec!["nfosync", "sync_one", "movie", "3"], true },
    export_one = { vec!["nfosync", "export_one", "episode", "9", "patient"], true },
    no_verb    = { vec!["nfosync"], false },
    bad_verb   = { vec!["nfosync", "refresh"], false },
    bad_id     = { vec!["nfosync", "sync_one", "movie", "three"], false },
)]
fn argument_parsing(args: Vec<&str>, ok: bool) {
    assert_eq!(Cli::try_parse_from(args).is_ok(), ok);
}
