//! Directory-sync behavior against a mock directory server.

use hearth_db::Database;
use hearth_sync::{SyncError, load_channels};
use hearth_types::{Channel, Timestamp};
use mockito::Matcher;
use serde_json::json;
use tempfile::TempDir;

fn open_store() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(&dir.path().join("cache.db")).unwrap();
    db.create_schema().unwrap();
    (dir, db)
}

fn remote_channel(id: u64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": "a room",
        "avatar": format!("icons/{id}.png"),
        "created": 1_700_000_000u64,
        "created_ns": 12,
        "enabled": true,
        "permissions": [1, 4, 2],
    })
}

fn page(channels: Vec<serde_json::Value>) -> String {
    json!({
        "status": "ok",
        "count": channels.len(),
        "data": channels,
    })
    .to_string()
}

#[test]
fn merges_directory_channels_into_store() {
    let (_dir, db) = open_store();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/user/@me/channels")
        .match_query(Matcher::Any)
        .match_header("authorization", "42-sekrit")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(page(vec![remote_channel(1, "alpha"), remote_channel(2, "beta")]))
        .create();

    let merged = load_channels(&db, 42, "sekrit", &server.url()).unwrap();
    mock.assert();

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].title, "alpha");
    assert_eq!(merged[0].permissions, vec![1, 4, 2]);
    assert!(merged[0].enabled);
    assert_eq!(merged[0].created_at, Timestamp::new(1_700_000_000, 12));

    let stored = db.get_channels().unwrap();
    assert_eq!(stored, merged);
}

#[test]
fn auth_failure_leaves_store_untouched() {
    let (_dir, db) = open_store();
    db.upsert_channels(&[Channel {
        id: 9,
        title: "local".into(),
        description: None,
        avatar: None,
        created_at: Timestamp::new(100, 0),
        enabled: true,
        permissions: vec![8],
    }])
    .unwrap();
    let before = db.get_channels().unwrap();

    let mut server = mockito::Server::new();
    server
        .mock("GET", "/user/@me/channels")
        .match_query(Matcher::Any)
        .with_status(401)
        .create();

    let err = load_channels(&db, 42, "expired", &server.url()).unwrap_err();
    assert!(matches!(err, SyncError::Auth(401)));
    assert_eq!(db.get_channels().unwrap(), before);
}

#[test]
fn malformed_response_is_isolated() {
    let (_dir, db) = open_store();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/user/@me/channels")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("this is not json")
        .create();

    let err = load_channels(&db, 42, "sekrit", &server.url()).unwrap_err();
    assert!(matches!(err, SyncError::Parse(_)));
    assert!(db.get_channels().unwrap().is_empty());
}

#[test]
fn server_error_maps_to_status() {
    let (_dir, db) = open_store();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/user/@me/channels")
        .match_query(Matcher::Any)
        .with_status(502)
        .create();

    let err = load_channels(&db, 42, "sekrit", &server.url()).unwrap_err();
    assert!(matches!(err, SyncError::Status(502)));
}

#[test]
fn second_sync_overwrites_title_but_keeps_created_at() {
    let (_dir, db) = open_store();

    let mut first = mockito::Server::new();
    first
        .mock("GET", "/user/@me/channels")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page(vec![json!({
            "id": 1, "title": "old", "created": 100u64, "created_ns": 7,
        })]))
        .create();
    load_channels(&db, 42, "sekrit", &first.url()).unwrap();

    let mut second = mockito::Server::new();
    second
        .mock("GET", "/user/@me/channels")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page(vec![json!({
            "id": 1, "title": "new", "created": 999u64,
        })]))
        .create();
    let merged = load_channels(&db, 42, "sekrit", &second.url()).unwrap();

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].title, "new");
    assert_eq!(merged[0].created_at, Timestamp::new(100, 7));

    let stored = db.get_channels().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "new");
}

#[test]
fn full_pages_are_followed_by_offset() {
    let (_dir, db) = open_store();
    let mut server = mockito::Server::new();

    let full: Vec<serde_json::Value> = (1..=150)
        .map(|id| json!({"id": id, "title": format!("ch{id}"), "created": 50u64}))
        .collect();
    let first = server
        .mock("GET", "/user/@me/channels")
        .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
        .with_status(200)
        .with_body(page(full))
        .create();
    let rest = server
        .mock("GET", "/user/@me/channels")
        .match_query(Matcher::UrlEncoded("offset".into(), "150".into()))
        .with_status(200)
        .with_body(page(vec![json!({"id": 151, "title": "tail", "created": 50u64})]))
        .create();

    let merged = load_channels(&db, 42, "sekrit", &server.url()).unwrap();
    first.assert();
    rest.assert();
    assert_eq!(merged.len(), 151);
    assert_eq!(db.get_channels().unwrap().len(), 151);
}
