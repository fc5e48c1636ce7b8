// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use tempfile::TempDir;

fn open() -> (TempDir, JsonStore) {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::open(dir.path()).unwrap();
    (dir, store)
}

#[test]
fn open_creates_table_directories() {
    let (dir, _store) = open();
    for table in Table::ALL {
        assert!(dir.path().join(table.as_str()).is_dir());
    }
}

#[test]
fn put_then_get() {
    let (_dir, store) = open();
    store
        .put(Table::Records, "rec-1", &json!({"id": "rec-1"}))
        .unwrap();
    assert_eq!(
        store.get(Table::Records, "rec-1").unwrap(),
        Some(json!({"id": "rec-1"}))
    );
}

#[test]
fn values_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = JsonStore::open(dir.path()).unwrap();
        store
            .put(Table::AuditLog, "aud-1", &json!({"action": "create"}))
            .unwrap();
    }
    let store = JsonStore::open(dir.path()).unwrap();
    assert_eq!(
        store.get(Table::AuditLog, "aud-1").unwrap(),
        Some(json!({"action": "create"}))
    );
}

#[test]
fn put_replaces_and_leaves_no_temp_files() {
    let (dir, store) = open();
    store.put(Table::Settings, "lastSync", &json!(1)).unwrap();
    store.put(Table::Settings, "lastSync", &json!(2)).unwrap();

    assert_eq!(store.get(Table::Settings, "lastSync").unwrap(), Some(json!(2)));
    let names: Vec<_> = fs::read_dir(dir.path().join("settings"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["lastSync.json".to_string()]);
}

#[test]
fn get_missing_is_none() {
    let (_dir, store) = open();
    assert!(store.get(Table::Records, "nope").unwrap().is_none());
}

#[test]
fn get_all_is_sorted_by_key() {
    let (_dir, store) = open();
    for key in ["b", "c", "a"] {
        store.put(Table::SyncQueue, key, &json!(key)).unwrap();
    }
    assert_eq!(
        store.get_all(Table::SyncQueue).unwrap(),
        vec![json!("a"), json!("b"), json!("c")]
    );
}

#[test]
fn get_all_skips_corrupt_and_temp_files() {
    let (dir, store) = open();
    store.put(Table::Records, "good", &json!({"ok": true})).unwrap();
    fs::write(dir.path().join("records/bad.json"), b"{not json").unwrap();
    fs::write(dir.path().join("records/.good.1.0.tmp"), b"{}").unwrap();

    assert_eq!(
        store.get_all(Table::Records).unwrap(),
        vec![json!({"ok": true})]
    );
}

#[test]
fn delete_is_idempotent() {
    let (_dir, store) = open();
    store.put(Table::Records, "rec-1", &json!({})).unwrap();
    store.delete(Table::Records, "rec-1").unwrap();
    store.delete(Table::Records, "rec-1").unwrap();
    assert!(store.get(Table::Records, "rec-1").unwrap().is_none());
}

#[test]
fn keys_that_escape_the_table_are_rejected() {
    let (_dir, store) = open();
    for key in ["", "../x", "a/b", "a\\b", ".hidden", "a..b"] {
        let err = store.put(Table::Records, key, &json!({})).unwrap_err();
        assert!(
            matches!(err, StorageError::InvalidKey { .. }),
            "key {:?} gave {:?}",
            key,
            err
        );
    }
}
