use std::sync::mpsc;

use tabvault::database::Store;
use tabvault::types::records::{StorageDocument, WindowRecord};

fn document_with_window(key: &str) -> StorageDocument {
    let mut document = StorageDocument::default();
    document.windows.insert(
        key.to_string(),
        WindowRecord {
            id: Some(1),
            closed: false,
            name: Some("Desk".to_string()),
            groups: Default::default(),
        },
    );
    document
}

#[test]
fn test_fresh_store_loads_empty_document() {
    let store = Store::open_in_memory().unwrap();
    let document = store.load().unwrap();
    assert!(document.windows.is_empty());
    assert!(store.raw_document().unwrap().is_none());
}

#[test]
fn test_save_load_roundtrip() {
    let store = Store::open_in_memory().unwrap();
    let document = document_with_window("1");
    store.save(&document).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, document);
    assert!(store.raw_document().unwrap().is_some());
}

#[test]
fn test_save_replaces_whole_document() {
    let store = Store::open_in_memory().unwrap();
    store.save(&document_with_window("1")).unwrap();
    store.save(&document_with_window("2")).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.windows.len(), 1);
    assert!(loaded.windows.contains_key("2"));
}

#[test]
fn test_document_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tabvault.db");

    {
        let store = Store::open(&path).unwrap();
        store.save(&document_with_window("1")).unwrap();
    }

    let store = Store::open(&path).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded.windows.get("1").unwrap().name.as_deref(), Some("Desk"));
}

#[test]
fn test_subscribers_observe_writes() {
    let mut store = Store::open_in_memory().unwrap();
    let (tx, rx) = mpsc::channel();
    store.subscribe(move |document| {
        let _ = tx.send(document.windows.len());
    });

    store.save(&document_with_window("1")).unwrap();
    assert_eq!(rx.recv().unwrap(), 1);

    store.save(&StorageDocument::default()).unwrap();
    assert_eq!(rx.recv().unwrap(), 0);
}
