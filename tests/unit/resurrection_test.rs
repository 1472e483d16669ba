use std::collections::BTreeMap;

use tabvault::app::Engine;
use tabvault::database::Store;
use tabvault::session::{MemorySession, SessionProvider};
use tabvault::types::events::SessionEvent;
use tabvault::types::records::{
    GroupColor, GroupRecord, StorageDocument, TabRecord, WindowRecord,
};

fn closed_tab(url: &str) -> TabRecord {
    TabRecord {
        id: None,
        closed: true,
        title: url.to_string(),
        url: url.to_string(),
    }
}

fn reopenable_tab(url: &str) -> TabRecord {
    TabRecord {
        id: None,
        closed: false,
        title: url.to_string(),
        url: url.to_string(),
    }
}

/// A fully closed window record holding one closed group.
fn closed_document(window_key: &str, group_key: &str, tabs: Vec<TabRecord>) -> StorageDocument {
    let mut groups = BTreeMap::new();
    groups.insert(
        group_key.to_string(),
        GroupRecord {
            id: None,
            closed: true,
            title: "News".to_string(),
            color: Some(GroupColor::Red),
            window_key: window_key.to_string(),
            collapsed: false,
            position: 0,
            tabs,
        },
    );
    let mut document = StorageDocument::default();
    document.windows.insert(
        window_key.to_string(),
        WindowRecord {
            id: None,
            closed: true,
            name: None,
            groups,
        },
    );
    document
}

#[test]
fn test_resurrect_group_skips_closed_tabs() {
    let store = Store::open_in_memory().unwrap();
    store
        .save(&closed_document(
            "100",
            "200",
            vec![reopenable_tab("https://x.example/"), closed_tab("https://y.example/")],
        ))
        .unwrap();
    let mut engine = Engine::new(MemorySession::new(), store);

    let group_id = engine.open_group("100", "200").expect("resurrection failed");

    // Exactly one live tab, for X; the history entry for Y stays closed.
    let live_tabs = engine.provider().tabs_in_group(group_id).unwrap();
    assert_eq!(live_tabs.len(), 1);
    assert_eq!(live_tabs[0].url, "https://x.example/");

    let live_group = engine.provider().group(group_id).unwrap();
    assert_eq!(live_group.title, "News");
    assert_eq!(live_group.color, GroupColor::Red);
    assert_eq!(
        engine.provider().focused_window().unwrap(),
        Some(live_group.window_id)
    );

    let document = engine.storage_snapshot().unwrap();
    // Old keys are gone; the record tracks the new live ids.
    assert!(document.windows.get("100").is_none());
    let window_key = live_group.window_id.to_string();
    let record = document
        .group(&window_key, &group_id.to_string())
        .expect("record should be rekeyed to the live group id");
    assert_eq!(record.id, Some(group_id));
    assert!(!record.closed);
    assert_eq!(record.window_key, window_key);
    assert_eq!(record.tabs[0].id, Some(live_tabs[0].id));
    assert!(!record.tabs[0].closed);
    assert_eq!(record.tabs[1].id, None);
    assert!(record.tabs[1].closed);
}

#[test]
fn test_resurrect_live_group_only_focuses() {
    let mut session = MemorySession::new();
    let window = session.add_window();
    let group = session.add_group(window, "Work", GroupColor::Blue);
    session.add_tab(group, "A", "https://a.example/");

    let mut engine = Engine::new(session, Store::open_in_memory().unwrap());
    engine.full_reconcile().unwrap();

    let result = engine
        .open_group(&window.to_string(), &group.to_string())
        .unwrap();

    assert_eq!(result, group);
    assert_eq!(engine.provider().tabs_in_group(group).unwrap().len(), 1);
    assert_eq!(engine.provider().focused_window().unwrap(), Some(window));
    let active = engine.provider().tabs_in_group(group).unwrap()[0].active;
    assert!(active);
}

#[test]
fn test_resurrect_empty_group_rebinds_despite_throwaway() {
    let store = Store::open_in_memory().unwrap();
    store
        .save(&closed_document("100", "200", vec![closed_tab("https://y.example/")]))
        .unwrap();
    let mut engine = Engine::new(MemorySession::new(), store);

    let group_id = engine.open_group("100", "200").unwrap();

    // The throwaway tab was removed, so the live group vanished again;
    // the record still tracks the id it was briefly bound to.
    assert!(engine.provider().group(group_id).is_err());
    let document = engine.storage_snapshot().unwrap();
    let window_key = engine.provider().windows().unwrap()[0].id.to_string();
    let record = document
        .group(&window_key, &group_id.to_string())
        .expect("record should be rekeyed");
    assert_eq!(record.id, Some(group_id));
    assert!(record.tabs[0].closed);
}

#[test]
fn test_resurrect_window_rebinds_and_rekeys() {
    let store = Store::open_in_memory().unwrap();
    store
        .save(&closed_document("100", "200", vec![reopenable_tab("https://x.example/")]))
        .unwrap();
    let mut engine = Engine::new(MemorySession::new(), store);

    let window_id = engine.open_window("100").unwrap();

    assert_eq!(engine.provider().windows().unwrap().len(), 1);
    assert_eq!(engine.provider().focused_window().unwrap(), Some(window_id));

    let document = engine.storage_snapshot().unwrap();
    assert!(document.windows.get("100").is_none());
    let record = document.windows.get(&window_id.to_string()).unwrap();
    assert_eq!(record.id, Some(window_id));
    assert!(!record.closed);
    // Contained groups follow the rekey but stay closed until opened.
    let group = record.groups.get("200").unwrap();
    assert_eq!(group.window_key, window_id.to_string());
    assert!(group.closed);
}

#[test]
fn test_resurrect_live_window_only_refocuses() {
    let mut session = MemorySession::new();
    let window = session.add_window();
    let group = session.add_group(window, "Work", GroupColor::Blue);
    session.add_tab(group, "A", "https://a.example/");

    let mut engine = Engine::new(session, Store::open_in_memory().unwrap());
    engine.full_reconcile().unwrap();

    // Focus drifts to a second window; opening the record brings it back.
    let other = engine.provider_mut().add_window();
    assert_eq!(engine.provider().focused_window().unwrap(), Some(other));

    let result = engine.open_window(&window.to_string()).unwrap();
    assert_eq!(result, window);
    assert_eq!(engine.provider().focused_window().unwrap(), Some(window));
    assert_eq!(engine.provider().windows().unwrap().len(), 2);
}

#[test]
fn test_resurrect_tab_recreates_closed_tab_in_live_group() {
    let mut session = MemorySession::new();
    let window = session.add_window();
    let group = session.add_group(window, "Work", GroupColor::Blue);
    session.add_tab(group, "A", "https://a.example/");
    let tab_b = session.add_tab(group, "B", "https://b.example/");

    let mut engine = Engine::new(session, Store::open_in_memory().unwrap());
    engine.full_reconcile().unwrap();

    engine.provider_mut().close_tab(tab_b);
    engine
        .handle_event(&SessionEvent::TabRemoved {
            tab_id: tab_b,
            window_id: window,
        })
        .unwrap();

    let document = engine.storage_snapshot().unwrap();
    let history = document
        .group(&window.to_string(), &group.to_string())
        .unwrap()
        .tabs
        .iter()
        .find(|t| t.closed)
        .cloned()
        .expect("closed history entry should exist");

    let new_id = engine
        .open_tab(&window.to_string(), &group.to_string(), &history)
        .unwrap();

    assert_ne!(Some(new_id), Some(tab_b));
    let live_tabs = engine.provider().tabs_in_group(group).unwrap();
    assert!(live_tabs
        .iter()
        .any(|t| t.id == new_id && t.url == "https://b.example/"));

    let document = engine.storage_snapshot().unwrap();
    let record = document
        .group(&window.to_string(), &group.to_string())
        .unwrap();
    let rebound = record
        .tabs
        .iter()
        .find(|t| t.url == "https://b.example/")
        .unwrap();
    assert_eq!(rebound.id, Some(new_id));
    assert!(!rebound.closed);
}

#[test]
fn test_resurrect_tab_focuses_existing_duplicate_url() {
    let mut session = MemorySession::new();
    let window = session.add_window();
    let group = session.add_group(window, "Work", GroupColor::Blue);
    let tab_a = session.add_tab(group, "A", "https://a.example/");

    let mut engine = Engine::new(session, Store::open_in_memory().unwrap());
    engine.full_reconcile().unwrap();

    // A stale history entry for a URL that is already open again.
    let duplicate = closed_tab("https://a.example/");
    let result = engine
        .open_tab(&window.to_string(), &group.to_string(), &duplicate)
        .unwrap();

    assert_eq!(result, tab_a);
    assert_eq!(engine.provider().tabs_in_group(group).unwrap().len(), 1);
    assert!(engine.provider().tab(tab_a).unwrap().active);
}

#[test]
fn test_resurrect_tab_with_live_id_just_focuses() {
    let mut session = MemorySession::new();
    let window = session.add_window();
    let group = session.add_group(window, "Work", GroupColor::Blue);
    session.add_tab(group, "A", "https://a.example/");
    let tab_b = session.add_tab(group, "B", "https://b.example/");

    let mut engine = Engine::new(session, Store::open_in_memory().unwrap());
    engine.full_reconcile().unwrap();

    let record = TabRecord::open(tab_b, "B", "https://b.example/");
    let result = engine
        .open_tab(&window.to_string(), &group.to_string(), &record)
        .unwrap();

    assert_eq!(result, tab_b);
    assert!(engine.provider().tab(tab_b).unwrap().active);
    assert_eq!(engine.provider().tabs_in_group(group).unwrap().len(), 2);
}

#[test]
fn test_resurrect_missing_record_is_an_error() {
    let mut engine = Engine::new(MemorySession::new(), Store::open_in_memory().unwrap());
    assert!(engine.open_window("missing").is_err());
    assert!(engine.open_group("missing", "also-missing").is_err());
}
