use serde_json::json;

use tabvault::app::Engine;
use tabvault::database::Store;
use tabvault::managers::dispatcher::{Dispatcher, EngineHandle};
use tabvault::rpc_handler::handle_method;
use tabvault::session::MemorySession;
use tabvault::types::records::GroupColor;

fn spawn_handle() -> (EngineHandle, Dispatcher, String, String) {
    let mut session = MemorySession::new();
    let window = session.add_window();
    let group = session.add_group(window, "Work", GroupColor::Blue);
    session.add_tab(group, "A", "https://a.example/");
    let engine = Engine::new(session, Store::open_in_memory().unwrap());
    let (handle, dispatcher) = Dispatcher::spawn(engine);
    (handle, dispatcher, window.to_string(), group.to_string())
}

#[test]
fn test_ping() {
    let (handle, dispatcher, _, _) = spawn_handle();
    let result = handle_method(&handle, "ping", &json!({})).unwrap();
    assert_eq!(result, json!({"pong": true}));
    drop(handle);
    dispatcher.join();
}

#[test]
fn test_unknown_method_is_an_error() {
    let (handle, dispatcher, _, _) = spawn_handle();
    let err = handle_method(&handle, "nope", &json!({})).unwrap_err();
    assert!(err.contains("unknown method"));
    drop(handle);
    dispatcher.join();
}

#[test]
fn test_missing_params_are_reported() {
    let (handle, dispatcher, _, _) = spawn_handle();
    let err = handle_method(&handle, "group.open", &json!({})).unwrap_err();
    assert_eq!(err, "missing window");
    drop(handle);
    dispatcher.join();
}

#[test]
fn test_reconcile_then_storage_get() {
    let (handle, dispatcher, window, group) = spawn_handle();

    handle_method(&handle, "reconcile", &json!({})).unwrap();
    let storage = handle_method(&handle, "storage.get", &json!({})).unwrap();

    let record = &storage["windows"][&window]["groups"][&group];
    assert_eq!(record["title"], "Work");
    assert_eq!(record["window_key"], window);

    drop(handle);
    dispatcher.join();
}

#[test]
fn test_window_rename_roundtrip() {
    let (handle, dispatcher, window, _) = spawn_handle();

    handle_method(&handle, "reconcile", &json!({})).unwrap();
    handle_method(
        &handle,
        "window.rename",
        &json!({"window": window, "name": "Desk"}),
    )
    .unwrap();

    let storage = handle_method(&handle, "storage.get", &json!({})).unwrap();
    assert_eq!(storage["windows"][&window]["name"], "Desk");

    drop(handle);
    dispatcher.join();
}

#[test]
fn test_event_emit_accepts_tagged_events() {
    let (handle, dispatcher, window, group) = spawn_handle();

    handle_method(&handle, "reconcile", &json!({})).unwrap();
    let group_id: i64 = group.parse().unwrap();
    handle_method(
        &handle,
        "event.emit",
        &json!({"type": "group_removed", "group_id": group_id}),
    )
    .unwrap();

    let storage = handle_method(&handle, "storage.get", &json!({})).unwrap();
    assert_eq!(storage["windows"][&window]["groups"][&group]["closed"], true);

    drop(handle);
    dispatcher.join();
}

#[test]
fn test_invalid_event_is_rejected() {
    let (handle, dispatcher, _, _) = spawn_handle();
    let err = handle_method(&handle, "event.emit", &json!({"type": "nonsense"})).unwrap_err();
    assert!(err.contains("invalid event"));
    drop(handle);
    dispatcher.join();
}

#[test]
fn test_group_close_leaves_history() {
    let (handle, dispatcher, window, group) = spawn_handle();

    handle_method(&handle, "reconcile", &json!({})).unwrap();
    let group_id: i64 = group.parse().unwrap();
    handle_method(&handle, "group.close", &json!({"groupId": group_id})).unwrap();

    let storage = handle_method(&handle, "storage.get", &json!({})).unwrap();
    let record = &storage["windows"][&window]["groups"][&group];
    assert_eq!(record["closed"], true);
    assert_eq!(record["tabs"].as_array().unwrap().len(), 1);

    drop(handle);
    dispatcher.join();
}
