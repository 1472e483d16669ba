//! RPC method handler for the TabVault JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function translates string-typed JSON-RPC methods
//! into calls on the typed [`EngineHandle`] command API; string methods
//! exist only at this edge.

use serde_json::{json, Value};

use crate::managers::dispatcher::EngineHandle;
use crate::types::events::SessionEvent;
use crate::types::records::TabRecord;

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

/// Dispatch a JSON-RPC method call to the engine.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(handle: &EngineHandle, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Resurrection ───
        "window.open" => {
            let window = str_param(params, "window")?;
            let id = handle.open_window(window).map_err(|e| e.to_string())?;
            Ok(json!({"windowId": id}))
        }
        "group.open" => {
            let window = str_param(params, "window")?;
            let group = str_param(params, "group")?;
            let id = handle.open_group(window, group).map_err(|e| e.to_string())?;
            Ok(json!({"groupId": id}))
        }
        "tab.open" => {
            let window = str_param(params, "window")?;
            let group = str_param(params, "group")?;
            let tab: TabRecord = params
                .get("tab")
                .cloned()
                .ok_or("missing tab")
                .and_then(|v| serde_json::from_value(v).map_err(|_| "invalid tab"))?;
            let id = handle
                .open_tab(window, group, tab)
                .map_err(|e| e.to_string())?;
            Ok(json!({"tabId": id}))
        }

        // ─── Queries ───
        "window.focused" => {
            let id = handle.focused_window().map_err(|e| e.to_string())?;
            Ok(json!({"windowId": id}))
        }
        "storage.get" => {
            let document = handle.storage_snapshot().map_err(|e| e.to_string())?;
            serde_json::to_value(document).map_err(|e| e.to_string())
        }

        // ─── Record commands ───
        "group.close" => {
            let group_id = params
                .get("groupId")
                .and_then(|v| v.as_i64())
                .ok_or("missing groupId")?;
            handle.close_group(group_id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "window.delete" => {
            let window = str_param(params, "window")?;
            handle.delete_window(window).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "group.delete" => {
            let window = str_param(params, "window")?;
            let group = str_param(params, "group")?;
            handle
                .delete_group(window, group)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tab.delete" => {
            let window = str_param(params, "window")?;
            let group = str_param(params, "group")?;
            let url = str_param(params, "url")?;
            handle
                .delete_tab(window, group, url)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "window.rename" => {
            let window = str_param(params, "window")?;
            let name = str_param(params, "name")?;
            handle
                .set_window_name(window, name)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "group.clear_history" => {
            let window = str_param(params, "window")?;
            let group = str_param(params, "group")?;
            handle
                .delete_closed_tabs(window, group)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Maintenance ───
        "reconcile" => {
            handle.reconcile().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "event.emit" => {
            let event: SessionEvent = serde_json::from_value(params.clone())
                .map_err(|e| format!("invalid event: {}", e))?;
            handle.submit_event(event).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Ping ───
        "ping" => Ok(json!({"pong": true})),

        _ => Err(format!("unknown method: {}", method)),
    }
}
