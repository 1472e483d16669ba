//! TabVault RPC Server — JSON-RPC over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"group.open", "params":{"window":"3","group":"7"}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Runs against the in-memory session provider; a deployment wires a
//! real `SessionProvider` implementation in its place and feeds the
//! provider's event feed through `event.emit`.

use std::io::{self, BufRead, Write};

use tabvault::app::Engine;
use tabvault::database::Store;
use tabvault::managers::dispatcher::Dispatcher;
use tabvault::rpc_handler::handle_method;
use tabvault::session::MemorySession;

use serde_json::{json, Value};

fn main() {
    env_logger::init();

    let db_path = if let Ok(dir) = std::env::var("TABVAULT_DATA_DIR") {
        std::path::PathBuf::from(dir).join("tabvault.db")
    } else if let Ok(exe) = std::env::current_exe() {
        exe.parent()
            .unwrap_or(std::path::Path::new("."))
            .join("tabvault.db")
    } else {
        std::path::PathBuf::from("tabvault.db")
    };

    let store = Store::open(&db_path).expect("Failed to open TabVault store");
    let engine = Engine::new(MemorySession::new(), store);
    let (handle, dispatcher) = Dispatcher::spawn(engine);

    // Signal ready
    let ready = json!({"event":"ready","version":env!("CARGO_PKG_VERSION")});
    println!("{}", ready);
    io::stdout().flush().unwrap();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let err = json!({"id":null,"error":format!("parse error: {}",e)});
                println!("{}", err);
                io::stdout().flush().unwrap();
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let result = handle_method(&handle, method, &params);

        let response = match result {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        println!("{}", response);
        io::stdout().flush().unwrap();
    }

    drop(handle);
    dispatcher.join();
}
