//! TabVault persistence layer.
//!
//! Provides SQLite-backed storage for the mirror document and schema
//! migrations.
//!
//! # Usage
//!
//! ```no_run
//! use tabvault::database::Store;
//!
//! // Open a persistent store
//! let store = Store::open("tabvault.db").expect("failed to open store");
//!
//! // Or use an in-memory store for testing
//! let store = Store::open_in_memory().expect("failed to open in-memory store");
//!
//! let document = store.load().expect("failed to load document");
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Store;
