//! Persistent store for the TabVault mirror document.
//!
//! Provides the [`Store`] struct that wraps a `rusqlite::Connection`,
//! reads and replaces the whole [`StorageDocument`] atomically under one
//! fixed key, and notifies subscribers on every write.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};

use crate::types::errors::StorageError;
use crate::types::records::StorageDocument;

use super::migrations;

/// The single key the mirror document is stored under.
const DOCUMENT_KEY: &str = "tabvault";

type Subscriber = Box<dyn Fn(&StorageDocument) + Send>;

/// Whole-document store backed by SQLite.
///
/// The document is always read in full and replaced in full; there are no
/// field-level updates. Write safety relies on the engine's serialization
/// queue, not on storage-level transactions.
pub struct Store {
    conn: Connection,
    subscribers: Vec<Subscriber>,
}

impl Store {
    /// Opens (or creates) the store at the given file path and runs migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|e| StorageError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory store. Useful for testing — the document is
    /// discarded when the `Store` is dropped.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StorageError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        migrations::run_all(&conn).map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(Self {
            conn,
            subscribers: Vec::new(),
        })
    }

    /// Registers a callback invoked after every successful write.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: Fn(&StorageDocument) + Send + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Reads the current document. An absent row yields the empty default.
    pub fn load(&self) -> Result<StorageDocument, StorageError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE key = ?1",
                params![DOCUMENT_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        match body {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(StorageDocument::default()),
        }
    }

    /// Replaces the document in full and notifies subscribers.
    pub fn save(&self, document: &StorageDocument) -> Result<(), StorageError> {
        let json = serde_json::to_string(document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO documents (key, body, updated_at) VALUES (?1, ?2, ?3)",
                params![DOCUMENT_KEY, json, now],
            )
            .map_err(|e| StorageError::Database(e.to_string()))?;

        for subscriber in &self.subscribers {
            subscriber(document);
        }
        Ok(())
    }

    /// Returns the stored document body verbatim, as persisted.
    ///
    /// Used by tests asserting that consecutive reconciles are
    /// byte-identical.
    pub fn raw_document(&self) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row(
                "SELECT body FROM documents WHERE key = ?1",
                params![DOCUMENT_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Database(e.to_string()))
    }
}
