use std::fmt;

// === ProviderError ===

/// Errors surfaced by the live session provider.
#[derive(Debug)]
pub enum ProviderError {
    /// The requested live object no longer exists. Never user-visible:
    /// callers treat it as "this entity is closed."
    NotFound(String),
    /// The provider call failed for a reason other than absence. Callers
    /// degrade the operation to "entity absent" and log it.
    Transient(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::NotFound(what) => write!(f, "Not found: {}", what),
            ProviderError::Transient(msg) => write!(f, "Provider failure: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

// === StorageError ===

/// Errors related to the persistent document store.
#[derive(Debug)]
pub enum StorageError {
    /// Database operation failed.
    Database(String),
    /// Failed to serialize or deserialize the storage document.
    Serialization(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Database(msg) => write!(f, "Storage database error: {}", msg),
            StorageError::Serialization(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

// === EngineError ===

/// Errors returned by engine commands.
#[derive(Debug)]
pub enum EngineError {
    /// The persistent store failed.
    Storage(String),
    /// A command referenced a durable record that does not exist.
    RecordMissing(String),
    /// A provider call required by a command failed and could not be
    /// degraded to a no-op.
    Provider(String),
    /// The serialization queue is gone; the engine has shut down.
    QueueClosed,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Storage(msg) => write!(f, "Engine storage error: {}", msg),
            EngineError::RecordMissing(what) => write!(f, "Record missing: {}", what),
            EngineError::Provider(msg) => write!(f, "Engine provider error: {}", msg),
            EngineError::QueueClosed => write!(f, "Engine queue closed"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        EngineError::Storage(err.to_string())
    }
}
