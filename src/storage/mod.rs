//! Key-value persistence for the session log.
//!
//! The tracker only needs opaque string values under string keys. Two
//! backends are provided:
//! - [`FileStore`]: one JSON file per key under the data directory
//! - [`MemoryStore`]: an in-process map, used by tests

pub mod file;
pub mod memory;

use std::future::Future;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a persistence backend or while decoding its values.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backend could not be read or written.
    #[error("storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend is not reachable at all.
    #[error("storage unavailable for key '{key}'")]
    Unavailable { key: String },

    /// The stored value exists but could not be decoded.
    #[error("malformed data under key '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Asynchronous get/set of string values.
///
/// Implementations must return `Ok(None)` for a key that was never written.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str)
        -> impl Future<Output = Result<Option<String>, PersistenceError>> + Send;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: String)
        -> impl Future<Output = Result<(), PersistenceError>> + Send;
}
