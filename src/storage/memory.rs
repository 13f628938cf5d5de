//! In-memory key-value store.

use super::{KeyValueStore, PersistenceError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A process-local store backed by a `HashMap`.
///
/// It can be flipped to "unreachable" so callers can exercise failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    unreachable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get`/`set` fail with [`PersistenceError::Unavailable`].
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self, key: &str) -> Result<(), PersistenceError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable {
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.check_reachable(key)?;
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), PersistenceError> {
        self.check_reachable(key)?;
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
