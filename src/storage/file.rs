//! File-backed key-value store.
//!
//! Each key is stored as `<dir>/<key>.json`. Writes go to a named temporary
//! file in the same directory which is synced and then persisted over the
//! target, so a reader never sees a half-written log. If any step fails the
//! temporary file is removed.

use super::{KeyValueStore, PersistenceError};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A store that keeps one file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the value files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(key, e))?;

        let dir = self.dir.clone();
        let path = self.path_for(key);
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, value.as_bytes()))
            .await
            .map_err(|e| io_error(key, std::io::Error::other(e)))?
            .map_err(|e| io_error(key, e))?;

        debug!(key, path = %path.display(), "wrote value");
        Ok(())
    }
}

/// Write `contents` to `path` through a temporary file in `dir`.
///
/// The temporary file is deleted on drop unless it was persisted.
fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.into_temp_path().persist(path).map_err(|e| e.error)?;
    Ok(())
}
