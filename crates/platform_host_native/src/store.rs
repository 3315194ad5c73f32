//! Per-key JSON record files under the base data directory.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use platform_host::{
    plain_file_name, record_file_name, record_key_from_file_name, HostRecordStore,
    HostStoreFuture, StorageError, STORE_DOCUMENT_FILE,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{atomic, config::BaseDirConfig};

#[derive(Debug, Clone)]
/// File-backed record store rooted at a [`BaseDirConfig`].
///
/// Each key lives in `<key>.json`. Keys missing from disk fall back to the legacy all-keys
/// `store.json` document, which is never written.
pub struct FileRecordStore {
    config: BaseDirConfig,
}

impl FileRecordStore {
    /// Creates a store over a shared base-directory config.
    pub fn new(config: BaseDirConfig) -> Self {
        Self { config }
    }

    /// Creates a store with its own config rooted at `root`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self::new(BaseDirConfig::new(root))
    }

    /// Base-directory config shared with this store.
    pub fn config(&self) -> &BaseDirConfig {
        &self.config
    }

    /// Returns the current base directory, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn resolve_base_dir(&self) -> Result<PathBuf, StorageError> {
        let base_dir = self.config.current();
        fs::create_dir_all(&base_dir).map_err(|source| StorageError::io(&base_dir, source))?;
        Ok(base_dir)
    }

    /// Applies a user directory choice. `None` (cancelled) keeps the current directory.
    ///
    /// Returns the resulting base directory.
    pub fn choose_base_dir(&self, choice: Option<PathBuf>) -> PathBuf {
        let Some(choice) = choice else {
            return self.config.current();
        };
        let previous = self.config.replace(&choice);
        if let Err(source) = fs::create_dir_all(&choice) {
            warn!(path = %choice.display(), error = %source, "chosen base directory could not be created");
        }
        info!(from = %previous.display(), to = %choice.display(), "base data directory changed");
        choice
    }

    /// Reads the record stored under `key`; `None` when absent or unreadable.
    pub fn read_key(&self, key: &str) -> Option<Value> {
        match self.try_read_key(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "record read failed");
                None
            }
        }
    }

    /// Reads the record stored under `key`, consulting the legacy document on a miss.
    ///
    /// An empty per-key file reads as absent.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys, unreadable files and unparseable per-key documents.
    pub fn try_read_key(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let file_name = record_file_name(key)?;
        let base_dir = self.resolve_base_dir()?;
        let path = base_dir.join(&file_name);
        match fs::read(&path) {
            Ok(bytes) if is_blank(&bytes) => Ok(None),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|err| StorageError::parse(path.display().to_string(), err)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(read_legacy_key(&base_dir, key)),
            Err(source) => Err(StorageError::io(path, source)),
        }
    }

    /// Writes `value` as pretty JSON to the per-key file. Returns `false` on any failure.
    pub fn write_key(&self, key: &str, value: &Value) -> bool {
        match self.try_write_key(key, value) {
            Ok(()) => true,
            Err(err) => {
                warn!(key, error = %err, "record write failed");
                false
            }
        }
    }

    /// Writes `value` as pretty JSON to the per-key file.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys and filesystem failures.
    pub fn try_write_key(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let file_name = record_file_name(key)?;
        let path = self.resolve_base_dir()?.join(file_name);
        let serialized = serde_json::to_string_pretty(value)
            .map_err(|err| StorageError::Serialize(err.to_string()))?;
        fs::write(&path, serialized).map_err(|source| StorageError::io(path, source))
    }

    /// Atomically replaces `filename` in the base directory. Returns `false` on any failure.
    pub fn write_binary_atomic(&self, filename: &str, bytes: &[u8]) -> bool {
        match self.try_write_binary_atomic(filename, bytes) {
            Ok(path) => {
                debug!(path = %path.display(), len = bytes.len(), "binary file replaced");
                true
            }
            Err(err) => {
                warn!(filename, error = %err, "atomic binary write failed");
                false
            }
        }
    }

    /// Atomically replaces `filename` in the base directory. Blank names map to the mirror file.
    ///
    /// # Errors
    ///
    /// Returns an error for non-plain file names, temp-file failures and rename failures.
    pub fn try_write_binary_atomic(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let name = plain_file_name(filename)?;
        let base_dir = self.resolve_base_dir()?;
        atomic::write_atomic(&base_dir, name, bytes)
    }

    /// Lists keys that have a per-key file, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error when the base directory cannot be listed.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let base_dir = self.resolve_base_dir()?;
        let entries =
            fs::read_dir(&base_dir).map_err(|source| StorageError::io(&base_dir, source))?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StorageError::io(&base_dir, source))?;
            if !entry.file_type().map(|kind| kind.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            if let Some(key) = name.to_str().and_then(record_key_from_file_name) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn read_legacy_key(base_dir: &Path, key: &str) -> Option<Value> {
    let path = base_dir.join(STORE_DOCUMENT_FILE);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "legacy document unreadable");
            return None;
        }
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(mut legacy)) => legacy.remove(key),
        Ok(_) => None,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "legacy document unparseable");
            None
        }
    }
}

impl HostRecordStore for FileRecordStore {
    fn is_available(&self) -> bool {
        true
    }

    fn read_record<'a>(
        &'a self,
        key: &'a str,
    ) -> HostStoreFuture<'a, Result<Option<Value>, StorageError>> {
        Box::pin(async move { self.try_read_key(key) })
    }

    fn write_record<'a>(
        &'a self,
        key: &'a str,
        value: &'a Value,
    ) -> HostStoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { self.try_write_key(key, value) })
    }

    fn base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>> {
        Box::pin(async move {
            self.resolve_base_dir()
                .map(|path| path.display().to_string())
        })
    }

    fn choose_base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>> {
        // In-process callers have no folder picker; the choice is always "cancelled".
        Box::pin(async move { Ok(self.choose_base_dir(None).display().to_string()) })
    }

    fn write_binary<'a>(
        &'a self,
        filename: &'a str,
        bytes: &'a [u8],
    ) -> HostStoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { self.try_write_binary_atomic(filename, bytes).map(|_| ()) })
    }
}
