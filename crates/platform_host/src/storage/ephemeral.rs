//! Ephemeral key-value fallback contract (browser `localStorage` and friends).

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use serde_json::Value;

use crate::StorageError;

/// Synchronous key-value store holding raw JSON text per key.
///
/// This is the last-resort primary store when no host process is reachable.
pub trait EphemeralStore {
    /// Probes whether the store can be used right now.
    fn is_available(&self) -> bool;

    /// Loads the raw JSON text stored under `key`.
    fn load_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Saves raw JSON text under `key`.
    fn save_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError>;
}

/// Loads and parses the JSON value stored under `key`.
///
/// Empty text is treated as absent.
///
/// # Errors
///
/// Returns an error when the store fails or the stored text is not valid JSON.
pub fn load_value_with(
    store: &dyn EphemeralStore,
    key: &str,
) -> Result<Option<Value>, StorageError> {
    match store.load_raw(key)? {
        Some(raw) if !raw.is_empty() => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::parse(format!("ephemeral record `{key}`"), err)),
        _ => Ok(None),
    }
}

/// Serializes `value` and saves it under `key`.
///
/// # Errors
///
/// Returns an error when serialization or the underlying store fails.
pub fn save_value_with(
    store: &dyn EphemeralStore,
    key: &str,
    value: &Value,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|err| StorageError::Serialize(err.to_string()))?;
    store.save_raw(key, &raw)
}

#[derive(Debug, Clone, Copy, Default)]
/// Ephemeral store for hosts without any key-value facility.
pub struct NoopEphemeralStore;

impl EphemeralStore for NoopEphemeralStore {
    fn is_available(&self) -> bool {
        false
    }

    fn load_raw(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn save_raw(&self, _key: &str, _raw_json: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable {
            backend: "ephemeral",
        })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory ephemeral store keyed by string.
pub struct MemoryEphemeralStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryEphemeralStore {
    /// Inserts raw text directly, bypassing serialization (useful for corrupt-data tests).
    pub fn insert_raw(&self, key: &str, raw_json: &str) {
        self.inner
            .borrow_mut()
            .insert(key.to_string(), raw_json.to_string());
    }
}

impl EphemeralStore for MemoryEphemeralStore {
    fn is_available(&self) -> bool {
        true
    }

    fn load_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn save_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError> {
        self.insert_raw(key, raw_json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn memory_store_value_round_trip() {
        let store = MemoryEphemeralStore::default();
        assert_eq!(load_value_with(&store, "k").expect("load"), None);
        save_value_with(&store, "k", &json!({"id": 1, "name": "Kim"})).expect("save");
        assert_eq!(
            load_value_with(&store, "k").expect("load"),
            Some(json!({"id": 1, "name": "Kim"}))
        );
    }

    #[test]
    fn corrupt_and_empty_text() {
        let store = MemoryEphemeralStore::default();
        store.insert_raw("empty", "");
        store.insert_raw("bad", "{\"a\":");
        assert_eq!(load_value_with(&store, "empty").expect("load"), None);
        assert!(matches!(
            load_value_with(&store, "bad"),
            Err(StorageError::Parse { .. })
        ));
    }

    #[test]
    fn noop_store_rejects_writes() {
        let store = NoopEphemeralStore;
        assert!(!store.is_available());
        assert!(save_value_with(&store, "k", &json!(1)).is_err());
    }
}
