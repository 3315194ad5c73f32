//! Host-process record storage contract and in-memory adapters.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde_json::Value;

use crate::StorageError;

/// Object-safe boxed future used by [`HostRecordStore`] async methods.
pub type HostStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Durable per-key storage served by a privileged host process.
pub trait HostRecordStore {
    /// Probes whether the host process is reachable right now.
    ///
    /// Callers re-probe on every operation; the answer may change between calls.
    fn is_available(&self) -> bool;

    /// Reads the value stored under `key`.
    fn read_record<'a>(
        &'a self,
        key: &'a str,
    ) -> HostStoreFuture<'a, Result<Option<Value>, StorageError>>;

    /// Stores `value` under `key`.
    fn write_record<'a>(
        &'a self,
        key: &'a str,
        value: &'a Value,
    ) -> HostStoreFuture<'a, Result<(), StorageError>>;

    /// Returns the current base data directory.
    fn base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>>;

    /// Lets the user pick a new base directory; resolves to the unchanged path on cancel.
    fn choose_base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>>;

    /// Writes `bytes` to `filename` under the base directory with atomic replace semantics.
    fn write_binary<'a>(
        &'a self,
        filename: &'a str,
        bytes: &'a [u8],
    ) -> HostStoreFuture<'a, Result<(), StorageError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Host record store for environments without a privileged process.
pub struct NoopHostRecordStore;

impl NoopHostRecordStore {
    fn unavailable() -> StorageError {
        StorageError::Unavailable { backend: "host" }
    }
}

impl HostRecordStore for NoopHostRecordStore {
    fn is_available(&self) -> bool {
        false
    }

    fn read_record<'a>(
        &'a self,
        _key: &'a str,
    ) -> HostStoreFuture<'a, Result<Option<Value>, StorageError>> {
        Box::pin(async { Err(Self::unavailable()) })
    }

    fn write_record<'a>(
        &'a self,
        _key: &'a str,
        _value: &'a Value,
    ) -> HostStoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async { Err(Self::unavailable()) })
    }

    fn base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>> {
        Box::pin(async { Err(Self::unavailable()) })
    }

    fn choose_base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>> {
        Box::pin(async { Err(Self::unavailable()) })
    }

    fn write_binary<'a>(
        &'a self,
        _filename: &'a str,
        _bytes: &'a [u8],
    ) -> HostStoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async { Err(Self::unavailable()) })
    }
}

#[derive(Debug, Default)]
struct MemoryHostState {
    offline: bool,
    fail_writes: bool,
    base_dir: String,
    next_base_dir: Option<String>,
    records: HashMap<String, Value>,
    files: HashMap<String, Vec<u8>>,
    binary_writes: usize,
}

#[derive(Debug, Clone, Default)]
/// In-memory host record store with switchable reachability, for tests and previews.
pub struct MemoryHostRecordStore {
    inner: Rc<RefCell<MemoryHostState>>,
}

impl MemoryHostRecordStore {
    /// Creates a reachable store reporting `base_dir` as its data directory.
    pub fn with_base_dir(base_dir: impl Into<String>) -> Self {
        let store = Self::default();
        store.inner.borrow_mut().base_dir = base_dir.into();
        store
    }

    /// Marks the host process as reachable or not.
    pub fn set_available(&self, available: bool) {
        self.inner.borrow_mut().offline = !available;
    }

    /// Makes subsequent record and binary writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Sets the directory the next `choose_base_dir` call will pick (`None` simulates cancel).
    pub fn set_next_base_dir(&self, choice: Option<String>) {
        self.inner.borrow_mut().next_base_dir = choice;
    }

    /// Returns the stored bytes of a binary file.
    pub fn binary_file(&self, filename: &str) -> Option<Vec<u8>> {
        self.inner.borrow().files.get(filename).cloned()
    }

    /// Returns how many binary writes have succeeded.
    pub fn binary_write_count(&self) -> usize {
        self.inner.borrow().binary_writes
    }

    /// Returns the stored value without going through the async contract.
    pub fn record(&self, key: &str) -> Option<Value> {
        self.inner.borrow().records.get(key).cloned()
    }

    fn check_reachable(&self) -> Result<(), StorageError> {
        if self.inner.borrow().offline {
            Err(StorageError::Unavailable { backend: "host" })
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        self.check_reachable()?;
        if self.inner.borrow().fail_writes {
            Err(StorageError::Host("simulated write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl HostRecordStore for MemoryHostRecordStore {
    fn is_available(&self) -> bool {
        !self.inner.borrow().offline
    }

    fn read_record<'a>(
        &'a self,
        key: &'a str,
    ) -> HostStoreFuture<'a, Result<Option<Value>, StorageError>> {
        Box::pin(async move {
            self.check_reachable()?;
            Ok(self.inner.borrow().records.get(key).cloned())
        })
    }

    fn write_record<'a>(
        &'a self,
        key: &'a str,
        value: &'a Value,
    ) -> HostStoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.check_writable()?;
            self.inner
                .borrow_mut()
                .records
                .insert(key.to_string(), value.clone());
            Ok(())
        })
    }

    fn base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>> {
        Box::pin(async move {
            self.check_reachable()?;
            Ok(self.inner.borrow().base_dir.clone())
        })
    }

    fn choose_base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>> {
        Box::pin(async move {
            self.check_reachable()?;
            let mut inner = self.inner.borrow_mut();
            if let Some(choice) = inner.next_base_dir.take() {
                inner.base_dir = choice;
            }
            Ok(inner.base_dir.clone())
        })
    }

    fn write_binary<'a>(
        &'a self,
        filename: &'a str,
        bytes: &'a [u8],
    ) -> HostStoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.check_writable()?;
            let mut inner = self.inner.borrow_mut();
            inner.files.insert(filename.to_string(), bytes.to_vec());
            inner.binary_writes += 1;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde_json::json;

    use super::*;

    #[test]
    fn memory_host_store_round_trip_and_offline_probe() {
        let store = MemoryHostRecordStore::with_base_dir("/data");
        let store_obj: &dyn HostRecordStore = &store;

        assert!(store_obj.is_available());
        assert_eq!(block_on(store_obj.read_record("k")).expect("read"), None);
        block_on(store_obj.write_record("k", &json!([1, 2]))).expect("write");
        assert_eq!(
            block_on(store_obj.read_record("k")).expect("read"),
            Some(json!([1, 2]))
        );

        store.set_available(false);
        assert!(!store_obj.is_available());
        assert!(matches!(
            block_on(store_obj.read_record("k")),
            Err(StorageError::Unavailable { .. })
        ));
    }

    #[test]
    fn memory_host_store_choose_base_dir_keeps_path_on_cancel() {
        let store = MemoryHostRecordStore::with_base_dir("/data");
        assert_eq!(block_on(store.choose_base_dir()).expect("choose"), "/data");
        store.set_next_base_dir(Some("/elsewhere".to_string()));
        assert_eq!(
            block_on(store.choose_base_dir()).expect("choose"),
            "/elsewhere"
        );
        assert_eq!(block_on(store.base_dir()).expect("dir"), "/elsewhere");
    }

    #[test]
    fn noop_host_store_is_unavailable() {
        let store = NoopHostRecordStore;
        assert!(!store.is_available());
        assert!(block_on(store.write_binary("latest.xlsx", b"x")).is_err());
    }
}
