//! Tauri command-backed host record store transport.
//!
//! This store uses the bridge interop layer, which routes record calls to the desktop host's
//! `storage_*` commands when the webview exposes Tauri IPC. Reachability is probed per call.

use platform_host::{HostRecordStore, HostStoreFuture, StorageError};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
/// Host record store backed by Tauri command transport.
pub struct TauriHostRecordStore;

impl HostRecordStore for TauriHostRecordStore {
    fn is_available(&self) -> bool {
        crate::bridge::host::available()
    }

    fn read_record<'a>(
        &'a self,
        key: &'a str,
    ) -> HostStoreFuture<'a, Result<Option<Value>, StorageError>> {
        Box::pin(async move { crate::bridge::host::storage_get(key).await })
    }

    fn write_record<'a>(
        &'a self,
        key: &'a str,
        value: &'a Value,
    ) -> HostStoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { crate::bridge::host::storage_set(key, value).await })
    }

    fn base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>> {
        Box::pin(async move { crate::bridge::host::base_dir().await })
    }

    fn choose_base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>> {
        Box::pin(async move { crate::bridge::host::choose_base_dir().await })
    }

    fn write_binary<'a>(
        &'a self,
        filename: &'a str,
        bytes: &'a [u8],
    ) -> HostStoreFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { crate::bridge::host::write_binary(filename, bytes).await })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde_json::json;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_tauri_store_reports_unreachable_host() {
        let store = TauriHostRecordStore;
        let store_obj: &dyn HostRecordStore = &store;

        assert!(!store_obj.is_available());
        assert!(matches!(
            block_on(store_obj.read_record("constructionApp_clients")),
            Err(StorageError::Host(_))
        ));
        assert!(block_on(store_obj.write_record("k", &json!(1))).is_err());
        assert!(block_on(store_obj.write_binary("latest.xlsx", b"x")).is_err());
    }
}
