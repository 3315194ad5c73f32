//! IndexedDB-backed persistence of the granted directory handle.
//!
//! Schema: database `cms-fs`, object store `handles`, fixed key `dirHandle`.

use platform_host::{CapabilityHandleStore, DirectoryFuture, StorageError};

use crate::directory::BrowserDirectoryHandle;

#[derive(Debug, Clone, Copy, Default)]
/// Capability handle store backed by IndexedDB structured clone.
pub struct IndexedDbHandleStore;

impl CapabilityHandleStore for IndexedDbHandleStore {
    type Handle = BrowserDirectoryHandle;

    fn load_handle<'a>(
        &'a self,
    ) -> DirectoryFuture<'a, Result<Option<BrowserDirectoryHandle>, StorageError>> {
        Box::pin(async move {
            Ok(crate::bridge::directory::load_handle()
                .await?
                .map(BrowserDirectoryHandle::from_js))
        })
    }

    fn save_handle<'a>(
        &'a self,
        handle: &'a BrowserDirectoryHandle,
    ) -> DirectoryFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { crate::bridge::directory::save_handle(handle.as_js()).await })
    }

    fn clear_handle<'a>(&'a self) -> DirectoryFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { crate::bridge::directory::clear_handle().await })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_handle_store_has_nothing_persisted() {
        let store = IndexedDbHandleStore;
        assert!(block_on(store.load_handle()).expect("load").is_none());
        block_on(store.clear_handle()).expect("clear");
    }
}
