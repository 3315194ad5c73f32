use std::rc::Rc;

use platform_host::{
    EphemeralStore, HostRecordStore, HostStoreFuture, MemoryEphemeralStore, NoopHostRecordStore,
    NoopSharedDocumentBackend, SandboxedDirectoryBackend, SharedDocumentBackend, StorageError,
};
use serde_json::Value;

use crate::{BrowserDirectoryAccess, IndexedDbHandleStore, TauriHostRecordStore, WebLocalStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Compile-time selected host strategy for `platform_host_web` adapters.
pub enum HostStrategy {
    /// Browser adapters: Tauri IPC when present, `localStorage`, File System Access folders.
    Browser,
    /// In-memory placeholders for headless builds and previews.
    DesktopStub,
}

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(feature = "desktop-host-stub")]
    {
        HostStrategy::DesktopStub
    }

    #[cfg(not(feature = "desktop-host-stub"))]
    {
        HostStrategy::Browser
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    match selected_host_strategy() {
        HostStrategy::Browser => "browser",
        HostStrategy::DesktopStub => "desktop-stub",
    }
}

/// Sandboxed directory backend wired to browser primitives.
pub type BrowserDirectoryBackend =
    SandboxedDirectoryBackend<BrowserDirectoryAccess, IndexedDbHandleStore>;

/// Adapter enum that erases the concrete host-process transport behind [`HostRecordStore`].
#[derive(Debug, Clone, Copy)]
pub enum HostRecordStoreAdapter {
    /// Tauri IPC transport, probed per call.
    Tauri(TauriHostRecordStore),
    /// No host process.
    DesktopStub(NoopHostRecordStore),
}

impl HostRecordStore for HostRecordStoreAdapter {
    fn is_available(&self) -> bool {
        match self {
            Self::Tauri(store) => store.is_available(),
            Self::DesktopStub(store) => store.is_available(),
        }
    }

    fn read_record<'a>(
        &'a self,
        key: &'a str,
    ) -> HostStoreFuture<'a, Result<Option<Value>, StorageError>> {
        match self {
            Self::Tauri(store) => store.read_record(key),
            Self::DesktopStub(store) => store.read_record(key),
        }
    }

    fn write_record<'a>(
        &'a self,
        key: &'a str,
        value: &'a Value,
    ) -> HostStoreFuture<'a, Result<(), StorageError>> {
        match self {
            Self::Tauri(store) => store.write_record(key, value),
            Self::DesktopStub(store) => store.write_record(key, value),
        }
    }

    fn base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>> {
        match self {
            Self::Tauri(store) => store.base_dir(),
            Self::DesktopStub(store) => store.base_dir(),
        }
    }

    fn choose_base_dir<'a>(&'a self) -> HostStoreFuture<'a, Result<String, StorageError>> {
        match self {
            Self::Tauri(store) => store.choose_base_dir(),
            Self::DesktopStub(store) => store.choose_base_dir(),
        }
    }

    fn write_binary<'a>(
        &'a self,
        filename: &'a str,
        bytes: &'a [u8],
    ) -> HostStoreFuture<'a, Result<(), StorageError>> {
        match self {
            Self::Tauri(store) => store.write_binary(filename, bytes),
            Self::DesktopStub(store) => store.write_binary(filename, bytes),
        }
    }
}

/// Adapter enum that erases the concrete ephemeral store behind [`EphemeralStore`].
#[derive(Debug, Clone)]
pub enum EphemeralStoreAdapter {
    /// `window.localStorage`.
    Browser(WebLocalStore),
    /// Process-local memory.
    DesktopStub(MemoryEphemeralStore),
}

impl EphemeralStore for EphemeralStoreAdapter {
    fn is_available(&self) -> bool {
        match self {
            Self::Browser(store) => store.is_available(),
            Self::DesktopStub(store) => store.is_available(),
        }
    }

    fn load_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Browser(store) => store.load_raw(key),
            Self::DesktopStub(store) => store.load_raw(key),
        }
    }

    fn save_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError> {
        match self {
            Self::Browser(store) => store.save_raw(key, raw_json),
            Self::DesktopStub(store) => store.save_raw(key, raw_json),
        }
    }
}

/// Returns the host-process record store for the selected strategy.
pub fn host_record_store() -> HostRecordStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => HostRecordStoreAdapter::Tauri(TauriHostRecordStore),
        HostStrategy::DesktopStub => HostRecordStoreAdapter::DesktopStub(NoopHostRecordStore),
    }
}

/// Returns the ephemeral fallback store for the selected strategy.
pub fn ephemeral_store() -> EphemeralStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => EphemeralStoreAdapter::Browser(WebLocalStore),
        HostStrategy::DesktopStub => {
            EphemeralStoreAdapter::DesktopStub(MemoryEphemeralStore::default())
        }
    }
}

/// Returns the sandboxed shared-document backend for the selected strategy.
pub fn shared_document_backend() -> Rc<dyn SharedDocumentBackend> {
    match selected_host_strategy() {
        HostStrategy::Browser => Rc::new(BrowserDirectoryBackend::new(
            BrowserDirectoryAccess,
            IndexedDbHandleStore,
        )),
        HostStrategy::DesktopStub => Rc::new(NoopSharedDocumentBackend),
    }
}

#[derive(Clone)]
/// Bundle of the storage services a browser build wires into the persistence facade.
pub struct HostServices {
    /// Host-process record transport.
    pub host: Rc<dyn HostRecordStore>,
    /// Ephemeral fallback store.
    pub ephemeral: Rc<dyn EphemeralStore>,
    /// Sandboxed shared-document backend.
    pub directory: Rc<dyn SharedDocumentBackend>,
}

/// Builds every storage service for the selected strategy.
pub fn build_host_services() -> HostServices {
    HostServices {
        host: Rc::new(host_record_store()),
        ephemeral: Rc::new(ephemeral_store()),
        directory: shared_document_backend(),
    }
}
