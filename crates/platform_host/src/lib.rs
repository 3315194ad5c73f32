//! Typed storage contracts shared by the desktop host process and browser adapters.
//!
//! This crate is the API-first boundary for record persistence. It defines the error type,
//! record-key policy, host/ephemeral/directory service traits and the sandboxed-folder backend,
//! plus in-memory adapters for tests. Concrete browser adapters live in `platform_host_web`, the
//! file backend in `platform_host_native`, and desktop transport behind `desktop_tauri`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod storage;

pub use error::StorageError;
pub use storage::directory::{
    CapabilityHandleStore, CapabilityState, DirectoryAccess, DirectoryFuture, DirectoryInfo,
    PermissionMode, PermissionState,
};
pub use storage::ephemeral::{
    load_value_with, save_value_with, EphemeralStore, MemoryEphemeralStore, NoopEphemeralStore,
};
pub use storage::host_records::{
    HostRecordStore, HostStoreFuture, MemoryHostRecordStore, NoopHostRecordStore,
};
pub use storage::memory_directory::{
    MemoryCapabilityHandleStore, MemoryDirectoryAccess, MemoryDirectoryHandle,
};
pub use storage::records::{
    plain_file_name, record_file_name, record_key_from_file_name, validate_record_key,
    CATEGORIES_KEY, CLIENTS_KEY, COMPANY_INFO_KEY, ESTIMATES_KEY, INVOICES_KEY, MIRROR_FILE_NAME,
    RECORD_SET_KEYS, STAMP_IMAGE_KEY, STORE_DOCUMENT_FILE, UNITS_KEY, WORK_ITEMS_KEY,
};
pub use storage::sandboxed::{
    NoopSharedDocumentBackend, SandboxConfig, SandboxedDirectoryBackend, SharedDocumentBackend,
};
