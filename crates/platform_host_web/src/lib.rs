//! Browser (`wasm32`) implementations of [`platform_host`] storage contracts.
//!
//! This crate is the concrete browser-side wiring layer for record persistence: the Tauri IPC
//! transport to the desktop host process, the `localStorage` fallback, and File System Access
//! folders with their IndexedDB-persisted capability handle.
//!
//! Bridge bindings are split by domain under `bridge/`:
//! - `bridge::directory`
//! - `bridge::host`
//! - `bridge::interop` (shared wasm/non-wasm transport glue)

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and concrete adapter factories for runtime wiring.
pub mod adapters;
mod bridge;
pub mod directory;
pub mod storage;

pub use adapters::{
    build_host_services, ephemeral_store, host_record_store, host_strategy_name,
    selected_host_strategy, shared_document_backend, BrowserDirectoryBackend,
    EphemeralStoreAdapter, HostRecordStoreAdapter, HostServices, HostStrategy,
};
pub use directory::{BrowserDirectoryAccess, BrowserDirectoryHandle};
pub use storage::indexed_db::IndexedDbHandleStore;
pub use storage::local_records::WebLocalStore;
pub use storage::tauri_records::TauriHostRecordStore;
