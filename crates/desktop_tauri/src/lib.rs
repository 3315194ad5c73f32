//! Tauri desktop host process for the business-records app.
//!
//! The host owns the file-backed record store and exposes it to the webview over IPC commands
//! (`storage_get`, `storage_set`, `storage_base_dir`, `storage_choose_base_dir`,
//! `storage_write_binary`). Command registration stays localized here so the webview side only
//! depends on command names.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

#[doc(hidden)]
pub mod storage;

use tauri::Manager;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Starts the Tauri desktop host process.
pub fn run() {
    init_tracing();
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let store = storage::open_record_store(app.handle())?;
            app.manage(store);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            storage::storage_get,
            storage::storage_set,
            storage::storage_base_dir,
            storage::storage_choose_base_dir,
            storage::storage_write_binary
        ])
        .run(tauri::generate_context!())
        .expect("desktop_tauri failed to run Tauri application");
}
