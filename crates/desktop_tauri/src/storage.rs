//! Tauri command handlers over the file-backed record store.

use std::path::{Path, PathBuf};

use platform_host_native::{bootstrap_data_dir, BootstrapOutcome, FileRecordStore};
use serde_json::Value;
use tauri::{AppHandle, Manager, State};

/// Opens the record store at the bootstrapped data directory.
///
/// Falls back to `<app data>/CMS-Data` when no default candidate is writable.
pub(crate) fn open_record_store(app: &AppHandle) -> Result<FileRecordStore, String> {
    match bootstrap_data_dir(env!("CARGO_PKG_VERSION")) {
        Ok(outcome) => {
            log_bootstrap(&outcome);
            Ok(FileRecordStore::from_root(outcome.data_dir))
        }
        Err(err) => {
            tracing::warn!(error = %err, "default data directories unusable; using app data dir");
            let root = app
                .path()
                .app_data_dir()
                .map_err(|err| format!("failed to resolve app data dir: {err}"))?
                .join("CMS-Data");
            Ok(FileRecordStore::from_root(root))
        }
    }
}

fn log_bootstrap(outcome: &BootstrapOutcome) {
    tracing::info!(
        dir = %outcome.data_dir.display(),
        first_run = outcome.first_run,
        skipped = outcome.rejected.len(),
        "record store ready"
    );
}

fn path_label(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Applies a folder-dialog result and returns the directory now in effect.
pub fn apply_base_dir_choice(store: &FileRecordStore, choice: Option<PathBuf>) -> String {
    path_label(&store.choose_base_dir(choice))
}

/// Returns the current data directory, creating it when missing.
pub fn current_base_dir(store: &FileRecordStore) -> Result<String, String> {
    store
        .resolve_base_dir()
        .map(|dir| path_label(&dir))
        .map_err(|err| err.to_string())
}

async fn pick_folder(app: AppHandle, start: PathBuf) -> Option<PathBuf> {
    use tauri_plugin_dialog::DialogExt;

    let picked = tauri::async_runtime::spawn_blocking(move || {
        app.dialog()
            .file()
            .set_title("Select data folder")
            .set_directory(start)
            .set_can_create_directories(true)
            .blocking_pick_folder()
    })
    .await;

    match picked {
        Ok(Some(folder)) => folder.into_path().ok(),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(error = %err, "folder dialog task failed");
            None
        }
    }
}

/// Reads the record stored under `key`; `null` when absent or unreadable.
#[tauri::command]
pub fn storage_get(store: State<'_, FileRecordStore>, key: String) -> Option<Value> {
    store.read_key(&key)
}

/// Writes `value` under `key`; `false` on failure.
#[tauri::command]
pub async fn storage_set(
    store: State<'_, FileRecordStore>,
    key: String,
    value: Value,
) -> Result<bool, String> {
    Ok(store.write_key(&key, &value))
}

/// Returns the current data directory.
#[tauri::command]
pub fn storage_base_dir(store: State<'_, FileRecordStore>) -> Result<String, String> {
    current_base_dir(&store)
}

/// Shows a folder dialog and switches the data directory; unchanged when cancelled.
#[tauri::command]
pub async fn storage_choose_base_dir(
    app: AppHandle,
    store: State<'_, FileRecordStore>,
) -> Result<String, String> {
    let choice = pick_folder(app, store.config().current()).await;
    Ok(apply_base_dir_choice(&store, choice))
}

/// Atomically replaces `filename` in the data directory; `false` on failure.
#[tauri::command]
pub async fn storage_write_binary(
    store: State<'_, FileRecordStore>,
    filename: String,
    bytes: Vec<u8>,
) -> Result<bool, String> {
    Ok(store.write_binary_atomic(&filename, &bytes))
}
