use platform_host::StorageError;
use serde_json::Value;

use super::{host_error, interop};

pub(crate) fn available() -> bool {
    interop::tauri_available()
}

pub(crate) async fn storage_get(key: &str) -> Result<Option<Value>, StorageError> {
    interop::tauri_storage_get(key).await.map_err(host_error)
}

pub(crate) async fn storage_set(key: &str, value: &Value) -> Result<(), StorageError> {
    if interop::tauri_storage_set(key, value)
        .await
        .map_err(host_error)?
    {
        Ok(())
    } else {
        Err(StorageError::Host(format!("host rejected write of `{key}`")))
    }
}

pub(crate) async fn base_dir() -> Result<String, StorageError> {
    interop::tauri_base_dir().await.map_err(host_error)
}

pub(crate) async fn choose_base_dir() -> Result<String, StorageError> {
    interop::tauri_choose_base_dir().await.map_err(host_error)
}

pub(crate) async fn write_binary(filename: &str, bytes: &[u8]) -> Result<(), StorageError> {
    if interop::tauri_write_binary(filename, bytes)
        .await
        .map_err(host_error)?
    {
        Ok(())
    } else {
        Err(StorageError::Host(format!("host rejected binary write of `{filename}`")))
    }
}
