use platform_host::{PermissionMode, PermissionState, StorageError};
use wasm_bindgen::JsValue;

use super::{host_error, interop};

pub(crate) fn supported() -> bool {
    interop::directory_access_supported()
}

pub(crate) async fn load_handle() -> Result<Option<JsValue>, StorageError> {
    interop::load_directory_handle().await.map_err(host_error)
}

pub(crate) async fn save_handle(handle: &JsValue) -> Result<(), StorageError> {
    interop::save_directory_handle(handle)
        .await
        .map_err(host_error)
}

pub(crate) async fn clear_handle() -> Result<(), StorageError> {
    interop::clear_directory_handle().await.map_err(host_error)
}

pub(crate) async fn pick() -> Result<Option<JsValue>, StorageError> {
    if !supported() {
        return Err(StorageError::Unsupported("directory picker"));
    }
    interop::pick_directory().await.map_err(host_error)
}

pub(crate) fn handle_name(handle: &JsValue) -> String {
    interop::directory_handle_name(handle)
}

pub(crate) async fn query_permission(
    handle: &JsValue,
    mode: PermissionMode,
) -> Result<PermissionState, StorageError> {
    let token = interop::query_directory_permission(handle, mode.as_str())
        .await
        .map_err(host_error)?;
    Ok(PermissionState::from_host_token(&token, mode))
}

pub(crate) async fn request_permission(
    handle: &JsValue,
    mode: PermissionMode,
) -> Result<PermissionState, StorageError> {
    let token = interop::request_directory_permission(handle, mode.as_str())
        .await
        .map_err(host_error)?;
    Ok(PermissionState::from_host_token(&token, mode))
}

pub(crate) async fn read_file(
    handle: &JsValue,
    name: &str,
    create: bool,
) -> Result<Option<Vec<u8>>, StorageError> {
    interop::read_directory_file(handle, name, create)
        .await
        .map_err(host_error)
}

pub(crate) async fn write_file(
    handle: &JsValue,
    name: &str,
    bytes: &[u8],
) -> Result<(), StorageError> {
    interop::write_directory_file(handle, name, bytes)
        .await
        .map_err(host_error)
}
