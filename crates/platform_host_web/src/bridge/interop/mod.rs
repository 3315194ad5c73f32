//! Shared transport interop for browser bridge domains.
//!
//! This module routes calls to target-specific implementations while preserving a uniform API
//! for the directory and host-process bridge modules. Errors cross this boundary as JS message
//! strings.

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
use non_wasm as imp;
#[cfg(target_arch = "wasm32")]
use wasm as imp;

use serde_json::Value;
use wasm_bindgen::JsValue;

pub fn directory_access_supported() -> bool {
    imp::directory_access_supported()
}

pub async fn load_directory_handle() -> Result<Option<JsValue>, String> {
    imp::load_directory_handle().await
}

pub async fn save_directory_handle(handle: &JsValue) -> Result<(), String> {
    imp::save_directory_handle(handle).await
}

pub async fn clear_directory_handle() -> Result<(), String> {
    imp::clear_directory_handle().await
}

pub async fn pick_directory() -> Result<Option<JsValue>, String> {
    imp::pick_directory().await
}

pub fn directory_handle_name(handle: &JsValue) -> String {
    imp::directory_handle_name(handle)
}

pub async fn query_directory_permission(handle: &JsValue, mode: &str) -> Result<String, String> {
    imp::query_directory_permission(handle, mode).await
}

pub async fn request_directory_permission(handle: &JsValue, mode: &str) -> Result<String, String> {
    imp::request_directory_permission(handle, mode).await
}

pub async fn read_directory_file(
    handle: &JsValue,
    name: &str,
    create: bool,
) -> Result<Option<Vec<u8>>, String> {
    imp::read_directory_file(handle, name, create).await
}

pub async fn write_directory_file(handle: &JsValue, name: &str, bytes: &[u8]) -> Result<(), String> {
    imp::write_directory_file(handle, name, bytes).await
}

pub fn tauri_available() -> bool {
    imp::tauri_available()
}

pub async fn tauri_storage_get(key: &str) -> Result<Option<Value>, String> {
    imp::tauri_storage_get(key).await
}

pub async fn tauri_storage_set(key: &str, value: &Value) -> Result<bool, String> {
    imp::tauri_storage_set(key, value).await
}

pub async fn tauri_base_dir() -> Result<String, String> {
    imp::tauri_base_dir().await
}

pub async fn tauri_choose_base_dir() -> Result<String, String> {
    imp::tauri_choose_base_dir().await
}

pub async fn tauri_write_binary(filename: &str, bytes: &[u8]) -> Result<bool, String> {
    imp::tauri_write_binary(filename, bytes).await
}
