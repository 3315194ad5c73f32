use serde_json::Value;
use wasm_bindgen::JsValue;

fn unsupported() -> String {
    "Browser storage APIs are only available when compiled for wasm32".to_string()
}

pub fn directory_access_supported() -> bool {
    false
}

pub async fn load_directory_handle() -> Result<Option<JsValue>, String> {
    Ok(None)
}

pub async fn save_directory_handle(_handle: &JsValue) -> Result<(), String> {
    Err(unsupported())
}

pub async fn clear_directory_handle() -> Result<(), String> {
    Ok(())
}

pub async fn pick_directory() -> Result<Option<JsValue>, String> {
    Err(unsupported())
}

pub fn directory_handle_name(_handle: &JsValue) -> String {
    String::new()
}

pub async fn query_directory_permission(_handle: &JsValue, _mode: &str) -> Result<String, String> {
    Err(unsupported())
}

pub async fn request_directory_permission(
    _handle: &JsValue,
    _mode: &str,
) -> Result<String, String> {
    Err(unsupported())
}

pub async fn read_directory_file(
    _handle: &JsValue,
    _name: &str,
    _create: bool,
) -> Result<Option<Vec<u8>>, String> {
    Err(unsupported())
}

pub async fn write_directory_file(
    _handle: &JsValue,
    _name: &str,
    _bytes: &[u8],
) -> Result<(), String> {
    Err(unsupported())
}

pub fn tauri_available() -> bool {
    false
}

pub async fn tauri_storage_get(_key: &str) -> Result<Option<Value>, String> {
    Err(unsupported())
}

pub async fn tauri_storage_set(_key: &str, _value: &Value) -> Result<bool, String> {
    Err(unsupported())
}

pub async fn tauri_base_dir() -> Result<String, String> {
    Err(unsupported())
}

pub async fn tauri_choose_base_dir() -> Result<String, String> {
    Err(unsupported())
}

pub async fn tauri_write_binary(_filename: &str, _bytes: &[u8]) -> Result<bool, String> {
    Err(unsupported())
}
