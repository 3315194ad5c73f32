use js_sys::{Promise, Uint8Array};
use serde::Serialize;
use serde_json::{json, Value};
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(inline_js = r#"
const DB_NAME = 'cms-fs';
const DB_VERSION = 1;
const HANDLE_STORE = 'handles';
const HANDLE_KEY = 'dirHandle';
const PICKER_ID = 'cms-data';

function fail(message) {
  throw new Error(message);
}

function idbSupported() {
  return typeof indexedDB !== 'undefined';
}

function requestToPromise(req) {
  return new Promise((resolve, reject) => {
    req.onsuccess = () => resolve(req.result);
    req.onerror = () => reject(req.error || new Error('IndexedDB request failed'));
  });
}

function txDone(tx) {
  return new Promise((resolve, reject) => {
    tx.oncomplete = () => resolve();
    tx.onabort = () => reject(tx.error || new Error('IndexedDB transaction aborted'));
    tx.onerror = () => reject(tx.error || new Error('IndexedDB transaction error'));
  });
}

async function openDb() {
  if (!idbSupported()) {
    fail('IndexedDB is unavailable in this browser context');
  }
  return await new Promise((resolve, reject) => {
    const req = indexedDB.open(DB_NAME, DB_VERSION);
    req.onupgradeneeded = () => {
      const db = req.result;
      if (!db.objectStoreNames.contains(HANDLE_STORE)) {
        db.createObjectStore(HANDLE_STORE);
      }
    };
    req.onsuccess = () => resolve(req.result);
    req.onerror = () => reject(req.error || new Error('Failed to open IndexedDB'));
  });
}

async function withHandleStore(mode, fn) {
  const db = await openDb();
  try {
    const tx = db.transaction(HANDLE_STORE, mode);
    const result = await fn(tx.objectStore(HANDLE_STORE));
    await txDone(tx);
    return result;
  } finally {
    db.close();
  }
}

function tauriInvoke() {
  if (typeof window === 'undefined') return null;
  const internals = window.__TAURI_INTERNALS__;
  if (!internals || typeof internals.invoke !== 'function') return null;
  return internals.invoke.bind(internals);
}

export function jsDirectoryAccessSupported() {
  return typeof window !== 'undefined'
    && typeof window.showDirectoryPicker === 'function'
    && idbSupported();
}

export async function jsLoadDirectoryHandle() {
  return await withHandleStore('readonly', async (store) => {
    const handle = await requestToPromise(store.get(HANDLE_KEY));
    return handle ?? null;
  });
}

export async function jsSaveDirectoryHandle(handle) {
  return await withHandleStore('readwrite', async (store) => {
    await requestToPromise(store.put(handle, HANDLE_KEY));
    return null;
  });
}

export async function jsClearDirectoryHandle() {
  return await withHandleStore('readwrite', async (store) => {
    await requestToPromise(store.delete(HANDLE_KEY));
    return null;
  });
}

export async function jsPickDirectory() {
  if (!jsDirectoryAccessSupported()) {
    fail('File System Access API is not supported in this browser');
  }
  try {
    return await window.showDirectoryPicker({ id: PICKER_ID, mode: 'readwrite' });
  } catch (err) {
    if (err && err.name === 'AbortError') return null;
    throw err;
  }
}

export function jsDirectoryHandleName(handle) {
  return handle && typeof handle.name === 'string' ? handle.name : '';
}

export async function jsQueryDirectoryPermission(handle, mode) {
  if (!handle || typeof handle.queryPermission !== 'function') return 'granted';
  return await handle.queryPermission({ mode });
}

export async function jsRequestDirectoryPermission(handle, mode) {
  if (!handle || typeof handle.requestPermission !== 'function') return 'granted';
  return await handle.requestPermission({ mode });
}

export async function jsReadDirectoryFile(handle, name, create) {
  let fileHandle;
  try {
    fileHandle = await handle.getFileHandle(name, { create: !!create });
  } catch (err) {
    if (!create && err && err.name === 'NotFoundError') return null;
    throw err;
  }
  const file = await fileHandle.getFile();
  return new Uint8Array(await file.arrayBuffer());
}

export async function jsWriteDirectoryFile(handle, name, bytes) {
  const fileHandle = await handle.getFileHandle(name, { create: true });
  const writable = await fileHandle.createWritable();
  try {
    await writable.write(bytes);
    await writable.close();
  } catch (err) {
    try { await writable.abort(); } catch (_) {}
    throw err;
  }
  return null;
}

export function jsTauriAvailable() {
  return tauriInvoke() !== null;
}

export async function jsTauriInvoke(command, args) {
  const invoke = tauriInvoke();
  if (!invoke) fail('Tauri IPC is unavailable in this context');
  return await invoke(command, args ?? {});
}

export async function jsTauriWriteBinary(filename, bytes) {
  return await jsTauriInvoke('storage_write_binary', { filename, bytes: Array.from(bytes) });
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = jsDirectoryAccessSupported)]
    fn js_directory_access_supported() -> bool;
    #[wasm_bindgen(js_name = jsLoadDirectoryHandle)]
    fn js_load_directory_handle() -> Promise;
    #[wasm_bindgen(js_name = jsSaveDirectoryHandle)]
    fn js_save_directory_handle(handle: &JsValue) -> Promise;
    #[wasm_bindgen(js_name = jsClearDirectoryHandle)]
    fn js_clear_directory_handle() -> Promise;
    #[wasm_bindgen(js_name = jsPickDirectory)]
    fn js_pick_directory() -> Promise;
    #[wasm_bindgen(js_name = jsDirectoryHandleName)]
    fn js_directory_handle_name(handle: &JsValue) -> String;
    #[wasm_bindgen(js_name = jsQueryDirectoryPermission)]
    fn js_query_directory_permission(handle: &JsValue, mode: &str) -> Promise;
    #[wasm_bindgen(js_name = jsRequestDirectoryPermission)]
    fn js_request_directory_permission(handle: &JsValue, mode: &str) -> Promise;
    #[wasm_bindgen(js_name = jsReadDirectoryFile)]
    fn js_read_directory_file(handle: &JsValue, name: &str, create: bool) -> Promise;
    #[wasm_bindgen(js_name = jsWriteDirectoryFile)]
    fn js_write_directory_file(handle: &JsValue, name: &str, bytes: &[u8]) -> Promise;

    #[wasm_bindgen(js_name = jsTauriAvailable)]
    fn js_tauri_available() -> bool;
    #[wasm_bindgen(js_name = jsTauriInvoke)]
    fn js_tauri_invoke(command: &str, args: JsValue) -> Promise;
    #[wasm_bindgen(js_name = jsTauriWriteBinary)]
    fn js_tauri_write_binary(filename: &str, bytes: &[u8]) -> Promise;
}

async fn await_promise(promise: Promise) -> Result<JsValue, String> {
    JsFuture::from(promise).await.map_err(js_error_to_string)
}

fn js_error_to_string(err: JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    if let Ok(message) = js_sys::Reflect::get(&err, &JsValue::from_str("message")) {
        if let Some(text) = message.as_string() {
            return text;
        }
    }
    format!("{err:?}")
}

fn to_js_args(args: &Value) -> Result<JsValue, String> {
    args.serialize(&Serializer::json_compatible())
        .map_err(|e| e.to_string())
}

fn optional(value: JsValue) -> Option<JsValue> {
    if value.is_null() || value.is_undefined() {
        None
    } else {
        Some(value)
    }
}

pub fn directory_access_supported() -> bool {
    js_directory_access_supported()
}

pub async fn load_directory_handle() -> Result<Option<JsValue>, String> {
    await_promise(js_load_directory_handle()).await.map(optional)
}

pub async fn save_directory_handle(handle: &JsValue) -> Result<(), String> {
    let _ = await_promise(js_save_directory_handle(handle)).await?;
    Ok(())
}

pub async fn clear_directory_handle() -> Result<(), String> {
    let _ = await_promise(js_clear_directory_handle()).await?;
    Ok(())
}

pub async fn pick_directory() -> Result<Option<JsValue>, String> {
    await_promise(js_pick_directory()).await.map(optional)
}

pub fn directory_handle_name(handle: &JsValue) -> String {
    js_directory_handle_name(handle)
}

pub async fn query_directory_permission(handle: &JsValue, mode: &str) -> Result<String, String> {
    let value = await_promise(js_query_directory_permission(handle, mode)).await?;
    Ok(value.as_string().unwrap_or_default())
}

pub async fn request_directory_permission(handle: &JsValue, mode: &str) -> Result<String, String> {
    let value = await_promise(js_request_directory_permission(handle, mode)).await?;
    Ok(value.as_string().unwrap_or_default())
}

pub async fn read_directory_file(
    handle: &JsValue,
    name: &str,
    create: bool,
) -> Result<Option<Vec<u8>>, String> {
    let value = await_promise(js_read_directory_file(handle, name, create)).await?;
    Ok(optional(value).map(|bytes| Uint8Array::new(&bytes).to_vec()))
}

pub async fn write_directory_file(handle: &JsValue, name: &str, bytes: &[u8]) -> Result<(), String> {
    let _ = await_promise(js_write_directory_file(handle, name, bytes)).await?;
    Ok(())
}

pub fn tauri_available() -> bool {
    js_tauri_available()
}

pub async fn tauri_storage_get(key: &str) -> Result<Option<Value>, String> {
    let args = to_js_args(&json!({ "key": key }))?;
    let value = await_promise(js_tauri_invoke("storage_get", args)).await?;
    match optional(value) {
        Some(value) => from_value(value).map(Some).map_err(|e| e.to_string()),
        None => Ok(None),
    }
}

pub async fn tauri_storage_set(key: &str, value: &Value) -> Result<bool, String> {
    let args = to_js_args(&json!({ "key": key, "value": value }))?;
    let ok = await_promise(js_tauri_invoke("storage_set", args)).await?;
    Ok(ok.as_bool().unwrap_or(false))
}

pub async fn tauri_base_dir() -> Result<String, String> {
    let value = await_promise(js_tauri_invoke("storage_base_dir", JsValue::UNDEFINED)).await?;
    from_value(value).map_err(|e| e.to_string())
}

pub async fn tauri_choose_base_dir() -> Result<String, String> {
    let value =
        await_promise(js_tauri_invoke("storage_choose_base_dir", JsValue::UNDEFINED)).await?;
    from_value(value).map_err(|e| e.to_string())
}

pub async fn tauri_write_binary(filename: &str, bytes: &[u8]) -> Result<bool, String> {
    let ok = await_promise(js_tauri_write_binary(filename, bytes)).await?;
    Ok(ok.as_bool().unwrap_or(false))
}
