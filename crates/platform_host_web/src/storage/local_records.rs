//! `localStorage`-backed ephemeral record store.
//!
//! The browser API is synchronous, so this adapter implements the synchronous
//! [`EphemeralStore`] contract directly.

use platform_host::{EphemeralStore, StorageError};

#[derive(Debug, Clone, Copy, Default)]
/// Ephemeral record store backed by `window.localStorage`.
pub struct WebLocalStore;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

impl EphemeralStore for WebLocalStore {
    fn is_available(&self) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage().is_some()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }

    fn load_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = local_storage().ok_or(StorageError::Unavailable {
                backend: "localStorage",
            })?;
            storage
                .get_item(key)
                .map_err(|e| StorageError::Host(format!("localStorage get_item failed: {e:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(None)
        }
    }

    fn save_raw(&self, key: &str, raw_json: &str) -> Result<(), StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = local_storage().ok_or(StorageError::Unavailable {
                backend: "localStorage",
            })?;
            storage
                .set_item(key, raw_json)
                .map_err(|e| StorageError::Host(format!("localStorage set_item failed: {e:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw_json);
            Err(StorageError::Unavailable {
                backend: "localStorage",
            })
        }
    }
}
