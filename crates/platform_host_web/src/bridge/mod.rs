//! Browser capability bridge implementations for `platform_host_web` service adapters.
//!
//! This module is organized by host domain (`directory`, `host`) on top of a shared
//! wasm/non-wasm `interop` layer, and maps JS failures onto [`platform_host::StorageError`].

pub(crate) mod directory;
pub(crate) mod host;
mod interop;

use platform_host::StorageError;

fn host_error(message: String) -> StorageError {
    StorageError::Host(message)
}
