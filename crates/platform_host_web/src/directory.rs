//! File System Access API directory primitives.

use platform_host::{
    DirectoryAccess, DirectoryFuture, PermissionMode, PermissionState, StorageError,
};
use wasm_bindgen::JsValue;

#[derive(Debug, Clone)]
/// Wrapper around a browser `FileSystemDirectoryHandle`.
pub struct BrowserDirectoryHandle {
    raw: JsValue,
}

impl BrowserDirectoryHandle {
    pub(crate) fn from_js(raw: JsValue) -> Self {
        Self { raw }
    }

    pub(crate) fn as_js(&self) -> &JsValue {
        &self.raw
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Directory access through `showDirectoryPicker` and handle permission queries.
pub struct BrowserDirectoryAccess;

impl DirectoryAccess for BrowserDirectoryAccess {
    type Handle = BrowserDirectoryHandle;

    fn is_supported(&self) -> bool {
        crate::bridge::directory::supported()
    }

    fn pick_directory<'a>(
        &'a self,
    ) -> DirectoryFuture<'a, Result<Option<BrowserDirectoryHandle>, StorageError>> {
        Box::pin(async move {
            Ok(crate::bridge::directory::pick()
                .await?
                .map(BrowserDirectoryHandle::from_js))
        })
    }

    fn handle_name(&self, handle: &BrowserDirectoryHandle) -> String {
        crate::bridge::directory::handle_name(handle.as_js())
    }

    fn query_permission<'a>(
        &'a self,
        handle: &'a BrowserDirectoryHandle,
        mode: PermissionMode,
    ) -> DirectoryFuture<'a, Result<PermissionState, StorageError>> {
        Box::pin(
            async move { crate::bridge::directory::query_permission(handle.as_js(), mode).await },
        )
    }

    fn request_permission<'a>(
        &'a self,
        handle: &'a BrowserDirectoryHandle,
        mode: PermissionMode,
    ) -> DirectoryFuture<'a, Result<PermissionState, StorageError>> {
        Box::pin(async move {
            crate::bridge::directory::request_permission(handle.as_js(), mode).await
        })
    }

    fn read_file<'a>(
        &'a self,
        handle: &'a BrowserDirectoryHandle,
        name: &'a str,
        create: bool,
    ) -> DirectoryFuture<'a, Result<Option<Vec<u8>>, StorageError>> {
        Box::pin(async move {
            crate::bridge::directory::read_file(handle.as_js(), name, create).await
        })
    }

    fn write_file<'a>(
        &'a self,
        handle: &'a BrowserDirectoryHandle,
        name: &'a str,
        bytes: &'a [u8],
    ) -> DirectoryFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            crate::bridge::directory::write_file(handle.as_js(), name, bytes).await
        })
    }
}
