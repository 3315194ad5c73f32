//! Shared-document storage inside a user-granted folder.
//!
//! Permission is re-evaluated before every operation: the backend queries the handle,
//! requests again when the query is insufficient, and fails the operation when the user
//! refuses. Nothing about a handle's permission is cached between calls.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{
    directory::{
        CapabilityHandleStore, CapabilityState, DirectoryAccess, DirectoryFuture, DirectoryInfo,
        PermissionMode, PermissionState,
    },
    records::{plain_file_name, record_file_name, STORE_DOCUMENT_FILE},
};
use crate::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Layout settings for the granted folder.
pub struct SandboxConfig {
    /// File name of the shared all-keys document.
    pub document_name: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            document_name: STORE_DOCUMENT_FILE.to_string(),
        }
    }
}

/// Sandboxed directory backend over host directory primitives `D` and a handle store `S`.
pub struct SandboxedDirectoryBackend<D, S> {
    access: D,
    handles: S,
    config: SandboxConfig,
}

impl<D, S> SandboxedDirectoryBackend<D, S>
where
    D: DirectoryAccess,
    S: CapabilityHandleStore<Handle = D::Handle>,
{
    /// Creates a backend using the default folder layout.
    pub fn new(access: D, handles: S) -> Self {
        Self::with_config(access, handles, SandboxConfig::default())
    }

    /// Creates a backend with an explicit folder layout.
    pub fn with_config(access: D, handles: S, config: SandboxConfig) -> Self {
        Self {
            access,
            handles,
            config,
        }
    }

    /// Directory primitives in use.
    pub fn access(&self) -> &D {
        &self.access
    }

    /// Handle store in use.
    pub fn handles(&self) -> &S {
        &self.handles
    }

    /// Prompts for a folder, verifies read/write access and persists the handle.
    ///
    /// Resolves to `None` when the host lacks directory primitives, the user cancels,
    /// permission is refused, or the handle cannot be persisted.
    pub async fn choose_directory(&self) -> Option<D::Handle> {
        match self.try_choose_directory().await {
            Ok(handle) => handle,
            Err(err) => {
                debug!(error = %err, "directory selection did not produce a usable capability");
                None
            }
        }
    }

    async fn try_choose_directory(&self) -> Result<Option<D::Handle>, StorageError> {
        self.ensure_supported()?;
        let Some(handle) = self.access.pick_directory().await? else {
            return Ok(None);
        };
        self.ensure_permission(&handle, PermissionMode::ReadWrite)
            .await?;
        self.handles.save_handle(&handle).await?;
        debug!(folder = %self.access.handle_name(&handle), "directory capability granted");
        Ok(Some(handle))
    }

    /// Loads the shared document, `{}` when it is empty or newly created.
    ///
    /// Resolves to `None` on any failure, including missing capability, refused permission
    /// and unparseable content.
    pub async fn read_shared_document(&self, handle: Option<&D::Handle>) -> Option<Map<String, Value>> {
        match self.try_read_shared_document(handle).await {
            Ok(document) => Some(document),
            Err(err) => {
                debug!(error = %err, "shared document read failed");
                None
            }
        }
    }

    /// Serializes `document` and overwrites the shared document.
    pub async fn write_shared_document(
        &self,
        handle: Option<&D::Handle>,
        document: &Map<String, Value>,
    ) -> bool {
        match self.try_write_shared_document(handle, document).await {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "shared document write failed");
                false
            }
        }
    }

    /// Reads the shared document, sets `key`, and writes it back.
    ///
    /// Not transactional: a concurrent writer in another context can lose an update.
    /// An unparseable document is replaced by a fresh one holding only `key`.
    pub async fn merge_and_write(&self, key: &str, value: &Value) -> bool {
        match self.try_merge_and_write(key, value).await {
            Ok(()) => true,
            Err(err) => {
                debug!(key, error = %err, "mirrored write skipped");
                false
            }
        }
    }

    async fn try_merge_and_write(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let handle = self.resolve_handle(None).await?;
        let mut document = match self.try_read_shared_document(Some(&handle)).await {
            Ok(document) => document,
            Err(err @ StorageError::Parse { .. }) => {
                warn!(error = %err, "replacing unreadable shared document");
                Map::new()
            }
            Err(err) => return Err(err),
        };
        document.insert(key.to_string(), value.clone());
        self.try_write_shared_document(Some(&handle), &document)
            .await
    }

    /// Overwrites `filename` inside the granted folder. Blank names map to the mirror file.
    pub async fn write_binary(&self, filename: &str, bytes: &[u8]) -> bool {
        match self.try_write_binary(filename, bytes).await {
            Ok(()) => true,
            Err(err) => {
                debug!(filename, error = %err, "binary write to granted folder failed");
                false
            }
        }
    }

    async fn try_write_binary(&self, filename: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let name = plain_file_name(filename)?;
        self.ensure_supported()?;
        let handle = self.resolve_handle(None).await?;
        self.ensure_permission(&handle, PermissionMode::ReadWrite)
            .await?;
        self.access.write_file(&handle, name, bytes).await
    }

    /// Reads the per-key document `<key>.json`, falling back to the shared document.
    pub async fn read_key(&self, key: &str) -> Option<Value> {
        match self.try_read_key(key).await {
            Ok(value) => value,
            Err(err) => {
                debug!(key, error = %err, "per-key read from granted folder failed");
                None
            }
        }
    }

    async fn try_read_key(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let file_name = record_file_name(key)?;
        self.ensure_supported()?;
        let handle = self.resolve_handle(None).await?;
        self.ensure_permission(&handle, PermissionMode::Read).await?;
        if let Some(bytes) = self.access.read_file(&handle, &file_name, false).await? {
            if !is_blank(&bytes) {
                return serde_json::from_slice(&bytes)
                    .map(Some)
                    .map_err(|err| StorageError::parse(file_name, err));
            }
        }
        let mut document = self.try_read_shared_document(Some(&handle)).await?;
        Ok(document.remove(key))
    }

    /// Writes `value` as the per-key document `<key>.json`.
    pub async fn write_key(&self, key: &str, value: &Value) -> bool {
        match self.try_write_key(key, value).await {
            Ok(()) => true,
            Err(err) => {
                debug!(key, error = %err, "per-key write to granted folder failed");
                false
            }
        }
    }

    async fn try_write_key(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let file_name = record_file_name(key)?;
        self.ensure_supported()?;
        let handle = self.resolve_handle(None).await?;
        self.ensure_permission(&handle, PermissionMode::ReadWrite)
            .await?;
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|err| StorageError::Serialize(err.to_string()))?;
        self.access.write_file(&handle, &file_name, &bytes).await
    }

    /// Observes the capability for `mode` without prompting.
    pub async fn capability_state(&self, mode: PermissionMode) -> CapabilityState {
        if !self.access.is_supported() {
            return CapabilityState::Unconfigured;
        }
        let handle = match self.handles.load_handle().await {
            Ok(Some(handle)) => handle,
            Ok(None) => return CapabilityState::Unconfigured,
            Err(err) => {
                debug!(error = %err, "capability handle lookup failed");
                return CapabilityState::Unconfigured;
            }
        };
        let permission = self
            .access
            .query_permission(&handle, mode)
            .await
            .unwrap_or_else(|err| {
                debug!(error = %err, "permission query failed");
                PermissionState::Unknown
            });
        CapabilityState::Configured {
            name: self.access.handle_name(&handle),
            permission,
        }
    }

    /// Label of the granted folder, unless access to it has been denied.
    pub async fn directory_info(&self) -> Option<DirectoryInfo> {
        match self.capability_state(PermissionMode::Read).await {
            CapabilityState::Configured { name, permission } if permission != PermissionState::Denied => {
                Some(DirectoryInfo { name })
            }
            _ => None,
        }
    }

    /// Forgets the persisted folder capability.
    pub async fn forget_directory(&self) -> bool {
        match self.handles.clear_handle().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to clear directory capability");
                false
            }
        }
    }

    async fn try_read_shared_document(
        &self,
        handle: Option<&D::Handle>,
    ) -> Result<Map<String, Value>, StorageError> {
        self.ensure_supported()?;
        let handle = self.resolve_handle(handle).await?;
        self.ensure_permission(&handle, PermissionMode::Read).await?;
        let bytes = self
            .access
            .read_file(&handle, &self.config.document_name, true)
            .await?
            .unwrap_or_default();
        parse_document(&self.config.document_name, &bytes)
    }

    async fn try_write_shared_document(
        &self,
        handle: Option<&D::Handle>,
        document: &Map<String, Value>,
    ) -> Result<(), StorageError> {
        self.ensure_supported()?;
        let handle = self.resolve_handle(handle).await?;
        self.ensure_permission(&handle, PermissionMode::ReadWrite)
            .await?;
        let bytes = serde_json::to_vec(document)
            .map_err(|err| StorageError::Serialize(err.to_string()))?;
        self.access
            .write_file(&handle, &self.config.document_name, &bytes)
            .await
    }

    fn ensure_supported(&self) -> Result<(), StorageError> {
        if self.access.is_supported() {
            Ok(())
        } else {
            Err(StorageError::Unsupported("directory access"))
        }
    }

    async fn resolve_handle(&self, handle: Option<&D::Handle>) -> Result<D::Handle, StorageError> {
        if let Some(handle) = handle {
            return Ok(handle.clone());
        }
        self.handles
            .load_handle()
            .await?
            .ok_or(StorageError::NoCapability)
    }

    async fn ensure_permission(
        &self,
        handle: &D::Handle,
        mode: PermissionMode,
    ) -> Result<(), StorageError> {
        if self.access.query_permission(handle, mode).await?.allows(mode) {
            return Ok(());
        }
        if self
            .access
            .request_permission(handle, mode)
            .await?
            .allows(mode)
        {
            return Ok(());
        }
        Err(StorageError::PermissionDenied { mode })
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn parse_document(name: &str, bytes: &[u8]) -> Result<Map<String, Value>, StorageError> {
    if is_blank(bytes) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(bytes) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(StorageError::parse(name, "expected a JSON object")),
        Err(err) => Err(StorageError::parse(name, err)),
    }
}

/// Object-safe view of a sandboxed backend, used where the handle type is erased.
pub trait SharedDocumentBackend {
    /// Probes whether the host exposes directory-grant primitives.
    fn is_supported(&self) -> bool;

    /// Returns `true` when a folder capability has been persisted.
    fn has_capability<'a>(&'a self) -> DirectoryFuture<'a, bool>;

    /// Runs the folder-selection flow; `true` when a usable capability was obtained.
    fn choose_directory<'a>(&'a self) -> DirectoryFuture<'a, bool>;

    /// Label of the granted folder.
    fn directory_info<'a>(&'a self) -> DirectoryFuture<'a, Option<DirectoryInfo>>;

    /// Merges one key into the shared document.
    fn merge_and_write<'a>(&'a self, key: &'a str, value: &'a Value) -> DirectoryFuture<'a, bool>;

    /// Overwrites a binary file inside the granted folder.
    fn write_binary<'a>(&'a self, filename: &'a str, bytes: &'a [u8]) -> DirectoryFuture<'a, bool>;
}

impl<D, S> SharedDocumentBackend for SandboxedDirectoryBackend<D, S>
where
    D: DirectoryAccess,
    S: CapabilityHandleStore<Handle = D::Handle>,
{
    fn is_supported(&self) -> bool {
        self.access.is_supported()
    }

    fn has_capability<'a>(&'a self) -> DirectoryFuture<'a, bool> {
        Box::pin(async move {
            self.access.is_supported() && matches!(self.handles.load_handle().await, Ok(Some(_)))
        })
    }

    fn choose_directory<'a>(&'a self) -> DirectoryFuture<'a, bool> {
        Box::pin(async move { SandboxedDirectoryBackend::choose_directory(self).await.is_some() })
    }

    fn directory_info<'a>(&'a self) -> DirectoryFuture<'a, Option<DirectoryInfo>> {
        Box::pin(SandboxedDirectoryBackend::directory_info(self))
    }

    fn merge_and_write<'a>(&'a self, key: &'a str, value: &'a Value) -> DirectoryFuture<'a, bool> {
        Box::pin(SandboxedDirectoryBackend::merge_and_write(self, key, value))
    }

    fn write_binary<'a>(&'a self, filename: &'a str, bytes: &'a [u8]) -> DirectoryFuture<'a, bool> {
        Box::pin(SandboxedDirectoryBackend::write_binary(self, filename, bytes))
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Shared-document backend for hosts without directory grants.
pub struct NoopSharedDocumentBackend;

impl SharedDocumentBackend for NoopSharedDocumentBackend {
    fn is_supported(&self) -> bool {
        false
    }

    fn has_capability<'a>(&'a self) -> DirectoryFuture<'a, bool> {
        Box::pin(async { false })
    }

    fn choose_directory<'a>(&'a self) -> DirectoryFuture<'a, bool> {
        Box::pin(async { false })
    }

    fn directory_info<'a>(&'a self) -> DirectoryFuture<'a, Option<DirectoryInfo>> {
        Box::pin(async { None })
    }

    fn merge_and_write<'a>(&'a self, _key: &'a str, _value: &'a Value) -> DirectoryFuture<'a, bool> {
        Box::pin(async { false })
    }

    fn write_binary<'a>(&'a self, _filename: &'a str, _bytes: &'a [u8]) -> DirectoryFuture<'a, bool> {
        Box::pin(async { false })
    }
}
