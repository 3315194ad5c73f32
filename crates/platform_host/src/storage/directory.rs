//! Directory capability model: permission states and the host primitives behind a
//! user-granted folder.

use std::{fmt, future::Future, pin::Pin};

use serde::{Deserialize, Serialize};

use crate::StorageError;

/// Object-safe boxed future used by directory contracts.
pub type DirectoryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Access mode requested on a directory capability.
pub enum PermissionMode {
    /// Read-only access.
    Read,
    /// Read/write access.
    #[serde(rename = "readwrite")]
    ReadWrite,
}

impl PermissionMode {
    /// Returns `true` when a grant of `self` is sufficient for `requested`.
    pub const fn covers(self, requested: PermissionMode) -> bool {
        matches!(
            (self, requested),
            (Self::ReadWrite, _) | (Self::Read, Self::Read)
        )
    }

    /// Host-facing token (`read` / `readwrite`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::ReadWrite => "readwrite",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "state", content = "mode")]
/// Queryable permission state of a capability handle.
pub enum PermissionState {
    /// The host will prompt before granting.
    Unknown,
    /// Access is granted in the given mode.
    Granted(PermissionMode),
    /// Access is denied.
    Denied,
}

impl PermissionState {
    /// Maps a host permission token (`granted`, `denied`, `prompt`) for a query in `mode`.
    pub fn from_host_token(token: &str, mode: PermissionMode) -> Self {
        match token {
            "granted" => Self::Granted(mode),
            "denied" => Self::Denied,
            _ => Self::Unknown,
        }
    }

    /// Returns `true` when this state is enough for `mode`.
    pub const fn allows(self, mode: PermissionMode) -> bool {
        match self {
            Self::Granted(granted) => granted.covers(mode),
            Self::Unknown | Self::Denied => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Human-readable description of the granted folder.
pub struct DirectoryInfo {
    /// Folder name as reported by the host.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Capability state observed for one operation. Never cached across operations.
pub enum CapabilityState {
    /// No folder has been granted (or the host has no directory primitives).
    Unconfigured,
    /// A folder handle exists; `permission` is the freshly queried state.
    Configured {
        /// Folder label.
        name: String,
        /// Permission state at query time.
        permission: PermissionState,
    },
}

/// Host primitives for a user-granted folder (File System Access API in browsers).
pub trait DirectoryAccess {
    /// Opaque folder capability handle.
    type Handle: Clone + 'static;

    /// Probes whether directory-grant primitives exist in this host.
    fn is_supported(&self) -> bool;

    /// Prompts the user to pick a folder. Resolves to `None` when the user cancels.
    fn pick_directory<'a>(
        &'a self,
    ) -> DirectoryFuture<'a, Result<Option<Self::Handle>, StorageError>>;

    /// Returns the folder label for `handle`.
    fn handle_name(&self, handle: &Self::Handle) -> String;

    /// Queries the current permission state without prompting.
    fn query_permission<'a>(
        &'a self,
        handle: &'a Self::Handle,
        mode: PermissionMode,
    ) -> DirectoryFuture<'a, Result<PermissionState, StorageError>>;

    /// Requests permission, possibly prompting the user.
    fn request_permission<'a>(
        &'a self,
        handle: &'a Self::Handle,
        mode: PermissionMode,
    ) -> DirectoryFuture<'a, Result<PermissionState, StorageError>>;

    /// Reads a file inside the folder.
    ///
    /// With `create`, an absent file is created empty and read back as empty bytes; without
    /// it, an absent file resolves to `None`.
    fn read_file<'a>(
        &'a self,
        handle: &'a Self::Handle,
        name: &'a str,
        create: bool,
    ) -> DirectoryFuture<'a, Result<Option<Vec<u8>>, StorageError>>;

    /// Replaces the contents of a file inside the folder, creating it when absent.
    fn write_file<'a>(
        &'a self,
        handle: &'a Self::Handle,
        name: &'a str,
        bytes: &'a [u8],
    ) -> DirectoryFuture<'a, Result<(), StorageError>>;
}

/// Persists the granted folder capability across sessions.
pub trait CapabilityHandleStore {
    /// Handle type persisted by this store.
    type Handle;

    /// Loads the previously granted handle.
    fn load_handle<'a>(&'a self) -> DirectoryFuture<'a, Result<Option<Self::Handle>, StorageError>>;

    /// Persists `handle`, replacing any previous one.
    fn save_handle<'a>(
        &'a self,
        handle: &'a Self::Handle,
    ) -> DirectoryFuture<'a, Result<(), StorageError>>;

    /// Forgets the persisted handle.
    fn clear_handle<'a>(&'a self) -> DirectoryFuture<'a, Result<(), StorageError>>;
}
