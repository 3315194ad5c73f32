//! Typed storage errors shared by every backend.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::directory::PermissionMode;

/// Failure raised inside a storage backend before it is absorbed at the public boundary.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend is not reachable from the current host (no privileged process, no storage).
    #[error("{backend} backend is unavailable in this host")]
    Unavailable {
        /// Stable backend label used in diagnostics.
        backend: &'static str,
    },
    /// The host lacks the primitives required by the operation.
    #[error("{0} is not supported in this host")]
    Unsupported(&'static str),
    /// The user or host refused the requested directory permission.
    #[error("directory permission `{mode}` was denied")]
    PermissionDenied {
        /// Mode that was requested.
        mode: PermissionMode,
    },
    /// No directory capability has been granted yet.
    #[error("no directory capability has been granted")]
    NoCapability,
    /// The record key cannot be mapped onto a file name.
    #[error("record key `{0}` contains unsupported characters")]
    InvalidKey(String),
    /// The file name is not a plain name inside the storage directory.
    #[error("file name `{0}` is not a plain file name")]
    InvalidFileName(String),
    /// Filesystem failure at `path`.
    #[error("i/o failure at {}: {source}", path.display())]
    Io {
        /// Path the operation touched.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Stored bytes are not a valid document.
    #[error("failed to parse {what}: {message}")]
    Parse {
        /// What was being parsed.
        what: String,
        /// Parser message.
        message: String,
    },
    /// A value could not be serialized to JSON.
    #[error("failed to serialize value: {0}")]
    Serialize(String),
    /// Spreadsheet encoding failed.
    #[error("failed to encode spreadsheet: {0}")]
    Encode(String),
    /// Error reported across the host boundary (JS exception, IPC rejection).
    #[error("host call failed: {0}")]
    Host(String),
}

impl StorageError {
    /// Builds an [`StorageError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a [`StorageError::Parse`] from a serde error.
    pub fn parse(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            what: what.into(),
            message: err.to_string(),
        }
    }

    /// Returns `true` for permission and capability failures.
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::NoCapability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(
            StorageError::PermissionDenied {
                mode: PermissionMode::ReadWrite
            }
            .to_string(),
            "directory permission `readwrite` was denied"
        );
        assert_eq!(
            StorageError::Unavailable { backend: "host" }.to_string(),
            "host backend is unavailable in this host"
        );
        let io = StorageError::io(
            "/tmp/x.json",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        );
        assert_eq!(io.to_string(), "i/o failure at /tmp/x.json: disk full");
    }

    #[test]
    fn permission_classification() {
        assert!(StorageError::NoCapability.is_permission());
        assert!(!StorageError::Host("boom".into()).is_permission());
    }
}
