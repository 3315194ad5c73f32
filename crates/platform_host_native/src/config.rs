//! Process-wide base data directory.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

#[derive(Debug, Clone)]
/// Shared, mutable base data directory.
///
/// Clones share one path. [`BaseDirConfig::replace`] is the only mutation entry point and
/// is reserved for explicit user-initiated directory choices.
pub struct BaseDirConfig {
    inner: Arc<RwLock<PathBuf>>,
}

impl BaseDirConfig {
    /// Creates a config rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(base_dir.into())),
        }
    }

    /// Current base directory.
    pub fn current(&self) -> PathBuf {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Points the config at `base_dir`, returning the previous directory.
    pub fn replace(&self, base_dir: impl AsRef<Path>) -> PathBuf {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, base_dir.as_ref().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_replacement() {
        let config = BaseDirConfig::new("/data/a");
        let shared = config.clone();
        assert_eq!(shared.replace("/data/b"), PathBuf::from("/data/a"));
        assert_eq!(config.current(), PathBuf::from("/data/b"));
    }
}
