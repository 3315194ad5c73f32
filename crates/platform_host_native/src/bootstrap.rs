//! Default base-directory discovery for first launch.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use platform_host::StorageError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "CMS_DATA_DIR";
/// Marker file written into a freshly initialized data directory.
pub const INIT_MARKER_FILE: &str = ".cms-init.json";

const APP_NAME: &str = "CMS";
const DEFAULT_DIR_NAME: &str = "CMS-Data";
const WRITE_PROBE_FILE: &str = ".write-test";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Contents of [`INIT_MARKER_FILE`].
pub struct InitMarker {
    /// Application label.
    pub app: String,
    /// Application version that created the directory.
    pub version: String,
    /// Creation time in Unix milliseconds.
    pub created_at_unix_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Candidate directory that failed the write probe.
pub struct RejectedCandidate {
    /// Candidate path.
    pub dir: PathBuf,
    /// Failure message.
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of [`bootstrap_data_dir`].
pub struct BootstrapOutcome {
    /// Selected data directory.
    pub data_dir: PathBuf,
    /// `true` when the directory had no init marker yet.
    pub first_run: bool,
    /// Candidates tried before `data_dir` that were not writable.
    pub rejected: Vec<RejectedCandidate>,
}

/// Candidate data directories in preference order.
///
/// `override_dir` (normally [`DATA_DIR_ENV`]) comes first, then `Documents/CMS-Data`, the
/// platform data directory, `Desktop/CMS-Data`, and finally the temp directory.
pub fn default_candidates(override_dir: Option<PathBuf>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    candidates.extend(override_dir.filter(|dir| !dir.as_os_str().is_empty()));
    candidates.extend(dirs::document_dir().map(|dir| dir.join(DEFAULT_DIR_NAME)));
    candidates.extend(dirs::data_local_dir().map(|dir| dir.join(APP_NAME).join(DEFAULT_DIR_NAME)));
    candidates.extend(dirs::desktop_dir().map(|dir| dir.join(DEFAULT_DIR_NAME)));
    candidates.push(env::temp_dir().join(APP_NAME).join(DEFAULT_DIR_NAME));
    candidates
}

/// Picks the first writable candidate, recording the ones that were skipped.
///
/// # Errors
///
/// Returns the last probe failure when no candidate is writable.
pub fn select_writable(
    candidates: impl IntoIterator<Item = PathBuf>,
) -> Result<(PathBuf, Vec<RejectedCandidate>), StorageError> {
    let mut rejected = Vec::new();
    let mut last_error = None;
    for dir in candidates {
        match probe_writable(&dir) {
            Ok(()) => return Ok((dir, rejected)),
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "data directory candidate rejected");
                rejected.push(RejectedCandidate {
                    dir,
                    reason: err.to_string(),
                });
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or(StorageError::Unavailable {
        backend: "data directory",
    }))
}

/// Resolves the data directory from the environment and platform defaults and initializes it.
///
/// # Errors
///
/// Returns an error when no candidate is writable or the init marker cannot be written.
pub fn bootstrap_data_dir(version: &str) -> Result<BootstrapOutcome, StorageError> {
    let override_dir = env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    bootstrap_from_candidates(default_candidates(override_dir), version)
}

/// Same as [`bootstrap_data_dir`] over an explicit candidate list.
///
/// # Errors
///
/// Returns an error when no candidate is writable or the init marker cannot be written.
pub fn bootstrap_from_candidates(
    candidates: impl IntoIterator<Item = PathBuf>,
    version: &str,
) -> Result<BootstrapOutcome, StorageError> {
    let (data_dir, rejected) = select_writable(candidates)?;
    let marker_path = data_dir.join(INIT_MARKER_FILE);
    let first_run = !marker_path.exists();
    if first_run {
        let marker = InitMarker {
            app: APP_NAME.to_string(),
            version: version.to_string(),
            created_at_unix_ms: unix_time_ms_now(),
        };
        let serialized = serde_json::to_string_pretty(&marker)
            .map_err(|err| StorageError::Serialize(err.to_string()))?;
        fs::write(&marker_path, serialized)
            .map_err(|source| StorageError::io(&marker_path, source))?;
        info!(dir = %data_dir.display(), "initialized data directory");
    }
    Ok(BootstrapOutcome {
        data_dir,
        first_run,
        rejected,
    })
}

fn probe_writable(dir: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|source| StorageError::io(dir, source))?;
    let probe = dir.join(WRITE_PROBE_FILE);
    let written = fs::write(&probe, b"ok");
    let _ = fs::remove_file(&probe);
    written.map_err(|source| StorageError::io(probe, source))
}

fn unix_time_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_comes_first_and_temp_last() {
        let candidates = default_candidates(Some(PathBuf::from("/custom")));
        assert_eq!(candidates.first(), Some(&PathBuf::from("/custom")));
        assert_eq!(
            candidates.last(),
            Some(&env::temp_dir().join("CMS").join("CMS-Data"))
        );
        assert!(!default_candidates(Some(PathBuf::new()))
            .contains(&PathBuf::new()));
    }

    #[test]
    fn unwritable_candidates_are_skipped() {
        let root = tempfile::tempdir().expect("tempdir");
        let blocker = root.path().join("file");
        fs::write(&blocker, b"not a dir").expect("seed");
        let good = root.path().join("data");

        let (dir, rejected) =
            select_writable([blocker.join("nested"), good.clone()]).expect("select");
        assert_eq!(dir, good);
        assert_eq!(rejected.len(), 1);
        assert!(!good.join(WRITE_PROBE_FILE).exists());
    }

    #[test]
    fn no_writable_candidate_is_an_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let blocker = root.path().join("file");
        fs::write(&blocker, b"x").expect("seed");
        assert!(select_writable([blocker.join("a")]).is_err());
        assert!(select_writable(Vec::new()).is_err());
    }

    #[test]
    fn first_run_writes_marker_once() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("data");

        let first = bootstrap_from_candidates([dir.clone()], "1.2.0").expect("bootstrap");
        assert!(first.first_run);
        let marker: InitMarker = serde_json::from_str(
            &fs::read_to_string(dir.join(INIT_MARKER_FILE)).expect("marker"),
        )
        .expect("parse marker");
        assert_eq!(marker.version, "1.2.0");

        let second = bootstrap_from_candidates([dir.clone()], "1.3.0").expect("bootstrap");
        assert!(!second.first_run);
        assert_eq!(second.data_dir, dir);
    }
}
