//! Temp-file-plus-rename replacement of files inside the base directory.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use platform_host::StorageError;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replaces `dir/file_name` with `bytes`.
///
/// The target is only ever touched by the final rename, so an interruption at any earlier
/// point leaves the previous file intact and at worst an orphaned temp file behind.
pub(crate) fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
    let target = dir.join(file_name);
    let tmp_path = stage_temp(dir, file_name, bytes)?;
    if let Err(source) = rename_overwrite(&tmp_path, &target) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StorageError::io(target, source));
    }
    sync_dir(dir)?;
    Ok(target)
}

/// Flushes the directory entry so the rename survives a power loss.
fn sync_dir(dir: &Path) -> Result<(), StorageError> {
    #[cfg(unix)]
    {
        let handle = fs::File::open(dir).map_err(|source| StorageError::io(dir, source))?;
        handle
            .sync_all()
            .map_err(|source| StorageError::io(dir, source))?;
    }
    #[cfg(not(unix))]
    let _ = dir;
    Ok(())
}

/// Writes and syncs `bytes` to a fresh temp file next to `file_name`.
pub(crate) fn stage_temp(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
    let tmp_path = dir.join(temp_file_name(file_name));
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StorageError::io(&tmp_path, source))?;

    let written = file.write_all(bytes).and_then(|()| file.sync_all());
    drop(file);
    if let Err(source) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(StorageError::io(tmp_path, source));
    }
    Ok(tmp_path)
}

/// Returns `true` for names produced by [`stage_temp`].
pub(crate) fn is_temp_file_name(name: &str) -> bool {
    name.starts_with('.') && name.contains(".tmp.")
}

fn temp_file_name(file_name: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(".{file_name}.tmp.{}.{nanos}.{seq}", std::process::id())
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| is_temp_file_name(name))
            .collect()
    }

    #[test]
    fn replaces_target_and_leaves_no_temp() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("latest.xlsx"), b"old").expect("seed");

        let target = write_atomic(dir.path(), "latest.xlsx", b"new").expect("write");
        assert_eq!(fs::read(target).expect("read"), b"new");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn replace_inside_nested_directory_is_durable_and_readable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("CMS-Data");
        fs::create_dir(&nested).expect("nested");

        write_atomic(&nested, "latest.xlsx", b"first").expect("first write");
        let target = write_atomic(&nested, "latest.xlsx", b"second").expect("second write");

        assert_eq!(fs::read(target).expect("read"), b"second");
        assert!(sync_dir(&nested).is_ok());
        assert!(temp_files(&nested).is_empty());
    }

    #[test]
    fn interrupted_before_rename_keeps_previous_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("latest.xlsx"), b"old").expect("seed");

        let orphan = stage_temp(dir.path(), "latest.xlsx", b"half-done").expect("stage");
        assert!(orphan.exists());
        assert_eq!(
            fs::read(dir.path().join("latest.xlsx")).expect("read"),
            b"old"
        );
        assert_eq!(temp_files(dir.path()).len(), 1);
    }

    #[test]
    fn failed_rename_cleans_up_temp() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("occupied")).expect("dir");
        fs::write(dir.path().join("occupied").join("keep"), b"x").expect("seed");

        assert!(write_atomic(dir.path(), "occupied", b"bytes").is_err());
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn temp_names_are_unique() {
        assert_ne!(temp_file_name("a.xlsx"), temp_file_name("a.xlsx"));
        assert!(is_temp_file_name(&temp_file_name("a.xlsx")));
        assert!(!is_temp_file_name("a.json"));
    }
}
