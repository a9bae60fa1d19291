//! Crash-safe file replacement
//!
//! Every persisted file is produced with write-fsync-rename: the payload is
//! streamed to `<name>.tmp`, fsynced, renamed over the target, and the parent
//! directory is fsynced so the rename itself is durable. A crash at any point
//! leaves either the previous file or the new one, never a torn file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use xmodal_core::{XmodalError, XmodalResult};

/// Temp path used while `path` is being replaced
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Atomically replace `path` with whatever `write` produces
///
/// The temp file is removed if `write` fails.
pub fn write_atomic<F>(path: &Path, write: F) -> XmodalResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| {
                XmodalError::storage(format!("failed to create {}", dir.display()), e)
            })?;
        }
    }

    let tmp = temp_path(path);
    let result = write_and_sync(&tmp, write);
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(XmodalError::storage(
            format!("failed to write {}", tmp.display()),
            e,
        ));
    }

    fs::rename(&tmp, path).map_err(|e| {
        XmodalError::storage(
            format!("failed to rename {} to {}", tmp.display(), path.display()),
            e,
        )
    })?;

    sync_parent_dir(path)
}

fn write_and_sync<F>(tmp: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

/// Fsync the directory containing `path`
///
/// Directory handles cannot be opened for sync on Windows; there the rename
/// is already durable once it returns.
pub fn sync_parent_dir(path: &Path) -> XmodalResult<()> {
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent() {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            let dir = File::open(parent).map_err(|e| {
                XmodalError::storage(format!("failed to open {}", parent.display()), e)
            })?;
            dir.sync_all().map_err(|e| {
                XmodalError::storage(format!("failed to sync {}", parent.display()), e)
            })?;
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Remove a file, treating "already gone" as success
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &Path) -> XmodalResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(XmodalError::storage(
            format!("failed to remove {}", path.display()),
            e,
        )),
    }
}
