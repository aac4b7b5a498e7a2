//! Low-level file transfer helpers shared by the operations.
//!
//! None of these overwrite an existing destination.

use crate::error::{OperationError, OperationResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `folder/<file name of source>`
pub(crate) fn destination_for(source: &Path, folder: &Path) -> OperationResult<PathBuf> {
    let name = source.file_name().ok_or_else(|| OperationError::NotFound {
        path: source.to_path_buf(),
    })?;
    Ok(folder.join(name))
}

/// Create `dir` and any missing parents, returning the folders created
/// here, deepest first.
pub(crate) fn ensure_dir(dir: &Path) -> OperationResult<Vec<PathBuf>> {
    let missing: Vec<PathBuf> = dir
        .ancestors()
        .take_while(|a| !a.as_os_str().is_empty() && !a.is_dir())
        .map(Path::to_path_buf)
        .collect();
    if missing.is_empty() {
        return Ok(missing);
    }

    if let Err(source) = fs::create_dir_all(dir) {
        remove_created(&missing);
        return Err(OperationError::Io {
            path: dir.to_path_buf(),
            source,
        });
    }
    Ok(missing)
}

/// Run `f` with `dir` in place. Folders created for it are removed again
/// if `f` fails.
pub(crate) fn within_dir<T>(
    dir: &Path,
    f: impl FnOnce() -> OperationResult<T>,
) -> OperationResult<T> {
    let created = ensure_dir(dir)?;
    let result = f();
    if result.is_err() {
        remove_created(&created);
    }
    result
}

fn remove_created(dirs: &[PathBuf]) {
    for dir in dirs {
        if let Err(e) = fs::remove_dir(dir) {
            if e.kind() != io::ErrorKind::NotFound {
                debug!(?dir, error = %e, "left created folder in place");
                return;
            }
        }
    }
}

/// Copy bytes, failing with `AlreadyExists` if `dest` is taken.
///
/// A partially written destination is removed before returning an error.
pub(crate) fn copy_no_clobber(source: &Path, dest: &Path) -> OperationResult<u64> {
    let mut input = File::open(source).map_err(|e| OperationError::from_io(source, e))?;
    let mut output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| OperationError::from_io(dest, e))?;

    let result = io::copy(&mut input, &mut output).and_then(|bytes| {
        output.sync_all()?;
        if let Ok(meta) = input.metadata() {
            output.set_permissions(meta.permissions())?;
        }
        Ok(bytes)
    });

    match result {
        Ok(bytes) => Ok(bytes),
        Err(source) => {
            drop(output);
            discard_partial(dest);
            Err(OperationError::Io {
                path: dest.to_path_buf(),
                source,
            })
        }
    }
}

/// Move `source` to `dest` without overwriting.
///
/// Tries an atomic rename first; across filesystems falls back to
/// copy, size verification, then deleting the source.
pub(crate) fn move_no_clobber(source: &Path, dest: &Path) -> OperationResult<()> {
    if fs::symlink_metadata(source).is_err() {
        return Err(OperationError::NotFound {
            path: source.to_path_buf(),
        });
    }
    if fs::symlink_metadata(dest).is_ok() {
        return Err(OperationError::AlreadyExists {
            path: dest.to_path_buf(),
        });
    }

    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(OperationError::NotFound {
            path: source.to_path_buf(),
        }),
        Err(e) => {
            debug!(?source, ?dest, error = %e, "rename failed, copying instead");
            copy_then_remove(source, dest)
        }
    }
}

fn copy_then_remove(source: &Path, dest: &Path) -> OperationResult<()> {
    let source_size = fs::metadata(source)
        .map_err(|e| OperationError::from_io(source, e))?
        .len();
    copy_no_clobber(source, dest)?;

    // Verify destination size matches source before deleting
    let dest_size = fs::metadata(dest).map(|m| m.len()).unwrap_or(u64::MAX);
    if dest_size != source_size {
        discard_partial(dest);
        return Err(OperationError::Io {
            path: dest.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "Copy verification failed: source {} bytes, dest {} bytes",
                    source_size, dest_size
                ),
            ),
        });
    }

    if let Err(e) = fs::remove_file(source) {
        discard_partial(dest);
        return Err(OperationError::from_io(source, e));
    }
    Ok(())
}

/// Write `bytes` to a path that must not exist yet, creating parents.
pub(crate) fn write_no_clobber(path: &Path, bytes: &[u8]) -> OperationResult<()> {
    match path.parent() {
        Some(parent) => within_dir(parent, || write_new(path, bytes)),
        None => write_new(path, bytes),
    }
}

fn write_new(path: &Path, bytes: &[u8]) -> OperationResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| OperationError::from_io(path, e))?;

    if let Err(source) = file.write_all(bytes).and_then(|_| file.sync_all()) {
        drop(file);
        discard_partial(path);
        return Err(OperationError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub(crate) fn remove_if_present(path: &Path) -> OperationResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(OperationError::from_io(path, e)),
    }
}

fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(?path, error = %e, "could not remove partial file");
        }
    }
}
