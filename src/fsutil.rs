//! Filesystem helpers used around packing and extraction.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Create `path` and every missing ancestor. Existing directories are fine.
pub fn create_dir_recursive(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Create the parent directories of the file at `path`.
pub fn create_parent_dirs(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir_recursive(parent),
        _ => Ok(()),
    }
}

/// Remove `path` with all files and subdirectories, then the directory itself.
///
/// Stops at the first failure; whatever was already deleted stays deleted.
pub fn remove_dir_recursive(path: &Path) -> io::Result<()> {
    std::fs::remove_dir_all(path)
}

/// Absolute form of `path`, with symlinks and `..` resolved when it exists.
pub fn resolve_absolute(path: &Path) -> io::Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(p) => Ok(p),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            // Destination not created yet: anchor it on the current directory.
            Ok(std::env::current_dir()?.join(path))
        }
        Err(e) => Err(e),
    }
}

/// Final component of `path`, used as the directory name an archive
/// extracts into (and the file name a packed directory is written to).
pub fn basename(path: &Path) -> io::Result<OsString> {
    let resolved;
    let path = if path.file_name().is_none() {
        // "." or "dir/.." have no file name of their own.
        resolved = resolve_absolute(path)?;
        resolved.as_path()
    } else {
        path
    };
    path.file_name().map(|n| n.to_owned()).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path has no file name: {}", path.display()),
        )
    })
}
