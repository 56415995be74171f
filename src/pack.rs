//! Directory walker that feeds a [`RecordWriter`].
//!
//! Only regular files produce records; directories are implied by the `/`
//! separators in each record path. Symlinks are never followed and, like
//! sockets, fifos and device nodes, are skipped without complaint.
//!
//! Entries are visited depth-first and sorted by file name inside each
//! directory, so packing an unchanged tree twice yields identical bytes.
//!
//! # Errors
//! Failing to open the root is fatal. Below the root, an entry that cannot be
//! listed, stat'ed or opened is logged and skipped. Once a record header has
//! been written, any I/O error is fatal because the stream can no longer be
//! framed correctly.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{ArchiveError, Result};
use crate::format::{record_path, DEFAULT_MAX_WALK_DEPTH, MARKER};
use crate::io_stream::{RecordWriter, DEFAULT_CHUNK_SIZE};

// ── PackOptions ───────────────────────────────────────────────────────────────

/// Configuration for [`pack_directory`].
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Copy buffer size in bytes.
    pub chunk_size:     usize,
    /// Directories deeper than this below the root are not descended into.
    pub max_walk_depth: usize,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            chunk_size:     DEFAULT_CHUNK_SIZE,
            max_walk_depth: DEFAULT_MAX_WALK_DEPTH,
        }
    }
}

/// Counters returned by [`pack_directory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackStats {
    pub files:   u64,
    pub bytes:   u64,
    pub skipped: u64,
}

pub fn write_marker<W: Write>(mut writer: W) -> Result<()> {
    writer.write_all(MARKER)?;
    Ok(())
}

/// Append one record per regular file below `root` to `writer`, which must
/// already hold the marker.
pub fn pack_directory<W: Write>(root: &Path, writer: W, opts: &PackOptions) -> Result<PackStats> {
    if !std::fs::metadata(root)?.is_dir() {
        return Err(ArchiveError::SourceNotDirectory(root.to_owned()));
    }
    // Surface an unreadable root as an error instead of an empty archive.
    std::fs::read_dir(root)?;

    let mut out = RecordWriter::with_chunk_size(writer, opts.chunk_size);
    let mut skipped = 0u64;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(opts.max_walk_depth)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let msg = err.to_string();
                return Err(err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, msg))
                    .into());
            }
            Err(err) => {
                log::warn!("skipping {}", err);
                skipped += 1;
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            if entry.depth() == opts.max_walk_depth {
                log::warn!("not descending into {:?}: too deep", entry.path());
            }
            continue;
        }
        if !file_type.is_file() {
            log::debug!("skipping non-regular file {:?}", entry.path());
            continue;
        }

        let rel = match record_path(root, entry.path()) {
            Ok(rel) => rel,
            Err(err) => {
                log::warn!("skipping {:?}: {}", entry.path(), err);
                skipped += 1;
                continue;
            }
        };

        let (file, size) = match open_regular(entry.path()) {
            Ok(opened) => opened,
            Err(err) => {
                log::warn!("failed to open file {:?}: {}", entry.path(), err);
                skipped += 1;
                continue;
            }
        };

        log::debug!("packing {} ({} bytes)", String::from_utf8_lossy(&rel), size);
        out.add_file(&rel, size, file)?;
    }

    let stats = PackStats { files: out.records, bytes: out.bytes, skipped };
    out.finish()?;
    Ok(stats)
}

fn open_regular(path: &Path) -> std::io::Result<(File, u64)> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    Ok((file, size))
}
