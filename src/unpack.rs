//! Record-by-record extraction, with optional attached-archive recursion.
//!
//! Every archive lands in `<prefix>/<archive basename>/`. In attached mode a
//! freshly written file that starts with the marker is itself extracted,
//! with the same resolved prefix, into `<prefix>/<its basename>/`. Nesting
//! stops with [`ArchiveError::NestingTooDeep`] past `max_depth`.
//!
//! Extraction is fail-fast: a bad marker, a destination file that cannot be
//! created, or a malformed record aborts the whole run. Files already
//! written stay on disk.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{ArchiveError, Result};
use crate::format::{sanitize_record_path, DEFAULT_MAX_DEPTH};
use crate::fsutil;
use crate::guard::is_archive;
use crate::io_stream::{RecordReader, DEFAULT_CHUNK_SIZE};

// ── ExtractOptions ────────────────────────────────────────────────────────────

/// Configuration for [`extract`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Recursively extract files that are archives themselves.
    pub attached:   bool,
    pub chunk_size: usize,
    /// Deepest attached-archive level followed; the top-level archive is 0.
    pub max_depth:  usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            attached:   false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_depth:  DEFAULT_MAX_DEPTH,
        }
    }
}

/// Counters returned by [`extract`], summed over nested archives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub files:  u64,
    pub bytes:  u64,
    /// Attached archives that were recursively extracted.
    pub nested: u64,
}

/// Extract `archive` into `destination/<basename of archive>/`.
pub fn extract(archive: &Path, destination: &Path, opts: &ExtractOptions) -> Result<ExtractStats> {
    let prefix = fsutil::resolve_absolute(destination)?;
    let mut stats = ExtractStats::default();
    extract_at_depth(archive, &prefix, opts, 0, &mut stats)?;
    Ok(stats)
}

fn extract_at_depth(
    archive: &Path,
    prefix:  &Path,
    opts:    &ExtractOptions,
    depth:   usize,
    stats:   &mut ExtractStats,
) -> Result<()> {
    if depth > opts.max_depth {
        return Err(ArchiveError::NestingTooDeep(opts.max_depth));
    }

    let file = File::open(archive).map_err(|source| ArchiveError::OpenArchive {
        path: archive.to_owned(),
        source,
    })?;
    let mut reader = RecordReader::with_chunk_size(BufReader::new(file), opts.chunk_size)?;

    let root = prefix.join(fsutil::basename(archive)?);
    fsutil::create_dir_recursive(&root)?;
    log::info!("extracting {:?} into {:?}", archive, root);

    while let Some(header) = reader.next_record()? {
        let target = root.join(sanitize_record_path(&header.path)?);
        fsutil::create_parent_dirs(&target)?;

        let mut out = File::create(&target).map_err(|source| ArchiveError::CreateFile {
            path: target.clone(),
            source,
        })?;
        let written = reader.copy_content(&mut out)?;
        // Closed before probing so the nested pass sees the complete file.
        drop(out);

        log::debug!("extracted {} ({} bytes)", header.display_path(), written);
        stats.files += 1;
        stats.bytes += written;

        if opts.attached && is_archive(&target) {
            log::info!("{:?} is an attached archive", target);
            stats.nested += 1;
            extract_at_depth(&target, prefix, opts, depth + 1, stats)?;
        }
    }

    Ok(())
}
