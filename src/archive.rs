//! High-level archive API — the primary embedding surface.
//!
//! ```no_run
//! use nestpack::archive::{create_archive, extract_archive, list_archive};
//! use nestpack::{ExtractOptions, PackOptions};
//!
//! // Pack ./photos into ./backups/photos
//! let archive = create_archive("photos", "backups", &PackOptions::default())?;
//!
//! // Inspect and unpack into ./restore/photos/...
//! for entry in list_archive(&archive)? {
//!     println!("{} {}", entry.size, entry.display_path());
//! }
//! extract_archive(&archive, "restore", &ExtractOptions::default())?;
//! # Ok::<(), nestpack::ArchiveError>(())
//! ```

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{ArchiveError, Result};
use crate::format::RecordHeader;
use crate::fsutil;
use crate::io_stream::RecordReader;
use crate::pack::{pack_directory, write_marker, PackOptions};
use crate::unpack::{extract, ExtractOptions, ExtractStats};

// ── EntryInfo ─────────────────────────────────────────────────────────────────

/// Lightweight descriptor returned by [`list_archive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Stored path bytes, '/'-separated.
    pub path: Vec<u8>,
    pub size: u64,
}

impl EntryInfo {
    pub fn display_path(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }
}

impl From<RecordHeader> for EntryInfo {
    fn from(h: RecordHeader) -> Self {
        EntryInfo { path: h.path, size: h.size }
    }
}

// ── Pack ──────────────────────────────────────────────────────────────────────

/// Pack `source` into `<dest_dir>/<basename of source>` and return that path.
pub fn create_archive<S, D>(source: S, dest_dir: D, opts: &PackOptions) -> Result<PathBuf>
where
    S: AsRef<Path>,
    D: AsRef<Path>,
{
    let source = source.as_ref();
    if !std::fs::metadata(source)?.is_dir() {
        return Err(ArchiveError::SourceNotDirectory(source.to_owned()));
    }

    fsutil::create_dir_recursive(dest_dir.as_ref())?;
    let dest_dir = fsutil::resolve_absolute(dest_dir.as_ref())?;
    let output = dest_dir.join(fsutil::basename(source)?);

    if output.starts_with(std::fs::canonicalize(source)?) {
        return Err(ArchiveError::OutputInsideSource(output));
    }

    let mut writer = BufWriter::new(File::create(&output)?);
    write_marker(&mut writer)?;
    let stats = pack_directory(source, &mut writer, opts)?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    log::info!(
        "packed {} file(s), {} byte(s) into {:?} ({} skipped)",
        stats.files, stats.bytes, output, stats.skipped,
    );
    Ok(output)
}

// ── Extract ───────────────────────────────────────────────────────────────────

/// Extract `archive` into `<dest>/<basename of archive>/`.
///
/// With `opts.attached` set, attached archives are unpacked next to it and
/// the top-level `<dest>/<basename>` directory is removed afterwards, so only
/// the output of the nested archives remains.
pub fn extract_archive<A, D>(archive: A, dest: D, opts: &ExtractOptions) -> Result<ExtractStats>
where
    A: AsRef<Path>,
    D: AsRef<Path>,
{
    let archive = archive.as_ref();
    let dest = fsutil::resolve_absolute(dest.as_ref())?;

    let stats = extract(archive, &dest, opts)?;
    log::info!(
        "extracted {} file(s), {} byte(s), {} attached archive(s)",
        stats.files, stats.bytes, stats.nested,
    );

    if opts.attached {
        let container = dest.join(fsutil::basename(archive)?);
        log::debug!("removing container directory {:?}", container);
        fsutil::remove_dir_recursive(&container)
            .map_err(|source| ArchiveError::Cleanup { path: container, source })?;
    }
    Ok(stats)
}

// ── List ──────────────────────────────────────────────────────────────────────

/// Every record in `archive`, in stream order. Nothing is written.
pub fn list_archive<P: AsRef<Path>>(archive: P) -> Result<Vec<EntryInfo>> {
    let archive = archive.as_ref();
    let file = File::open(archive).map_err(|source| ArchiveError::OpenArchive {
        path: archive.to_owned(),
        source,
    })?;
    let mut reader = RecordReader::new(BufReader::new(file))?;

    let mut entries = Vec::new();
    while let Some(header) = reader.next_record()? {
        entries.push(EntryInfo::from(header));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_archive_names_output_after_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("project");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("main.c"), b"int main;").unwrap();

        let out = create_archive(&src, dir.path().join("dist"), &PackOptions::default()).unwrap();
        assert_eq!(out.file_name().unwrap(), "project");
        assert_eq!(list_archive(&out).unwrap(), vec![EntryInfo { path: "main.c".into(), size: 9 }]);
    }

    #[test]
    fn refuses_to_write_inside_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("tree");
        std::fs::create_dir(&src).unwrap();

        let err = create_archive(&src, &src, &PackOptions::default()).unwrap_err();
        assert!(matches!(err, ArchiveError::OutputInsideSource(_)));
        assert_eq!(std::fs::read_dir(&src).unwrap().count(), 0);
    }

    #[test]
    fn list_rejects_foreign_files() {
        let dir = tempdir().unwrap();
        let f = dir.path().join("notes.txt");
        std::fs::write(&f, b"just some text").unwrap();
        assert!(matches!(list_archive(&f), Err(ArchiveError::BadMarker)));
    }

    #[cfg(unix)]
    #[test]
    fn cleanup_failure_is_reported_and_keeps_extracted_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let inner_src = dir.path().join("inner");
        std::fs::create_dir(&inner_src).unwrap();
        std::fs::write(inner_src.join("x.txt"), b"hi").unwrap();
        let inner = create_archive(&inner_src, dir.path().join("stage"), &PackOptions::default()).unwrap();

        let outer_src = dir.path().join("outer");
        std::fs::create_dir(&outer_src).unwrap();
        std::fs::copy(&inner, outer_src.join("inner")).unwrap();
        let outer = create_archive(&outer_src, dir.path().join("dist"), &PackOptions::default()).unwrap();

        // A read-only directory inside the container blocks its removal.
        let dest = dir.path().join("dest");
        let locked = dest.join("outer").join("locked");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::write(locked.join("kept"), b"k").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits do not bind a privileged user; nothing to check then.
        let enforced = std::fs::write(locked.join("access-check"), b"").is_err();
        if enforced {
            let opts = ExtractOptions { attached: true, ..Default::default() };
            let err = extract_archive(&outer, &dest, &opts).unwrap_err();
            assert!(matches!(err, ArchiveError::Cleanup { .. }));
            assert_eq!(std::fs::read(dest.join("inner/x.txt")).unwrap(), b"hi");
            assert!(locked.join("kept").exists());
        }

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}
