//! Wire format: marker token, record header framing and limits.
//!
//! # Layout
//! ```text
//! [ b"ARCHIVE_MARKER" ]                       offset 0, exactly once
//! repeat {
//!   [ relative path bytes ... 0x00 ]          '/'-separated, raw bytes
//!   [ size: i64 little-endian ]
//!   [ content: size bytes ]
//! }
//! [ 0x00 ]                                    optional terminator
//! ```
//!
//! There is no record count and no index; a reader stops at physical EOF
//! where the next path would begin, or at an empty path.
//!
//! # Endianness
//! The size field is always a 64-bit signed little-endian integer, whatever
//! the word size of the host that produced the archive.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{ArchiveError, Result};

pub const MARKER: &[u8; 14] = b"ARCHIVE_MARKER";

/// Longest relative path (in bytes, without the NUL) a record may carry.
pub const MAX_PATH_LEN: usize = 4096;

/// Default bound on attached-archive nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default bound on directory depth below the packed root.
pub const DEFAULT_MAX_WALK_DEPTH: usize = 256;

// ── RecordHeader ─────────────────────────────────────────────────────────────

/// Path and size of one packed file; `size` content bytes follow on the wire.
///
/// The path is kept as raw bytes: file names are not required to be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub path: Vec<u8>,
    pub size: u64,
}

impl RecordHeader {
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        if self.path.is_empty() || self.path.contains(&0) {
            return Err(ArchiveError::UnsafePath(self.display_path().into_owned()));
        }
        if self.path.len() > MAX_PATH_LEN {
            return Err(ArchiveError::PathTooLong(self.path.len()));
        }
        let size = i64::try_from(self.size)
            .map_err(|_| ArchiveError::InvalidSize(i64::MAX))?;
        writer.write_all(&self.path)?;
        writer.write_u8(0)?;
        writer.write_i64::<LittleEndian>(size)?;
        Ok(())
    }

    /// Read the next header. `Ok(None)` means end of records: either EOF
    /// before the first path byte or an explicit empty path.
    pub fn read<R: Read>(mut reader: R) -> Result<Option<Self>> {
        let path = match read_path(&mut reader)? {
            Some(p) => p,
            None => return Ok(None),
        };
        let size = reader
            .read_i64::<LittleEndian>()
            .map_err(ArchiveError::from_record_io)?;
        if size < 0 {
            return Err(ArchiveError::InvalidSize(size));
        }
        Ok(Some(Self { path, size: size as u64 }))
    }

    /// Lossy UTF-8 rendering of the path, for messages and listings.
    pub fn display_path(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }
}

/// Write the optional end-of-records terminator.
pub fn write_terminator<W: Write>(mut writer: W) -> io::Result<()> {
    writer.write_u8(0)
}

fn read_path<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    loop {
        let byte = match reader.read_u8() {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                // Clean EOF only between records.
                return if buf.is_empty() { Ok(None) } else { Err(ArchiveError::Truncated) };
            }
            Err(e) => return Err(e.into()),
        };
        if byte == 0 {
            break;
        }
        if buf.len() == MAX_PATH_LEN {
            return Err(ArchiveError::PathTooLong(buf.len() + 1));
        }
        buf.push(byte);
    }
    Ok(if buf.is_empty() { None } else { Some(buf) })
}

// ── Path rules ───────────────────────────────────────────────────────────────
//
// The packer checks every path it renders with `sanitize_record_path`, so
// anything written by this crate is accepted again on extraction.

#[cfg(unix)]
fn segment_to_os(segment: &[u8]) -> Option<&OsStr> {
    use std::os::unix::ffi::OsStrExt;
    Some(OsStr::from_bytes(segment))
}

#[cfg(not(unix))]
fn segment_to_os(segment: &[u8]) -> Option<&OsStr> {
    // A backslash separates components on Windows and must not hide in a segment.
    if segment.contains(&b'\\') {
        return None;
    }
    std::str::from_utf8(segment).ok().map(OsStr::new)
}

#[cfg(unix)]
fn os_to_segment(name: &OsStr) -> Option<&[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Some(name.as_bytes())
}

#[cfg(not(unix))]
fn os_to_segment(name: &OsStr) -> Option<&[u8]> {
    name.to_str().map(str::as_bytes)
}

/// Turn a stored record path into a relative [`PathBuf`] that cannot leave
/// the directory it is joined onto.
pub fn sanitize_record_path(stored: &[u8]) -> Result<PathBuf> {
    let unsafe_path = || ArchiveError::UnsafePath(String::from_utf8_lossy(stored).into_owned());

    let mut out = PathBuf::new();
    for segment in stored.split(|&b| b == b'/') {
        if segment.is_empty() || segment == b"." || segment == b".." {
            return Err(unsafe_path());
        }
        let name = segment_to_os(segment).ok_or_else(unsafe_path)?;
        let mut comps = Path::new(name).components();
        match (comps.next(), comps.next()) {
            (Some(Component::Normal(_)), None) => out.push(name),
            _ => return Err(unsafe_path()),
        }
    }
    Ok(out)
}

/// Render `file` relative to `root` as a '/'-separated record path.
pub fn record_path(root: &Path, file: &Path) -> Result<Vec<u8>> {
    let lossy = || ArchiveError::UnsafePath(file.display().to_string());
    let rel = file.strip_prefix(root).map_err(|_| lossy())?;

    let mut out = Vec::new();
    for comp in rel.components() {
        let name = match comp {
            Component::Normal(name) => os_to_segment(name).ok_or_else(lossy)?,
            _ => return Err(lossy()),
        };
        if !out.is_empty() {
            out.push(b'/');
        }
        out.extend_from_slice(name);
    }
    if out.is_empty() {
        return Err(lossy());
    }
    if out.len() > MAX_PATH_LEN {
        return Err(ArchiveError::PathTooLong(out.len()));
    }
    sanitize_record_path(&out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_layout_is_path_nul_then_le_size() {
        let header = RecordHeader { path: "a/b.txt".into(), size: 258 };
        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();

        let mut expected = b"a/b.txt\0".to_vec();
        expected.extend_from_slice(&258i64.to_le_bytes());
        assert_eq!(buf, expected);
    }

    #[test]
    fn eof_before_path_ends_records() {
        assert_eq!(RecordHeader::read(Cursor::new(Vec::new())).unwrap(), None);
    }

    #[test]
    fn empty_path_is_terminator() {
        let mut buf = Vec::new();
        write_terminator(&mut buf).unwrap();
        buf.extend_from_slice(b"ignored");
        assert_eq!(RecordHeader::read(Cursor::new(buf)).unwrap(), None);
    }

    #[test]
    fn eof_inside_path_or_size_is_truncation() {
        let err = RecordHeader::read(Cursor::new(b"half".to_vec())).unwrap_err();
        assert!(matches!(err, ArchiveError::Truncated));

        let err = RecordHeader::read(Cursor::new(b"f\0\x01\x02".to_vec())).unwrap_err();
        assert!(matches!(err, ArchiveError::Truncated));
    }

    #[test]
    fn negative_size_is_rejected() {
        let mut buf = b"f\0".to_vec();
        buf.extend_from_slice(&(-5i64).to_le_bytes());
        let err = RecordHeader::read(Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidSize(-5)));
    }

    #[test]
    fn overlong_path_is_rejected_both_ways() {
        let long = "x".repeat(MAX_PATH_LEN + 1);
        let header = RecordHeader { path: long.clone().into_bytes(), size: 0 };
        assert!(matches!(header.write(Vec::new()), Err(ArchiveError::PathTooLong(_))));

        let mut buf = long.into_bytes();
        buf.push(0);
        let err = RecordHeader::read(Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ArchiveError::PathTooLong(_)));
    }

    #[test]
    fn sanitize_accepts_nested_relative_paths() {
        let p = sanitize_record_path(b"dir/sub/file.bin").unwrap();
        assert_eq!(p, Path::new("dir").join("sub").join("file.bin"));
    }

    #[test]
    fn sanitize_rejects_escapes() {
        for bad in ["../x", "a/../../x", "/etc/passwd", "a//b", "./a", "a/", ""] {
            assert!(
                matches!(sanitize_record_path(bad.as_bytes()), Err(ArchiveError::UnsafePath(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn record_path_uses_forward_slashes() {
        let root = Path::new("root");
        let file = root.join("a").join("b").join("c.txt");
        assert_eq!(record_path(root, &file).unwrap(), b"a/b/c.txt");
        assert!(record_path(root, root).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn backslash_and_non_utf8_names_are_plain_segments() {
        let p = sanitize_record_path(b"dir/a\\b.txt").unwrap();
        assert_eq!(p.components().count(), 2);
        assert!(p.ends_with("a\\b.txt"));

        use std::os::unix::ffi::OsStrExt;
        let name = OsStr::from_bytes(b"caf\xe9.txt");
        let root = Path::new("root");
        let rendered = record_path(root, &root.join("sub").join(name)).unwrap();
        assert_eq!(rendered, b"sub/caf\xe9.txt");
        assert_eq!(sanitize_record_path(&rendered).unwrap(), Path::new("sub").join(name));
    }
}
