//! Marker checks at offset 0 of an archive stream.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ArchiveError, Result};
use crate::format::MARKER;

/// Read at most `MARKER.len()` bytes; stops early only at EOF.
fn read_marker<R: Read>(reader: R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(MARKER.len());
    reader.take(MARKER.len() as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Consume the marker from `reader`, failing with [`ArchiveError::BadMarker`]
/// on mismatch or a stream shorter than the marker.
pub fn check_marker<R: Read>(reader: R) -> Result<()> {
    if read_marker(reader)? != MARKER {
        return Err(ArchiveError::BadMarker);
    }
    Ok(())
}

/// True iff `path` can be opened and starts with the marker.
///
/// Any failure (missing file, permission denied, a directory) reads as
/// "not an archive". Never reads past the marker and never writes.
pub fn is_archive<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    match File::open(path).and_then(read_marker) {
        Ok(head) => head == MARKER,
        Err(e) => {
            log::debug!("marker check of {} failed: {}", path.display(), e);
            false
        }
    }
}
