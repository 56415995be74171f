use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("File is not a valid archive")]
    BadMarker,
    #[error("Archive is truncated")]
    Truncated,
    #[error("Invalid record size: {0}")]
    InvalidSize(i64),
    #[error("Path too long: {0} bytes")]
    PathTooLong(usize),
    #[error("Unsafe path in archive: {0}")]
    UnsafePath(String),
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    #[error("Failed to open archive {}: {source}", .path.display())]
    OpenArchive { path: PathBuf, source: io::Error },
    #[error("Failed to open destination file {}: {source}", .path.display())]
    CreateFile { path: PathBuf, source: io::Error },
    #[error("Attached archives nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("Archive output {} would be written inside the source tree", .0.display())]
    OutputInsideSource(PathBuf),
    #[error("Failed to remove {}: {source}", .path.display())]
    Cleanup { path: PathBuf, source: io::Error },
}

impl ArchiveError {
    /// Map an `UnexpectedEof` from the middle of a record to [`ArchiveError::Truncated`].
    pub(crate) fn from_record_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ArchiveError::Truncated
        } else {
            ArchiveError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
