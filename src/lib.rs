pub mod error;
pub mod format;
pub mod guard;
pub mod fsutil;
pub mod io_stream;
pub mod pack;
pub mod unpack;
pub mod archive;

pub use error::{ArchiveError, Result};
pub use format::{RecordHeader, MARKER};
pub use guard::is_archive;
pub use pack::{pack_directory, PackOptions, PackStats};
pub use unpack::{extract, ExtractOptions, ExtractStats};
pub use archive::{create_archive, extract_archive, list_archive, EntryInfo};
