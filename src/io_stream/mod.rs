//! Streaming record engine — writer and reader.
//!
//! # Writer
//! [`RecordWriter`] appends one framed record per file to a stream that
//! already carries the marker. Content is copied through a fixed-size chunk
//! buffer; a file is never held in memory as a whole. The size written in
//! the header is authoritative: content that shrinks while being read is
//! padded with zeros, content that grows is cut at the declared size.
//!
//! # Reader
//! [`RecordReader`] checks the marker, then hands out headers one by one.
//! Each header's content must be consumed with [`RecordReader::copy_content`]
//! or is skipped automatically on the next [`RecordReader::next_record`].
//! There is no index and no seeking; the stream is read start to finish.

use std::io::{self, Read, Write};

use crate::error::{ArchiveError, Result};
use crate::format::RecordHeader;
use crate::guard::check_marker;

/// Default chunk size: 64 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

// ── Writer ───────────────────────────────────────────────────────────────────

pub struct RecordWriter<W: Write> {
    writer:      W,
    buf:         Vec<u8>,
    pub records: u64,
    pub bytes:   u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_chunk_size(writer, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(writer: W, chunk_size: usize) -> Self {
        Self {
            writer,
            buf:     vec![0u8; chunk_size.max(1)],
            records: 0,
            bytes:   0,
        }
    }

    /// Append a record for `path` whose content is the first `size` bytes
    /// of `content`.
    pub fn add_file<P, R>(&mut self, path: P, size: u64, mut content: R) -> Result<()>
    where
        P: AsRef<[u8]>,
        R: Read,
    {
        let header = RecordHeader { path: path.as_ref().to_vec(), size };
        header.write(&mut self.writer)?;

        let mut remaining = size;
        while remaining > 0 {
            let want = remaining.min(self.buf.len() as u64) as usize;
            let n = match content.read(&mut self.buf[..want]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.writer.write_all(&self.buf[..n])?;
            remaining -= n as u64;
        }

        if remaining > 0 {
            log::warn!(
                "file size shrunk while reading: {:?}, file will be padded with zeros",
                header.display_path(),
            );
            io::copy(&mut io::repeat(0).take(remaining), &mut self.writer)?;
        } else if content.read(&mut [0u8; 1])? > 0 {
            log::warn!(
                "file size increased while reading: {:?}, file will be truncated",
                header.display_path(),
            );
        }

        self.records += 1;
        self.bytes += size;
        Ok(())
    }

    /// Write the explicit end-of-records marker. Optional: readers also stop
    /// at physical EOF.
    pub fn write_terminator(&mut self) -> Result<()> {
        crate::format::write_terminator(&mut self.writer)?;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

// ── Reader ───────────────────────────────────────────────────────────────────

pub struct RecordReader<R: Read> {
    reader:  R,
    buf:     Vec<u8>,
    /// Content bytes of the current record not yet consumed.
    pending: u64,
    done:    bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Consume and verify the marker, then position at the first record.
    pub fn with_chunk_size(mut reader: R, chunk_size: usize) -> Result<Self> {
        check_marker(&mut reader)?;
        Ok(Self {
            reader,
            buf:     vec![0u8; chunk_size.max(1)],
            pending: 0,
            done:    false,
        })
    }

    /// Next record header, or `None` once the records are exhausted.
    pub fn next_record(&mut self) -> Result<Option<RecordHeader>> {
        if self.done {
            return Ok(None);
        }
        self.skip_content()?;
        match RecordHeader::read(&mut self.reader)? {
            Some(header) => {
                self.pending = header.size;
                Ok(Some(header))
            }
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }

    /// Copy the rest of the current record's content to `out`.
    pub fn copy_content<W: Write>(&mut self, mut out: W) -> Result<u64> {
        let mut copied = 0u64;
        while self.pending > 0 {
            let want = self.pending.min(self.buf.len() as u64) as usize;
            let n = match self.reader.read(&mut self.buf[..want]) {
                Ok(0) => return Err(ArchiveError::Truncated),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            out.write_all(&self.buf[..n])?;
            self.pending -= n as u64;
            copied += n as u64;
        }
        Ok(copied)
    }

    /// Discard the rest of the current record's content.
    pub fn skip_content(&mut self) -> Result<()> {
        self.copy_content(io::sink()).map(|_| ())
    }
}
