//! Byte sources for font loading
//!
//! Files, memory buffers and custom sources all go through the
//! [`InputStream`] trait, read with the same seek-then-read callback.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::{FontError, Result};

/// Chunk size used when pulling a whole stream into memory
const READ_CHUNK: usize = 64 * 1024;

/// Seekable source of bytes
///
/// Every method returns `None` on failure.
pub trait InputStream {
    /// Read into `buf`, returning the number of bytes read
    fn read(&mut self, buf: &mut [u8]) -> Option<u64>;

    /// Move to an absolute position, returning the new position
    fn seek(&mut self, position: u64) -> Option<u64>;

    /// Current position
    fn tell(&mut self) -> Option<u64>;

    /// Total size in bytes
    fn size(&mut self) -> Option<u64>;
}

/// Stream over a file on disk
#[derive(Debug)]
pub struct FileInputStream {
    file: File,
}

impl FileInputStream {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            file: File::open(path)?,
        })
    }
}

impl InputStream for FileInputStream {
    fn read(&mut self, buf: &mut [u8]) -> Option<u64> {
        let mut total = 0;
        while total < buf.len() {
            match self.file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => return None,
            }
        }
        Some(total as u64)
    }

    fn seek(&mut self, position: u64) -> Option<u64> {
        self.file.seek(SeekFrom::Start(position)).ok()
    }

    fn tell(&mut self) -> Option<u64> {
        self.file.stream_position().ok()
    }

    fn size(&mut self) -> Option<u64> {
        self.file.metadata().ok().map(|meta| meta.len())
    }
}

/// Stream over a borrowed byte slice
#[derive(Debug, Clone)]
pub struct MemoryInputStream<'a> {
    data: &'a [u8],
    offset: u64,
}

impl<'a> MemoryInputStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl InputStream for MemoryInputStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Option<u64> {
        let start = usize::try_from(self.offset).ok()?.min(self.data.len());
        let count = buf.len().min(self.data.len() - start);
        buf[..count].copy_from_slice(&self.data[start..start + count]);
        self.offset += count as u64;
        Some(count as u64)
    }

    fn seek(&mut self, position: u64) -> Option<u64> {
        self.offset = position.min(self.data.len() as u64);
        Some(self.offset)
    }

    fn tell(&mut self) -> Option<u64> {
        Some(self.offset)
    }

    fn size(&mut self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

/// Read `buf.len()` bytes at `offset`, the way a font engine reads streams
///
/// Returns the number of bytes read. When the seek fails the result is `0`
/// for a read request, and the error value `1` for a pure seek request
/// (empty `buf`). A successful seek with an empty `buf` returns `0`.
pub fn read_at<S: InputStream + ?Sized>(stream: &mut S, offset: u64, buf: &mut [u8]) -> u64 {
    if stream.seek(offset) != Some(offset) {
        return if buf.is_empty() { 1 } else { 0 };
    }
    if buf.is_empty() {
        return 0;
    }
    stream.read(buf).unwrap_or(0)
}

/// Pull the whole content of a stream into memory
pub(crate) fn read_all<S: InputStream + ?Sized>(stream: &mut S) -> Result<Vec<u8>> {
    // Make sure the reading position is at the beginning
    if stream.seek(0) != Some(0) {
        return Err(FontError::StreamSeek);
    }
    let size = stream.size().ok_or(FontError::StreamRead { offset: 0 })?;
    let size = usize::try_from(size).map_err(|_| FontError::StreamRead { offset: 0 })?;

    let mut data = vec![0u8; size];
    let mut offset = 0;
    while offset < size {
        let end = (offset + READ_CHUNK).min(size);
        let read = read_at(stream, offset as u64, &mut data[offset..end]) as usize;
        if read == 0 {
            return Err(FontError::StreamRead { offset: offset as u64 });
        }
        offset += read.min(end - offset);
    }
    Ok(data)
}
