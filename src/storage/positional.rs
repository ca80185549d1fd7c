//! Positional I/O backend (§4.1 backend (2)): `pread`/`pwrite` on Unix,
//! positioned file access on Windows. Read views always allocate; write
//! views buffer and commit on flush.

use std::fs::File;
use std::io;

use super::{ReadBackend, ReadView, WriteBackend, WriteView};
use crate::error::TiffResult;

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(unix)]
fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    let mut total = 0;
    while total < buf.len() {
        match file.seek_read(&mut buf[total..], offset + total as u64) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

#[cfg(windows)]
fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut total = 0;
    while total < buf.len() {
        let n = file.seek_write(&buf[total..], offset + total as u64)?;
        total += n;
    }
    Ok(())
}

/// A file accessed through positioned reads/writes rather than a shared
/// cursor, so concurrent non-overlapping reads/writes from multiple threads
/// are race-free without any internal locking (§5).
pub struct PositionalFile {
    file: File,
    len: u64,
}

impl PositionalFile {
    pub fn new(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }
}

impl ReadBackend for PositionalFile {
    fn read_must_allocate(&self) -> bool {
        true
    }

    fn size(&self) -> u64 {
        self.len
    }

    fn read(&self, offset: u64, size: u64) -> TiffResult<ReadView<'_>> {
        let (offset, size) = self.clamp_range(offset, size)?;
        let mut buf = vec![0u8; size as usize];
        let n = read_at(&self.file, &mut buf, offset)?;
        buf.truncate(n);
        Ok(ReadView::Owned(buf))
    }

    fn read_into(&self, dst: &mut [u8], offset: u64) -> TiffResult<usize> {
        if offset >= self.len && !dst.is_empty() {
            return Err(crate::error::TiffFormatError::OutOfBounds {
                offset,
                size: self.len,
            }
            .into());
        }
        let available = (self.len - offset).min(dst.len() as u64) as usize;
        Ok(read_at(&self.file, &mut dst[..available], offset)?)
    }
}

impl WriteBackend for PositionalFile {
    const SUPPORTS_INPLACE_READBACK: bool = false;

    fn size(&self) -> u64 {
        self.len
    }

    fn resize(&mut self, new_size: u64) -> TiffResult<()> {
        self.file.set_len(new_size)?;
        self.len = new_size;
        Ok(())
    }

    fn write(&mut self, offset: u64, size: u64) -> TiffResult<WriteView<'_>> {
        if offset + size > self.len {
            return Err(crate::error::UsageError::WriteOutOfBounds { offset, size }.into());
        }
        let file = &self.file;
        Ok(WriteView::Owned {
            buf: vec![0u8; size as usize],
            commit: Box::new(move |bytes| Ok(write_at(file, bytes, offset)?)),
            flushed: false,
        })
    }

    fn flush(&mut self) -> TiffResult<()> {
        self.file.sync_data()?;
        Ok(())
    }
}
