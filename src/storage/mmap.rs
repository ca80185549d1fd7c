//! Memory-mapped file backend (§4.1 backend (3)): zero-copy reads, and for
//! the writable variant, writes visible in-place immediately. Grounded on
//! `memmap2`, the same crate used for this purpose elsewhere in the corpus
//! (`mauriceschilpp-skyforest-rasterizer`, `gpeacock-asset-io`).

use memmap2::{Mmap, MmapMut};
use std::fs::File;

use super::{ReadBackend, ReadView, WriteBackend, WriteView};
use crate::error::TiffResult;

/// A read-only memory-mapped file.
pub struct MmapReadBackend {
    map: Mmap,
}

impl MmapReadBackend {
    /// # Safety
    /// Mapping a file is unsafe in the usual mmap sense: if another process
    /// truncates or otherwise mutates the file concurrently, accessing the
    /// mapped range is undefined behavior. Callers must ensure the file is
    /// not concurrently modified by anyone outside this process for the
    /// lifetime of the mapping.
    pub unsafe fn new(file: &File) -> std::io::Result<Self> {
        Ok(Self {
            map: Mmap::map(file)?,
        })
    }
}

impl ReadBackend for MmapReadBackend {
    fn read_must_allocate(&self) -> bool {
        false
    }

    fn size(&self) -> u64 {
        self.map.len() as u64
    }

    fn read(&self, offset: u64, size: u64) -> TiffResult<ReadView<'_>> {
        let (offset, size) = self.clamp_range(offset, size)?;
        let start = offset as usize;
        let end = start + size as usize;
        Ok(ReadView::Borrowed(&self.map[start..end]))
    }
}

/// A read-write memory-mapped file. Writes land directly in the mapping;
/// `flush` calls `msync` (via `memmap2::MmapMut::flush`).
pub struct MmapWriteBackend {
    map: MmapMut,
    file: File,
}

impl MmapWriteBackend {
    /// # Safety
    /// See [`MmapReadBackend::new`].
    pub unsafe fn new(file: File) -> std::io::Result<Self> {
        let map = MmapMut::map_mut(&file)?;
        Ok(Self { map, file })
    }
}

impl ReadBackend for MmapWriteBackend {
    fn read_must_allocate(&self) -> bool {
        false
    }

    fn size(&self) -> u64 {
        self.map.len() as u64
    }

    fn read(&self, offset: u64, size: u64) -> TiffResult<ReadView<'_>> {
        let (offset, size) = self.clamp_range(offset, size)?;
        let start = offset as usize;
        let end = start + size as usize;
        Ok(ReadView::Borrowed(&self.map[start..end]))
    }
}

impl WriteBackend for MmapWriteBackend {
    const SUPPORTS_INPLACE_READBACK: bool = true;

    fn size(&self) -> u64 {
        self.map.len() as u64
    }

    fn resize(&mut self, new_size: u64) -> TiffResult<()> {
        self.file.set_len(new_size)?;
        // Safety: we hold the only handle to `file` via `self`, and the
        // previous mapping is dropped before the new one is created.
        self.map = unsafe { MmapMut::map_mut(&self.file)? };
        Ok(())
    }

    fn write(&mut self, offset: u64, size: u64) -> TiffResult<WriteView<'_>> {
        let start = offset as usize;
        let end = start + size as usize;
        if end > self.map.len() {
            return Err(crate::error::UsageError::WriteOutOfBounds { offset, size }.into());
        }
        Ok(WriteView::Borrowed(&mut self.map[start..end]))
    }

    fn flush(&mut self) -> TiffResult<()> {
        self.map.flush()?;
        Ok(())
    }
}
