//! Borrowed in-memory buffer backends: zero-copy read-only and read-write
//! views over a caller-owned `&[u8]` / `&mut [u8]` (§4.1 backend (1)).

use super::{ReadBackend, ReadView, WriteBackend, WriteView};
use crate::error::TiffResult;

/// A read-only borrowed buffer. Every read is a zero-copy slice.
pub struct BorrowedReadBuffer<'a> {
    data: &'a [u8],
}

impl<'a> BorrowedReadBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl ReadBackend for BorrowedReadBuffer<'_> {
    fn read_must_allocate(&self) -> bool {
        false
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&self, offset: u64, size: u64) -> TiffResult<ReadView<'_>> {
        let (offset, size) = self.clamp_range(offset, size)?;
        let start = offset as usize;
        let end = start + size as usize;
        Ok(ReadView::Borrowed(&self.data[start..end]))
    }
}

/// A read-write borrowed buffer: reads and writes are both zero-copy, and
/// writes are visible in-place immediately (`SUPPORTS_INPLACE_READBACK`).
/// The buffer's size is fixed at construction; `resize` only succeeds when
/// shrinking or matching the current size, since there's no backing
/// allocator to grow into like there is for mmap/positional backends.
pub struct BorrowedWriteBuffer<'a> {
    data: &'a mut [u8],
}

impl<'a> BorrowedWriteBuffer<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }
}

impl ReadBackend for BorrowedWriteBuffer<'_> {
    fn read_must_allocate(&self) -> bool {
        false
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&self, offset: u64, size: u64) -> TiffResult<ReadView<'_>> {
        let (offset, size) = self.clamp_range(offset, size)?;
        let start = offset as usize;
        let end = start + size as usize;
        Ok(ReadView::Borrowed(&self.data[start..end]))
    }
}

impl WriteBackend for BorrowedWriteBuffer<'_> {
    const SUPPORTS_INPLACE_READBACK: bool = true;

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn resize(&mut self, new_size: u64) -> TiffResult<()> {
        if new_size as usize <= self.data.len() {
            Ok(())
        } else {
            Err(crate::error::UsageError::WriteOutOfBounds {
                offset: self.data.len() as u64,
                size: new_size - self.data.len() as u64,
            }
            .into())
        }
    }

    fn write(&mut self, offset: u64, size: u64) -> TiffResult<WriteView<'_>> {
        let start = offset as usize;
        let end = start + size as usize;
        if end > self.data.len() {
            return Err(crate::error::UsageError::WriteOutOfBounds { offset, size }.into());
        }
        Ok(WriteView::Borrowed(&mut self.data[start..end]))
    }

    fn flush(&mut self) -> TiffResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_truncates_past_end() {
        let data = [1u8, 2, 3, 4];
        let backend = BorrowedReadBuffer::new(&data);
        let view = backend.read(2, 100).unwrap();
        assert_eq!(&*view, &[3, 4]);
    }

    #[test]
    fn read_at_end_is_out_of_bounds() {
        let data = [1u8, 2, 3];
        let backend = BorrowedReadBuffer::new(&data);
        assert!(backend.read(3, 1).is_err());
    }

    #[test]
    fn write_buffer_readback_before_flush() {
        let mut data = [0u8; 4];
        let mut backend = BorrowedWriteBuffer::new(&mut data);
        {
            let mut view = backend.write(0, 4).unwrap();
            view.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
        }
        let view = backend.read(0, 4).unwrap();
        assert_eq!(&*view, &[1, 2, 3, 4]);
    }
}
