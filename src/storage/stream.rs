//! Portable byte-stream backend (§4.1 backend (4)): mutex-guarded,
//! allocating, works over any `Read + Write + Seek`. The fallback when
//! neither mmap nor positioned file-descriptor I/O is available (in-memory
//! cursors, sockets wrapped in a seekable adapter, etc).

use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use super::{ReadBackend, ReadView, WriteBackend, WriteView};
use crate::error::TiffResult;

pub struct StreamBackend<T> {
    inner: Mutex<T>,
    len: u64,
}

impl<T: Seek> StreamBackend<T> {
    pub fn new(mut inner: T) -> std::io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner: Mutex::new(inner),
            len,
        })
    }

    /// Unwraps the backend, handing the underlying stream back to the
    /// caller once writing is finished.
    pub fn into_inner(self) -> T {
        self.inner.into_inner().expect("stream backend mutex poisoned")
    }
}

impl<T: Read + Seek> ReadBackend for StreamBackend<T> {
    fn read_must_allocate(&self) -> bool {
        true
    }

    fn size(&self) -> u64 {
        self.len
    }

    fn read(&self, offset: u64, size: u64) -> TiffResult<ReadView<'_>> {
        let (offset, size) = self.clamp_range(offset, size)?;
        let mut buf = vec![0u8; size as usize];
        let mut guard = self.inner.lock().expect("stream backend mutex poisoned");
        guard.seek(SeekFrom::Start(offset))?;
        let mut read_total = 0;
        while read_total < buf.len() {
            let n = guard.read(&mut buf[read_total..])?;
            if n == 0 {
                break;
            }
            read_total += n;
        }
        buf.truncate(read_total);
        Ok(ReadView::Owned(buf))
    }
}

impl<T: Write + Read + Seek> WriteBackend for StreamBackend<T> {
    const SUPPORTS_INPLACE_READBACK: bool = false;

    fn size(&self) -> u64 {
        self.len
    }

    fn resize(&mut self, new_size: u64) -> TiffResult<()> {
        // Portable streams have no generic truncate/extend; growth is
        // achieved lazily by writing past the current end, which is the
        // convention every caller of this backend already follows.
        self.len = self.len.max(new_size);
        Ok(())
    }

    fn write(&mut self, offset: u64, size: u64) -> TiffResult<WriteView<'_>> {
        self.len = self.len.max(offset + size);
        let inner: &Mutex<T> = &self.inner;
        Ok(WriteView::Owned {
            buf: vec![0u8; size as usize],
            commit: Box::new(move |bytes| {
                let mut guard = inner.lock().expect("stream backend mutex poisoned");
                guard.seek(SeekFrom::Start(offset))?;
                guard.write_all(bytes)?;
                Ok(())
            }),
            flushed: false,
        })
    }

    fn flush(&mut self) -> TiffResult<()> {
        self.inner
            .lock()
            .expect("stream backend mutex poisoned")
            .flush()?;
        Ok(())
    }
}
