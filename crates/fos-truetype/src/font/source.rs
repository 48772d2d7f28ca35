//! Seekable byte sources for font data
//!
//! The parser never holds the whole font in memory itself. It seeks and
//! reads through a [`ByteSource`], which can be a plain byte slice or a
//! buffered file/stream.

use std::io::{Read, Seek, SeekFrom};

use crate::Result;

/// Size of the read buffer used by [`BufferedSource`]
pub const FILE_BUF_SIZE: usize = 512;

/// Buffered, seekable access to the font binary
pub trait ByteSource {
    /// Total size of the font data in bytes
    fn len(&self) -> u32;

    /// Move the read position to an absolute offset
    fn seek(&mut self, offset: u32) -> Result<()>;

    /// Read up to `buf.len()` bytes, returning how many were read.
    /// A return of 0 means end of data.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn len(&self) -> u32 {
        (**self).len()
    }

    fn seek(&mut self, offset: u32) -> Result<()> {
        (**self).seek(offset)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

/// Font data held in memory (borrowed slice or owned buffer)
#[derive(Debug, Clone)]
pub struct MemorySource<B> {
    data: B,
    pos: usize,
}

impl<B: AsRef<[u8]>> MemorySource<B> {
    pub fn new(data: B) -> Self {
        Self { data, pos: 0 }
    }

    /// The underlying bytes
    pub fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<B: AsRef<[u8]>> ByteSource for MemorySource<B> {
    fn len(&self) -> u32 {
        u32::try_from(self.data.as_ref().len()).unwrap_or(u32::MAX)
    }

    fn seek(&mut self, offset: u32) -> Result<()> {
        self.pos = (offset as usize).min(self.data.as_ref().len());
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let data = self.data.as_ref();
        let n = buf.len().min(data.len() - self.pos);
        buf[..n].copy_from_slice(&data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// File or stream backed source with a fixed read buffer.
///
/// Seeks that land inside the buffered window are served without touching
/// the underlying reader.
pub struct BufferedSource<R> {
    inner: R,
    len: u32,
    buf: [u8; FILE_BUF_SIZE],
    /// Stream offset of `buf[0]`
    buf_start: u32,
    /// Valid bytes in `buf`
    buf_len: usize,
    pos: u32,
}

impl<R: Read + Seek> BufferedSource<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        let end = inner.seek(SeekFrom::End(0))?;
        let len = u32::try_from(end)
            .map_err(|_| crate::TrueTypeError::InvalidFile("font larger than 4 GiB"))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner,
            len,
            buf: [0; FILE_BUF_SIZE],
            buf_start: 0,
            buf_len: 0,
            pos: 0,
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn refill(&mut self) -> Result<()> {
        self.inner.seek(SeekFrom::Start(u64::from(self.pos)))?;
        let mut filled = 0;
        while filled < FILE_BUF_SIZE {
            let n = self.inner.read(&mut self.buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        self.buf_start = self.pos;
        self.buf_len = filled;
        Ok(())
    }
}

impl<R: Read + Seek> ByteSource for BufferedSource<R> {
    fn len(&self) -> u32 {
        self.len
    }

    fn seek(&mut self, offset: u32) -> Result<()> {
        self.pos = offset.min(self.len);
        Ok(())
    }

    fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        let mut copied = 0;
        while copied < out.len() && self.pos < self.len {
            let in_window = self.pos >= self.buf_start
                && ((self.pos - self.buf_start) as usize) < self.buf_len;
            if !in_window {
                self.refill()?;
                if self.buf_len == 0 {
                    break;
                }
            }
            let start = (self.pos - self.buf_start) as usize;
            let n = (self.buf_len - start).min(out.len() - copied);
            out[copied..copied + n].copy_from_slice(&self.buf[start..start + n]);
            copied += n;
            self.pos += n as u32;
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_memory_source_short_read() {
        let mut src = MemorySource::new([1u8, 2, 3, 4, 5]);
        src.seek(3).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(src.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[4, 5]);
        assert_eq!(src.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_memory_source_seek_past_end() {
        let mut src = MemorySource::new(vec![0u8; 8]);
        src.seek(100).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(src.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_buffered_source_matches_memory() {
        let data: Vec<u8> = (0..2000u32).map(|i| (i * 7 % 251) as u8).collect();
        let mut buffered = BufferedSource::new(Cursor::new(data.clone())).unwrap();
        assert_eq!(buffered.len(), 2000);

        // Crosses several buffer windows, then seeks backwards
        for &offset in &[0u32, 510, 1500, 3, 1990] {
            buffered.seek(offset).unwrap();
            let mut buf = [0u8; 40];
            let n = buffered.read(&mut buf).unwrap();
            let end = (offset as usize + 40).min(data.len());
            assert_eq!(n, end - offset as usize);
            assert_eq!(&buf[..n], &data[offset as usize..end]);
        }
    }
}
