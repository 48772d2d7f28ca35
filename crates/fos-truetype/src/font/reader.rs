//! Big-endian reader over a byte source

use super::fixed_point::F2Dot14;
use super::source::ByteSource;
use crate::{Result, TrueTypeError};

const SHORT_READ: TrueTypeError = TrueTypeError::Malformed("unexpected end of data");

/// Sequential reader with bounds checking
pub struct FontReader<'s, S: ByteSource + ?Sized> {
    source: &'s mut S,
    pos: u32,
}

impl<'s, S: ByteSource + ?Sized> FontReader<'s, S> {
    /// Create a reader positioned at `offset`
    pub fn at(source: &'s mut S, offset: u32) -> Result<Self> {
        source.seek(offset)?;
        Ok(Self { source, pos: offset })
    }

    /// Get current position
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Set position
    pub fn set_pos(&mut self, pos: u32) -> Result<()> {
        self.source.seek(pos)?;
        self.pos = pos;
        Ok(())
    }

    /// Skip bytes
    pub fn skip(&mut self, n: u32) -> Result<()> {
        let pos = self.pos.checked_add(n).ok_or(SHORT_READ)?;
        if pos > self.source.len() {
            return Err(SHORT_READ);
        }
        self.set_pos(pos)
    }

    /// Fill `buf` completely or fail
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.source.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(SHORT_READ);
            }
            filled += n;
        }
        self.pos += buf.len() as u32;
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Read u8
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read i8
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read big-endian u16
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Read big-endian i16
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Read big-endian u32
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Read F2Dot14 (signed 2.14 fixed point)
    pub fn read_f2dot14(&mut self) -> Result<F2Dot14> {
        Ok(F2Dot14::from_bits(self.read_i16()?))
    }

    /// Read 4-byte tag
    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        self.read_array()
    }
}
