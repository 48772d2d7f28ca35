//! Character to glyph mapping (cmap table, format 4)

use super::reader::FontReader;
use super::source::ByteSource;
use super::tables::TableRecord;
use super::GlyphId;
use crate::{Result, TrueTypeError};

/// One format-4 segment, as stored in the parallel arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmapSegment {
    pub end_code: u16,
    pub start_code: u16,
    pub id_delta: i16,
    pub id_range_offset: u16,
}

/// Located format-4 subtable.
///
/// Only array positions are kept; segments are read on demand.
#[derive(Debug, Clone)]
pub struct Cmap4 {
    seg_count: u16,
    /// Absolute offsets of the four parallel arrays
    end_codes: u32,
    start_codes: u32,
    id_deltas: u32,
    id_range_offsets: u32,
    /// First byte past the cmap table
    table_end: u32,
}

impl Cmap4 {
    /// Find the first Unicode-capable format-4 subtable
    pub fn locate<S: ByteSource + ?Sized>(source: &mut S, cmap: &TableRecord) -> Result<Self> {
        let mut reader = FontReader::at(source, cmap.offset)?;
        let _version = reader.read_u16()?;
        let num_tables = reader.read_u16()?;
        if !cmap.contains(4, u32::from(num_tables) * 8) {
            return Err(TrueTypeError::Malformed("cmap encoding records out of bounds"));
        }

        for i in 0..u32::from(num_tables) {
            reader.set_pos(cmap.offset + 4 + i * 8)?;
            let platform_id = reader.read_u16()?;
            let encoding_id = reader.read_u16()?;
            let offset = reader.read_u32()?;

            let unicode = match (platform_id, encoding_id) {
                (0, _) => true,        // Unicode
                (3, 1) | (3, 10) => true, // Windows Unicode BMP / full
                _ => false,
            };
            if !unicode || !cmap.contains(offset, 14) {
                continue;
            }

            reader.set_pos(cmap.offset + offset)?;
            if reader.read_u16()? != 4 {
                continue;
            }
            tracing::trace!("Using cmap subtable platform {} encoding {}", platform_id, encoding_id);
            return Self::parse_format4(&mut reader, cmap, offset);
        }

        Err(TrueTypeError::InvalidFile("no Unicode format 4 cmap subtable"))
    }

    fn parse_format4<S: ByteSource + ?Sized>(
        reader: &mut FontReader<'_, S>,
        cmap: &TableRecord,
        offset: u32,
    ) -> Result<Self> {
        let _length = reader.read_u16()?;
        let _language = reader.read_u16()?;
        let seg_count_x2 = reader.read_u16()?;
        if seg_count_x2 == 0 || seg_count_x2 % 2 != 0 {
            return Err(TrueTypeError::Malformed("bad cmap segment count"));
        }
        let seg_count = seg_count_x2 / 2;
        let array_len = u32::from(seg_count_x2);

        // searchRange, entrySelector, rangeShift precede the arrays
        let end_codes = offset + 14;
        // reservedPad sits between endCode and startCode
        let start_codes = end_codes + array_len + 2;
        let id_deltas = start_codes + array_len;
        let id_range_offsets = id_deltas + array_len;
        if !cmap.contains(id_range_offsets, array_len) {
            return Err(TrueTypeError::Malformed("cmap segments out of bounds"));
        }

        Ok(Self {
            seg_count,
            end_codes: cmap.offset + end_codes,
            start_codes: cmap.offset + start_codes,
            id_deltas: cmap.offset + id_deltas,
            id_range_offsets: cmap.offset + id_range_offsets,
            table_end: cmap.end(),
        })
    }

    pub fn segment_count(&self) -> u16 {
        self.seg_count
    }

    /// Decode segment `index`
    pub fn segment<S: ByteSource + ?Sized>(&self, source: &mut S, index: u16) -> Result<CmapSegment> {
        if index >= self.seg_count {
            return Err(TrueTypeError::InvalidParameter("cmap segment index out of range"));
        }
        let at = u32::from(index) * 2;
        Ok(CmapSegment {
            end_code: Self::read_u16_at(source, self.end_codes + at)?,
            start_code: Self::read_u16_at(source, self.start_codes + at)?,
            id_delta: Self::read_u16_at(source, self.id_deltas + at)? as i16,
            id_range_offset: Self::read_u16_at(source, self.id_range_offsets + at)?,
        })
    }

    fn read_u16_at<S: ByteSource + ?Sized>(source: &mut S, pos: u32) -> Result<u16> {
        FontReader::at(source, pos)?.read_u16()
    }

    /// Map a code point to a glyph index.
    ///
    /// Code points above the BMP, in no segment, or mapped to glyph 0 are
    /// `GlyphNotFound`.
    pub fn resolve<S: ByteSource + ?Sized>(&self, source: &mut S, codepoint: u32) -> Result<GlyphId> {
        let Ok(code) = u16::try_from(codepoint) else {
            return Err(TrueTypeError::GlyphNotFound);
        };

        // First segment whose end code >= code
        let mut lo = 0u16;
        let mut hi = self.seg_count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let end_code = Self::read_u16_at(source, self.end_codes + u32::from(mid) * 2)?;
            if end_code < code {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo >= self.seg_count {
            return Err(TrueTypeError::GlyphNotFound);
        }

        let seg = self.segment(source, lo)?;
        if code < seg.start_code {
            return Err(TrueTypeError::GlyphNotFound);
        }

        let glyph = if seg.id_range_offset == 0 {
            code.wrapping_add(seg.id_delta as u16)
        } else {
            // idRangeOffset is relative to its own slot in the array
            let slot = self.id_range_offsets + u32::from(lo) * 2;
            let pos = slot + u32::from(seg.id_range_offset) + u32::from(code - seg.start_code) * 2;
            if pos + 2 > self.table_end {
                return Err(TrueTypeError::Malformed("cmap glyph index out of bounds"));
            }
            match Self::read_u16_at(source, pos)? {
                0 => 0,
                g => g.wrapping_add(seg.id_delta as u16),
            }
        };

        if glyph == 0 {
            return Err(TrueTypeError::GlyphNotFound);
        }
        Ok(GlyphId(glyph))
    }
}
