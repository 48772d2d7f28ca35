//! Horizontal metrics (hmtx) and pair kerning (kern format 0)

use super::reader::FontReader;
use super::source::ByteSource;
use super::tables::TableRecord;
use super::GlyphId;
use crate::{Result, TrueTypeError};

const KERN_PAIR_SIZE: u32 = 6;

/// Advance width and left side bearing of one glyph, in FUnits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HMetric {
    pub advance_width: u16,
    pub left_side_bearing: i16,
}

/// hmtx lookup
#[derive(Debug, Clone)]
pub struct HorizontalMetrics {
    hmtx: TableRecord,
    number_of_h_metrics: u16,
    num_glyphs: u16,
}

impl HorizontalMetrics {
    pub fn new(hmtx: TableRecord, number_of_h_metrics: u16, num_glyphs: u16) -> Result<Self> {
        if number_of_h_metrics == 0 {
            return Err(TrueTypeError::InvalidFile("numberOfHMetrics is zero"));
        }
        if !hmtx.contains(0, u32::from(number_of_h_metrics) * 4) {
            return Err(TrueTypeError::InvalidFile("hmtx table too short"));
        }
        Ok(Self { hmtx, number_of_h_metrics, num_glyphs })
    }

    pub fn number_of_h_metrics(&self) -> u16 {
        self.number_of_h_metrics
    }

    /// Metrics for `glyph`.
    ///
    /// Glyphs at or past `numberOfHMetrics` share the last advance and take
    /// their bearing from the trailing `leftSideBearing` array.
    pub fn get<S: ByteSource + ?Sized>(&self, source: &mut S, glyph: GlyphId) -> Result<HMetric> {
        if glyph.0 >= self.num_glyphs {
            return Err(TrueTypeError::GlyphNotFound);
        }
        let long_count = self.number_of_h_metrics;
        if glyph.0 < long_count {
            let mut r = FontReader::at(source, self.hmtx.offset + u32::from(glyph.0) * 4)?;
            return Ok(HMetric {
                advance_width: r.read_u16()?,
                left_side_bearing: r.read_i16()?,
            });
        }

        let last = u32::from(long_count - 1) * 4;
        let advance_width = FontReader::at(source, self.hmtx.offset + last)?.read_u16()?;
        let lsb_offset = u32::from(long_count) * 4 + u32::from(glyph.0 - long_count) * 2;
        // Some fonts truncate the bearing array
        let left_side_bearing = if self.hmtx.contains(lsb_offset, 2) {
            FontReader::at(source, self.hmtx.offset + lsb_offset)?.read_i16()?
        } else {
            0
        };
        Ok(HMetric { advance_width, left_side_bearing })
    }
}

/// Sorted format-0 kerning pairs
#[derive(Debug, Clone)]
pub struct KernTable {
    /// Absolute offset of the first pair
    pairs: u32,
    n_pairs: u16,
}

impl KernTable {
    /// Locate the first horizontal format-0 subtable.
    ///
    /// Returns `None` when the table holds no usable subtable.
    pub fn locate<S: ByteSource + ?Sized>(source: &mut S, kern: &TableRecord) -> Result<Option<Self>> {
        let mut r = FontReader::at(source, kern.offset)?;
        let version = r.read_u16()?;

        let (n_tables, apple) = match version {
            // Microsoft: u16 version, u16 nTables
            0 => (u32::from(r.read_u16()?), false),
            // Apple: Fixed 1.0 version, u32 nTables
            1 => {
                let _minor = r.read_u16()?;
                (r.read_u32()?, true)
            }
            _ => {
                tracing::debug!("Ignoring kern table version {}", version);
                return Ok(None);
            }
        };

        let mut sub = r.pos();
        for _ in 0..n_tables {
            r.set_pos(sub)?;
            let (length, format, horizontal, header_len) = if apple {
                let length = r.read_u32()?;
                let coverage = r.read_u16()?;
                let _tuple_index = r.read_u16()?;
                // 0x8000 vertical, 0x4000 cross-stream, low byte format
                let horizontal = coverage & 0xC000 == 0;
                (length, coverage & 0x00FF, horizontal, 8)
            } else {
                let _sub_version = r.read_u16()?;
                let length = u32::from(r.read_u16()?);
                let coverage = r.read_u16()?;
                // bit 0 horizontal, bit 2 cross-stream, high byte format
                let horizontal = coverage & 0x0001 != 0 && coverage & 0x0004 == 0;
                (length, coverage >> 8, horizontal, 6)
            };

            if format == 0 && horizontal {
                let n_pairs = r.read_u16()?;
                r.skip(6)?; // searchRange, entrySelector, rangeShift
                let pairs = r.pos();
                let pairs_end = pairs - kern.offset + u32::from(n_pairs) * KERN_PAIR_SIZE;
                if pairs_end > kern.length {
                    return Err(TrueTypeError::Malformed("kern pairs out of bounds"));
                }
                return Ok(Some(Self { pairs, n_pairs }));
            }

            if length < header_len {
                return Err(TrueTypeError::Malformed("kern subtable length"));
            }
            sub = match sub.checked_add(length) {
                Some(next) if next < kern.end() => next,
                Some(_) => break,
                None => return Err(TrueTypeError::Malformed("kern subtable length")),
            };
        }
        Ok(None)
    }

    pub fn len(&self) -> u16 {
        self.n_pairs
    }

    pub fn is_empty(&self) -> bool {
        self.n_pairs == 0
    }

    /// Adjustment between `left` and `right` in FUnits (0 if no pair)
    pub fn lookup<S: ByteSource + ?Sized>(&self, source: &mut S, left: GlyphId, right: GlyphId) -> Result<i16> {
        let key = (u32::from(left.0) << 16) | u32::from(right.0);
        let mut lo = 0u32;
        let mut hi = u32::from(self.n_pairs);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let mut r = FontReader::at(source, self.pairs + mid * KERN_PAIR_SIZE)?;
            let pair_key = r.read_u32()?;
            if pair_key == key {
                return r.read_i16();
            }
            if pair_key < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(0)
    }
}
