//! sfnt table directory and fixed-layout tables
//!
//! Parses the offset table, the table records, and the `head`, `hhea` and
//! `maxp` tables. Checksum validation streams each table through the byte
//! source in small chunks.

use std::fmt;

use super::reader::FontReader;
use super::source::ByteSource;
use crate::{Result, TrueTypeError};

/// Maximum number of tables accepted in a directory
pub const MAX_TABLES: usize = 64;

const SFNT_VERSION_TRUETYPE: u32 = 0x0001_0000;
const SFNT_VERSION_APPLE: u32 = 0x7472_7565; // 'true'
const SFNT_VERSION_CFF: u32 = 0x4F54_544F; // 'OTTO'

const HEAD_MAGIC: u32 = 0x5F0F_3CF5;
/// Offset of `checkSumAdjustment` inside `head`
const HEAD_CHECKSUM_ADJUSTMENT: u32 = 8;

/// A 4-byte table tag
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableTag(pub [u8; 4]);

impl TableTag {
    pub const HEAD: Self = Self(*b"head");
    pub const CMAP: Self = Self(*b"cmap");
    pub const GLYF: Self = Self(*b"glyf");
    pub const LOCA: Self = Self(*b"loca");
    pub const HHEA: Self = Self(*b"hhea");
    pub const HMTX: Self = Self(*b"hmtx");
    pub const MAXP: Self = Self(*b"maxp");
    pub const KERN: Self = Self(*b"kern");
}

impl fmt::Debug for TableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableTag('{self}')")
    }
}

impl fmt::Display for TableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = std::str::from_utf8(&self.0).unwrap_or("????");
        write!(f, "{s}")
    }
}

/// Table directory record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: TableTag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl TableRecord {
    /// First byte past the table
    pub fn end(&self) -> u32 {
        self.offset + self.length
    }

    /// Whether `len` bytes at `offset` (relative to the table) are inside it
    pub fn contains(&self, offset: u32, len: u32) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.length)
    }
}

/// Parsed table directory
#[derive(Debug, Clone)]
pub struct TableDirectory {
    sfnt_version: u32,
    records: Vec<TableRecord>,
}

impl TableDirectory {
    /// Parse the offset table and table records.
    ///
    /// Every record is checked to lie inside the source.
    pub fn parse<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self> {
        let file_len = source.len();
        let mut reader = FontReader::at(source, 0)?;

        let sfnt_version = reader
            .read_u32()
            .map_err(|_| TrueTypeError::InvalidFile("truncated offset table"))?;
        match sfnt_version {
            SFNT_VERSION_TRUETYPE | SFNT_VERSION_APPLE => {}
            SFNT_VERSION_CFF => return Err(TrueTypeError::InvalidFile("CFF outlines are not supported")),
            _ => return Err(TrueTypeError::InvalidFile("bad sfnt version")),
        }

        let num_tables = reader
            .read_u16()
            .map_err(|_| TrueTypeError::InvalidFile("truncated offset table"))?
            as usize;
        if num_tables == 0 || num_tables > MAX_TABLES {
            return Err(TrueTypeError::InvalidFile("table count out of range"));
        }
        // searchRange, entrySelector, rangeShift
        reader
            .skip(6)
            .map_err(|_| TrueTypeError::InvalidFile("truncated offset table"))?;

        let mut records: Vec<TableRecord> = Vec::with_capacity(num_tables);
        for _ in 0..num_tables {
            let record = Self::read_record(&mut reader)
                .map_err(|_| TrueTypeError::InvalidFile("truncated table directory"))?;

            let in_bounds = record
                .offset
                .checked_add(record.length)
                .is_some_and(|end| end <= file_len);
            if !in_bounds {
                return Err(TrueTypeError::InvalidFile("table extends past end of file"));
            }
            if records.iter().any(|r| r.tag == record.tag) {
                return Err(TrueTypeError::InvalidFile("duplicate table tag"));
            }
            records.push(record);
        }

        Ok(Self { sfnt_version, records })
    }

    fn read_record<S: ByteSource + ?Sized>(reader: &mut FontReader<'_, S>) -> Result<TableRecord> {
        Ok(TableRecord {
            tag: TableTag(reader.read_tag()?),
            checksum: reader.read_u32()?,
            offset: reader.read_u32()?,
            length: reader.read_u32()?,
        })
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    pub fn records(&self) -> &[TableRecord] {
        &self.records
    }

    /// Look up an optional table
    pub fn get(&self, tag: TableTag) -> Option<TableRecord> {
        self.records.iter().find(|t| t.tag == tag).copied()
    }

    /// Look up a required table
    pub fn find(&self, tag: TableTag) -> Result<TableRecord> {
        self.get(tag).ok_or(TrueTypeError::TableNotFound(tag))
    }

    /// Recompute every table checksum and compare with the directory
    pub fn verify_checksums<S: ByteSource + ?Sized>(&self, source: &mut S) -> Result<()> {
        for record in &self.records {
            let actual = table_checksum(source, record)?;
            if actual != record.checksum {
                tracing::warn!(
                    "Checksum mismatch in '{}': stored {:#010x}, computed {:#010x}",
                    record.tag,
                    record.checksum,
                    actual
                );
                return Err(TrueTypeError::ChecksumMismatch(record.tag));
            }
        }
        Ok(())
    }
}

/// Sum of the table's big-endian u32 words, zero padded to a 4-byte boundary.
///
/// `head.checkSumAdjustment` counts as zero.
pub fn table_checksum<S: ByteSource + ?Sized>(source: &mut S, record: &TableRecord) -> Result<u32> {
    let mut reader = FontReader::at(source, record.offset)?;
    let mut chunk = [0u8; 64];
    let mut sum = 0u32;
    let mut done = 0u32;

    while done < record.length {
        let take = (record.length - done).min(chunk.len() as u32) as usize;
        // Chunk size is a multiple of 4, so only the final chunk is padded
        chunk[take..].fill(0);
        reader.read_exact(&mut chunk[..take])?;

        let words = take.div_ceil(4);
        for (i, word) in chunk.chunks_exact(4).take(words).enumerate() {
            let word_offset = done + (i as u32) * 4;
            if record.tag == TableTag::HEAD && word_offset == HEAD_CHECKSUM_ADJUSTMENT {
                continue;
            }
            sum = sum.wrapping_add(u32::from_be_bytes([word[0], word[1], word[2], word[3]]));
        }
        done += take as u32;
    }

    Ok(sum)
}

/// Head table (font header)
#[derive(Debug, Clone)]
pub struct HeadTable {
    pub version: u32,
    pub font_revision: u32,
    pub checksum_adjustment: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    /// 0 = short (u16 / 2) offsets, 1 = long (u32) offsets
    pub index_to_loc_format: i16,
}

impl HeadTable {
    pub fn parse<S: ByteSource + ?Sized>(source: &mut S, record: &TableRecord) -> Result<Self> {
        if record.length < 54 {
            return Err(TrueTypeError::InvalidFile("head table too short"));
        }
        let mut r = FontReader::at(source, record.offset)?;
        let version = r.read_u32()?;
        let font_revision = r.read_u32()?;
        let checksum_adjustment = r.read_u32()?;
        let magic = r.read_u32()?;
        if magic != HEAD_MAGIC {
            return Err(TrueTypeError::InvalidFile("bad head magic number"));
        }
        let flags = r.read_u16()?;
        let units_per_em = r.read_u16()?;
        if units_per_em == 0 {
            return Err(TrueTypeError::InvalidFile("unitsPerEm is zero"));
        }
        r.skip(16)?; // created, modified
        let x_min = r.read_i16()?;
        let y_min = r.read_i16()?;
        let x_max = r.read_i16()?;
        let y_max = r.read_i16()?;
        let mac_style = r.read_u16()?;
        let lowest_rec_ppem = r.read_u16()?;
        let _direction_hint = r.read_i16()?;
        let index_to_loc_format = r.read_i16()?;
        if !matches!(index_to_loc_format, 0 | 1) {
            return Err(TrueTypeError::InvalidFile("bad indexToLocFormat"));
        }

        Ok(Self {
            version,
            font_revision,
            checksum_adjustment,
            flags,
            units_per_em,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            index_to_loc_format,
        })
    }
}

/// Hhea table (horizontal header)
#[derive(Debug, Clone)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub number_of_h_metrics: u16,
}

impl HheaTable {
    pub fn parse<S: ByteSource + ?Sized>(source: &mut S, record: &TableRecord) -> Result<Self> {
        if record.length < 36 {
            return Err(TrueTypeError::InvalidFile("hhea table too short"));
        }
        let mut r = FontReader::at(source, record.offset)?;
        r.skip(4)?; // version
        let ascender = r.read_i16()?;
        let descender = r.read_i16()?;
        let line_gap = r.read_i16()?;
        let advance_width_max = r.read_u16()?;
        r.skip(22)?; // bearings, extents, caret, reserved, metricDataFormat
        let number_of_h_metrics = r.read_u16()?;

        Ok(Self {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            number_of_h_metrics,
        })
    }
}

/// Maxp table (maximum profile)
#[derive(Debug, Clone)]
pub struct MaxpTable {
    pub num_glyphs: u16,
}

impl MaxpTable {
    pub fn parse<S: ByteSource + ?Sized>(source: &mut S, record: &TableRecord) -> Result<Self> {
        if record.length < 6 {
            return Err(TrueTypeError::InvalidFile("maxp table too short"));
        }
        let mut r = FontReader::at(source, record.offset)?;
        r.skip(4)?; // version
        let num_glyphs = r.read_u16()?;
        Ok(Self { num_glyphs })
    }
}
