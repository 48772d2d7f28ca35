//! TrueType font parsing
//!
//! From-scratch sfnt parser that reads through a [`ByteSource`] and keeps
//! only table positions in memory.

pub mod arena;
pub mod cmap;
pub mod fixed_point;
pub mod glyf;
pub mod metrics;
pub mod outline;
pub mod reader;
pub mod source;
pub mod tables;

pub use cmap::{Cmap4, CmapSegment};
pub use glyf::{GlyphDecoder, GlyphHeader, GlyphLocator};
pub use metrics::{HMetric, HorizontalMetrics, KernTable};
pub use outline::{GlyphOutline, OutlineBuilder, OutlinePoint, Point, Polylines};
pub use reader::FontReader;
pub use source::{BufferedSource, ByteSource, MemorySource};
pub use tables::{HeadTable, HheaTable, MaxpTable, TableDirectory, TableRecord, TableTag};

use crate::Result;

/// Glyph identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct GlyphId(pub u16);

/// Bounding box in font units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        i32::from(self.x_max) - i32::from(self.x_min)
    }

    pub fn height(&self) -> i32 {
        i32::from(self.y_max) - i32::from(self.y_min)
    }
}

/// An opened font.
///
/// Holds the byte source plus the parsed directory and fixed tables. The
/// structure is immutable after [`Font::open`]; lookups take `&mut self`
/// only because reading moves the source position.
pub struct Font<S> {
    source: S,
    directory: TableDirectory,
    head: HeadTable,
    hhea: HheaTable,
    maxp: MaxpTable,
    cmap: Cmap4,
    hmtx: HorizontalMetrics,
    kern: Option<KernTable>,
    glyphs: GlyphLocator,
}

impl<B: AsRef<[u8]>> Font<MemorySource<B>> {
    /// Open a font held in memory
    pub fn from_bytes(data: B, verify_checksums: bool) -> Result<Self> {
        Self::open(MemorySource::new(data), verify_checksums)
    }
}

impl<S: ByteSource> Font<S> {
    /// Parse the table directory and required tables.
    ///
    /// With `verify_checksums`, every table checksum is recomputed first.
    /// Any failure rejects the whole font.
    pub fn open(mut source: S, verify_checksums: bool) -> Result<Self> {
        let directory = TableDirectory::parse(&mut source)?;
        if verify_checksums {
            directory.verify_checksums(&mut source)?;
        }

        let head = HeadTable::parse(&mut source, &directory.find(TableTag::HEAD)?)?;
        let hhea = HheaTable::parse(&mut source, &directory.find(TableTag::HHEA)?)?;
        let maxp = MaxpTable::parse(&mut source, &directory.find(TableTag::MAXP)?)?;
        let cmap = Cmap4::locate(&mut source, &directory.find(TableTag::CMAP)?)?;
        let hmtx = HorizontalMetrics::new(
            directory.find(TableTag::HMTX)?,
            hhea.number_of_h_metrics,
            maxp.num_glyphs,
        )?;
        let glyphs = GlyphLocator::new(
            directory.find(TableTag::LOCA)?,
            directory.find(TableTag::GLYF)?,
            head.index_to_loc_format,
            maxp.num_glyphs,
        )?;

        // Kerning is optional; a broken kern table only disables kerning
        let kern = match directory.get(TableTag::KERN) {
            Some(record) => KernTable::locate(&mut source, &record).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable kern table: {}", e);
                None
            }),
            None => None,
        };

        tracing::debug!(
            "Opened font: {} tables, {} glyphs, {} units/em, kerning pairs: {}",
            directory.records().len(),
            maxp.num_glyphs,
            head.units_per_em,
            kern.as_ref().map_or(0, KernTable::len)
        );

        Ok(Self {
            source,
            directory,
            head,
            hhea,
            maxp,
            cmap,
            hmtx,
            kern,
            glyphs,
        })
    }

    /// Recompute all table checksums against the directory
    pub fn verify_checksums(&mut self) -> Result<()> {
        self.directory.verify_checksums(&mut self.source)
    }

    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    pub fn head(&self) -> &HeadTable {
        &self.head
    }

    /// Units per em
    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    /// Number of glyphs
    pub fn number_of_glyphs(&self) -> u16 {
        self.maxp.num_glyphs
    }

    /// Ascender
    pub fn ascender(&self) -> i16 {
        self.hhea.ascender
    }

    /// Descender
    pub fn descender(&self) -> i16 {
        self.hhea.descender
    }

    /// Line gap
    pub fn line_gap(&self) -> i16 {
        self.hhea.line_gap
    }

    pub fn cmap(&self) -> &Cmap4 {
        &self.cmap
    }

    pub fn has_kerning(&self) -> bool {
        self.kern.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Get glyph ID for a code point
    pub fn glyph_index(&mut self, codepoint: u32) -> Result<GlyphId> {
        self.cmap.resolve(&mut self.source, codepoint)
    }

    /// Decode one cmap segment
    pub fn cmap_segment(&mut self, index: u16) -> Result<CmapSegment> {
        self.cmap.segment(&mut self.source, index)
    }

    /// Advance width and left side bearing
    pub fn h_metric(&mut self, glyph: GlyphId) -> Result<HMetric> {
        self.hmtx.get(&mut self.source, glyph)
    }

    /// Get glyph horizontal advance
    pub fn advance_width(&mut self, glyph: GlyphId) -> Result<u16> {
        self.h_metric(glyph).map(|m| m.advance_width)
    }

    /// Kerning adjustment between two glyphs; 0 without a usable kern table
    pub fn kerning(&mut self, left: GlyphId, right: GlyphId) -> Result<i16> {
        match &self.kern {
            Some(kern) => kern.lookup(&mut self.source, left, right),
            None => Ok(0),
        }
    }

    /// Get glyph bounding box from its header
    pub fn glyph_bounds(&mut self, glyph: GlyphId) -> Result<Option<BoundingBox>> {
        GlyphDecoder::header(&mut self.source, &self.glyphs, glyph).map(|h| h.map(|h| h.bounds))
    }

    /// Decode a glyph outline into caller-owned scratch storage
    pub fn decode_glyph(
        &mut self,
        glyph: GlyphId,
        decoder: &mut GlyphDecoder,
        outline: &mut GlyphOutline,
    ) -> Result<()> {
        decoder.decode(&mut self.source, &self.glyphs, glyph, outline)
    }

    /// Give the byte source back
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S> std::fmt::Debug for Font<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("tables", &self.directory.records().len())
            .field("units_per_em", &self.head.units_per_em)
            .field("num_glyphs", &self.maxp.num_glyphs)
            .finish_non_exhaustive()
    }
}
