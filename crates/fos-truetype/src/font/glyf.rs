//! Glyph outline parsing (glyf/loca tables)

use std::ops::Range;

use super::arena::FixedArena;
use super::outline::{GlyphOutline, OutlinePoint};
use super::reader::FontReader;
use super::source::ByteSource;
use super::tables::TableRecord;
use super::{BoundingBox, GlyphId};
use crate::{Result, TrueTypeError};

// Simple glyph point flags
const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;

// Compound glyph component flags
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const SCALED_COMPONENT_OFFSET: u16 = 0x0800;
const UNSCALED_COMPONENT_OFFSET: u16 = 0x1000;

/// Size of the glyph header (numberOfContours + bounding box)
const GLYPH_HEADER_SIZE: u32 = 10;

/// Resolves glyph byte ranges through `loca`
#[derive(Debug, Clone)]
pub struct GlyphLocator {
    loca: TableRecord,
    glyf: TableRecord,
    long_offsets: bool,
    num_glyphs: u16,
}

impl GlyphLocator {
    pub fn new(loca: TableRecord, glyf: TableRecord, index_to_loc_format: i16, num_glyphs: u16) -> Result<Self> {
        let long_offsets = index_to_loc_format == 1;
        let entry = if long_offsets { 4 } else { 2 };
        if !loca.contains(0, (u32::from(num_glyphs) + 1) * entry) {
            return Err(TrueTypeError::InvalidFile("loca table too short"));
        }
        Ok(Self { loca, glyf, long_offsets, num_glyphs })
    }

    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }

    fn loca_entry<S: ByteSource + ?Sized>(&self, source: &mut S, index: u32) -> Result<u32> {
        if self.long_offsets {
            FontReader::at(source, self.loca.offset + index * 4)?.read_u32()
        } else {
            // Short format stores offset / 2
            Ok(u32::from(FontReader::at(source, self.loca.offset + index * 2)?.read_u16()?) * 2)
        }
    }

    /// Absolute byte range of a glyph, `None` for glyphs without outline
    pub fn glyph_range<S: ByteSource + ?Sized>(&self, source: &mut S, glyph: GlyphId) -> Result<Option<Range<u32>>> {
        if glyph.0 >= self.num_glyphs {
            return Err(TrueTypeError::GlyphNotFound);
        }
        let start = self.loca_entry(source, u32::from(glyph.0))?;
        let end = self.loca_entry(source, u32::from(glyph.0) + 1)?;
        if start > end || end > self.glyf.length {
            return Err(TrueTypeError::Malformed("glyph offset out of bounds"));
        }
        if start == end {
            // Empty glyph (space, etc.)
            return Ok(None);
        }
        if end - start < GLYPH_HEADER_SIZE {
            return Err(TrueTypeError::Malformed("glyph header truncated"));
        }
        Ok(Some(self.glyf.offset + start..self.glyf.offset + end))
    }
}

/// Glyph record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphHeader {
    /// Negative for compound glyphs
    pub number_of_contours: i16,
    pub bounds: BoundingBox,
}

impl GlyphHeader {
    fn read<S: ByteSource + ?Sized>(reader: &mut FontReader<'_, S>) -> Result<Self> {
        let number_of_contours = reader.read_i16()?;
        let bounds = BoundingBox {
            x_min: reader.read_i16()?,
            y_min: reader.read_i16()?,
            x_max: reader.read_i16()?,
            y_max: reader.read_i16()?,
        };
        Ok(Self { number_of_contours, bounds })
    }

    pub fn is_compound(&self) -> bool {
        self.number_of_contours < 0
    }
}

/// Decodes `glyf` records into a [`GlyphOutline`].
///
/// Holds the flag scratch buffer so decoding never allocates.
#[derive(Debug, Clone)]
pub struct GlyphDecoder {
    flags: FixedArena<u8>,
    max_depth: u8,
}

impl GlyphDecoder {
    pub fn new(max_points: usize, max_depth: u8) -> Self {
        Self {
            flags: FixedArena::with_capacity(max_points),
            max_depth,
        }
    }

    /// Read just the header of a glyph
    pub fn header<S: ByteSource + ?Sized>(
        source: &mut S,
        locator: &GlyphLocator,
        glyph: GlyphId,
    ) -> Result<Option<GlyphHeader>> {
        let Some(range) = locator.glyph_range(source, glyph)? else {
            return Ok(None);
        };
        let mut reader = FontReader::at(source, range.start)?;
        GlyphHeader::read(&mut reader).map(Some)
    }

    /// Decode `glyph` into `outline`, replacing its contents.
    ///
    /// On error the outline is left empty.
    pub fn decode<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        locator: &GlyphLocator,
        glyph: GlyphId,
        outline: &mut GlyphOutline,
    ) -> Result<()> {
        outline.clear();
        let result = self.decode_glyph(source, locator, glyph, 0, outline);
        if result.is_err() {
            outline.clear();
        }
        result
    }

    fn decode_glyph<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        locator: &GlyphLocator,
        glyph: GlyphId,
        depth: u8,
        outline: &mut GlyphOutline,
    ) -> Result<()> {
        if depth > self.max_depth {
            return Err(TrueTypeError::Malformed("component nesting too deep"));
        }
        let Some(range) = locator.glyph_range(source, glyph)? else {
            return Ok(());
        };

        let mut reader = FontReader::at(source, range.start)?;
        let header = GlyphHeader::read(&mut reader)?;
        if depth == 0 {
            outline.set_bounds(header.bounds);
        }

        if header.is_compound() {
            let components = reader.pos();
            drop(reader);
            self.decode_compound(source, locator, components, depth, outline)
        } else {
            self.decode_simple(&mut reader, header.number_of_contours as u16, outline)?;
            if reader.pos() > range.end {
                return Err(TrueTypeError::Malformed("glyph data overruns its loca range"));
            }
            Ok(())
        }
    }

    /// Parse simple glyph outline
    fn decode_simple<S: ByteSource + ?Sized>(
        &mut self,
        reader: &mut FontReader<'_, S>,
        num_contours: u16,
        outline: &mut GlyphOutline,
    ) -> Result<()> {
        if num_contours == 0 {
            return Ok(());
        }
        let base = outline.num_points();

        // Read end points of contours
        let mut last_end: Option<u16> = None;
        for _ in 0..num_contours {
            let end = reader.read_u16()?;
            if last_end.is_some_and(|prev| end <= prev) {
                return Err(TrueTypeError::Malformed("contour end points not increasing"));
            }
            outline.push_contour_end(base + usize::from(end) + 1)?;
            last_end = Some(end);
        }
        let num_points = last_end.map_or(0, |end| usize::from(end) + 1);
        if base + num_points > outline.point_capacity() {
            tracing::debug!(
                "Glyph needs {} points, capacity is {}",
                base + num_points,
                outline.point_capacity()
            );
            return Err(TrueTypeError::Malformed("too many points in glyph"));
        }

        // Skip instructions
        let instruction_length = reader.read_u16()?;
        reader.skip(u32::from(instruction_length))?;

        // Read flags
        self.flags.clear();
        while self.flags.len() < num_points {
            let flag = reader.read_u8()?;
            self.push_flag(flag)?;
            if flag & REPEAT != 0 {
                let repeat_count = reader.read_u8()?;
                for _ in 0..repeat_count {
                    if self.flags.len() >= num_points {
                        return Err(TrueTypeError::Malformed("flag repeat overruns point count"));
                    }
                    self.push_flag(flag)?;
                }
            }
        }

        // Read x coordinates; deltas run across all contours
        let mut x = 0i32;
        for &flag in self.flags.iter() {
            x += read_delta(reader, flag, X_SHORT, X_SAME_OR_POSITIVE)?;
            outline.push_point(OutlinePoint {
                x: x as f32,
                y: 0.0,
                on_curve: flag & ON_CURVE != 0,
            })?;
        }

        // Read y coordinates
        let mut y = 0i32;
        let points = &mut outline.points_mut()[base..];
        for (point, &flag) in points.iter_mut().zip(self.flags.iter()) {
            y += read_delta(reader, flag, Y_SHORT, Y_SAME_OR_POSITIVE)?;
            point.y = y as f32;
        }

        Ok(())
    }

    fn push_flag(&mut self, flag: u8) -> Result<()> {
        self.flags
            .alloc(flag)
            .map(|_| ())
            .map_err(|_| TrueTypeError::Malformed("too many points in glyph"))
    }

    /// Parse compound glyph outline, recursing into each component
    fn decode_compound<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        locator: &GlyphLocator,
        mut pos: u32,
        depth: u8,
        outline: &mut GlyphOutline,
    ) -> Result<()> {
        let compound_base = outline.num_points();

        loop {
            let mut reader = FontReader::at(source, pos)?;
            let component = Component::read(&mut reader)?;
            pos = reader.pos();
            drop(reader);

            let start = outline.num_points();
            let contours = outline.num_contours();
            let child_depth = depth
                .checked_add(1)
                .ok_or(TrueTypeError::Malformed("component nesting too deep"))?;
            match self.decode_glyph(source, locator, component.glyph, child_depth, outline) {
                Ok(()) => {}
                Err(TrueTypeError::GlyphNotFound) => {
                    return Err(TrueTypeError::Malformed("component glyph out of range"));
                }
                Err(e) => return Err(e),
            }

            let matrix = component.matrix;
            let points = &mut outline.points_mut()[start..];
            if !matrix.is_identity() {
                for p in points.iter_mut() {
                    (p.x, p.y) = matrix.apply(p.x, p.y);
                }
            }

            let (dx, dy) = match component.placement {
                Placement::Offset { dx, dy } => {
                    let scaled = component.flags & SCALED_COMPONENT_OFFSET != 0
                        && component.flags & UNSCALED_COMPONENT_OFFSET == 0;
                    if scaled { matrix.apply(dx, dy) } else { (dx, dy) }
                }
                Placement::MatchPoints { parent, child } => {
                    let parent = compound_base + usize::from(parent);
                    let child = start + usize::from(child);
                    let all = outline.points();
                    if parent >= start || child >= all.len() {
                        return Err(TrueTypeError::Malformed("component anchor point out of range"));
                    }
                    (all[parent].x - all[child].x, all[parent].y - all[child].y)
                }
            };
            if dx != 0.0 || dy != 0.0 {
                for p in &mut outline.points_mut()[start..] {
                    p.x += dx;
                    p.y += dy;
                }
            }

            tracing::trace!(
                "Component glyph {} placed: {} points, {} contours",
                component.glyph.0,
                outline.num_points() - start,
                outline.num_contours() - contours
            );

            if component.flags & MORE_COMPONENTS == 0 {
                return Ok(());
            }
        }
    }
}

/// Read one coordinate delta selected by the SHORT/SAME flag bits
fn read_delta<S: ByteSource + ?Sized>(
    reader: &mut FontReader<'_, S>,
    flag: u8,
    short: u8,
    same_or_positive: u8,
) -> Result<i32> {
    if flag & short != 0 {
        let d = i32::from(reader.read_u8()?);
        Ok(if flag & same_or_positive != 0 { d } else { -d })
    } else if flag & same_or_positive != 0 {
        Ok(0)
    } else {
        Ok(i32::from(reader.read_i16()?))
    }
}

/// 2x2 component transform
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    xx: f32,
    yx: f32,
    xy: f32,
    yy: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix { xx: 1.0, yx: 0.0, xy: 0.0, yy: 1.0 };

    fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.xx * x + self.xy * y, self.yx * x + self.yy * y)
    }
}

#[derive(Debug, Clone, Copy)]
enum Placement {
    Offset { dx: f32, dy: f32 },
    MatchPoints { parent: u16, child: u16 },
}

#[derive(Debug, Clone, Copy)]
struct Component {
    flags: u16,
    glyph: GlyphId,
    placement: Placement,
    matrix: Matrix,
}

impl Component {
    fn read<S: ByteSource + ?Sized>(r: &mut FontReader<'_, S>) -> Result<Self> {
        let flags = r.read_u16()?;
        let glyph = GlyphId(r.read_u16()?);

        let xy = flags & ARGS_ARE_XY_VALUES != 0;
        let placement = match (flags & ARG_1_AND_2_ARE_WORDS != 0, xy) {
            (true, true) => Placement::Offset {
                dx: f32::from(r.read_i16()?),
                dy: f32::from(r.read_i16()?),
            },
            (true, false) => Placement::MatchPoints {
                parent: r.read_u16()?,
                child: r.read_u16()?,
            },
            (false, true) => Placement::Offset {
                dx: f32::from(r.read_i8()?),
                dy: f32::from(r.read_i8()?),
            },
            (false, false) => Placement::MatchPoints {
                parent: u16::from(r.read_u8()?),
                child: u16::from(r.read_u8()?),
            },
        };

        let matrix = if flags & WE_HAVE_A_SCALE != 0 {
            let s = r.read_f2dot14()?.to_f32();
            Matrix { xx: s, yx: 0.0, xy: 0.0, yy: s }
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            let xx = r.read_f2dot14()?.to_f32();
            let yy = r.read_f2dot14()?.to_f32();
            Matrix { xx, yx: 0.0, xy: 0.0, yy }
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            // Stored as xscale, scale01, scale10, yscale
            let xx = r.read_f2dot14()?.to_f32();
            let yx = r.read_f2dot14()?.to_f32();
            let xy = r.read_f2dot14()?.to_f32();
            let yy = r.read_f2dot14()?.to_f32();
            Matrix { xx, yx, xy, yy }
        } else {
            Matrix::IDENTITY
        };

        Ok(Self { flags, glyph, placement, matrix })
    }
}
