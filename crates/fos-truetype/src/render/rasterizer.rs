//! Scanline glyph rasterization
//!
//! Converts flattened outlines to pixels through a [`LineDrawer`]:
//! - FUnit to pixel scaling, quadrant rotation and translation
//! - Outline stroking with per-segment clipping
//! - Interior fill by scanline intersection with a winding rule

use crate::font::arena::FixedArena;
use crate::font::outline::{Point, Polylines};
use crate::{Result, TrueTypeError};

/// Pixel output capability.
///
/// The engine never touches framebuffer memory; every pixel it produces is
/// a line (often a single-row span) handed to this trait.
pub trait LineDrawer {
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32);
}

impl<F: FnMut(i32, i32, i32, i32, u32)> LineDrawer for F {
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        self(x0, y0, x1, y1, color)
    }
}

/// Paint for the outline or interior pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Paint {
    /// Skip the pass
    #[default]
    None,
    Color(u32),
}

impl Paint {
    pub fn color(self) -> Option<u32> {
        match self {
            Paint::None => None,
            Paint::Color(c) => Some(c),
        }
    }
}

/// Text rotation in quarter turns, clockwise on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u16) -> Result<Self> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(TrueTypeError::InvalidParameter("rotation must be 0, 90, 180 or 270")),
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Rotate a screen-space vector (y grows downward)
    #[inline]
    pub fn apply(self, x: f32, y: f32) -> (f32, f32) {
        match self {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (-y, x),
            Rotation::Deg180 => (-x, -y),
            Rotation::Deg270 => (y, -x),
        }
    }
}

/// Interior test for the fill pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// TrueType convention: inside where the winding count is non-zero
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    #[inline]
    fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding & 1 != 0,
        }
    }
}

/// Inclusive pixel clip rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl ClipRect {
    pub const UNBOUNDED: ClipRect = ClipRect {
        x_min: i16::MIN as i32,
        y_min: i16::MIN as i32,
        x_max: i16::MAX as i32,
        y_max: i16::MAX as i32,
    };

    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }

    /// Liang-Barsky segment clip
    fn clip_line(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(f32, f32, f32, f32)> {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let mut t0 = 0.0f32;
        let mut t1 = 1.0f32;
        let bounds = [
            (-dx, x0 - self.x_min as f32),
            (dx, self.x_max as f32 - x0),
            (-dy, y0 - self.y_min as f32),
            (dy, self.y_max as f32 - y0),
        ];
        for (p, q) in bounds {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        Some((x0 + t0 * dx, y0 + t0 * dy, x0 + t1 * dx, y0 + t1 * dy))
    }
}

/// Maps font units to screen pixels for one glyph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphTransform {
    /// Pixels per font unit (`point_size / units_per_em`)
    pub scale: f32,
    /// Distance in pixels from the glyph origin down to the baseline
    pub baseline: f32,
    /// Screen position of the glyph origin (top of the line box)
    pub origin_x: f32,
    pub origin_y: f32,
    pub rotation: Rotation,
}

impl GlyphTransform {
    #[inline]
    pub fn apply(&self, p: Point) -> (f32, f32) {
        // Font space is y-up; screen space is y-down
        let lx = p.x * self.scale;
        let ly = self.baseline - p.y * self.scale;
        let (rx, ry) = self.rotation.apply(lx, ly);
        (self.origin_x + rx, self.origin_y + ry)
    }
}

/// Colours, fill rule and clip for one render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillStyle {
    pub outline: Paint,
    pub interior: Paint,
    pub rule: FillRule,
    pub clip: ClipRect,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f32,
    y0: f32,
    y1: f32,
    dxdy: f32,
    /// +1 when the edge runs up the screen, -1 when it runs down
    dir: i32,
}

#[derive(Debug, Clone, Copy)]
struct Crossing {
    x: f32,
    dir: i32,
}

/// Scanline filler with preallocated edge and crossing tables
#[derive(Debug, Clone)]
pub struct ScanFiller {
    edges: FixedArena<Edge>,
    crossings: FixedArena<Crossing>,
}

impl ScanFiller {
    pub fn new(max_edges: usize) -> Self {
        Self {
            edges: FixedArena::with_capacity(max_edges),
            crossings: FixedArena::with_capacity(max_edges),
        }
    }

    /// Draw `lines` through `drawer`.
    ///
    /// The interior pass runs first so the outline stays visible on top.
    /// Returns the number of lines handed to the drawer.
    pub fn render<D: LineDrawer + ?Sized>(
        &mut self,
        lines: &Polylines,
        transform: &GlyphTransform,
        style: &FillStyle,
        drawer: &mut D,
    ) -> Result<usize> {
        let mut drawn = 0;
        if let Some(color) = style.interior.color() {
            drawn += self.fill(lines, transform, style, color, drawer)?;
        }
        if let Some(color) = style.outline.color() {
            drawn += Self::stroke(lines, transform, &style.clip, color, drawer);
        }
        Ok(drawn)
    }

    fn stroke<D: LineDrawer + ?Sized>(
        lines: &Polylines,
        transform: &GlyphTransform,
        clip: &ClipRect,
        color: u32,
        drawer: &mut D,
    ) -> usize {
        let mut drawn = 0;
        for contour in lines.contours() {
            for pair in contour.windows(2) {
                let (x0, y0) = transform.apply(pair[0]);
                let (x1, y1) = transform.apply(pair[1]);
                if let Some((x0, y0, x1, y1)) = clip.clip_line(x0, y0, x1, y1) {
                    drawer.draw_line(
                        x0.round() as i32,
                        y0.round() as i32,
                        x1.round() as i32,
                        y1.round() as i32,
                        color,
                    );
                    drawn += 1;
                }
            }
        }
        drawn
    }

    fn fill<D: LineDrawer + ?Sized>(
        &mut self,
        lines: &Polylines,
        transform: &GlyphTransform,
        style: &FillStyle,
        color: u32,
        drawer: &mut D,
    ) -> Result<usize> {
        self.edges.clear();
        let mut y_top = f32::MAX;
        let mut y_bottom = f32::MIN;

        for contour in lines.contours() {
            for pair in contour.windows(2) {
                let (x0, y0) = transform.apply(pair[0]);
                let (x1, y1) = transform.apply(pair[1]);
                // Horizontal edges never cross a scanline
                if y0 == y1 {
                    continue;
                }
                let edge = Edge {
                    x0,
                    y0,
                    y1,
                    dxdy: (x1 - x0) / (y1 - y0),
                    dir: if y1 < y0 { 1 } else { -1 },
                };
                self.edges
                    .alloc(edge)
                    .map_err(|_| TrueTypeError::Malformed("too many edges in glyph"))?;
                y_top = y_top.min(y0.min(y1));
                y_bottom = y_bottom.max(y0.max(y1));
            }
        }
        if self.edges.is_empty() {
            return Ok(0);
        }

        // Row r is sampled at its centre r + 0.5
        let first_row = ((y_top - 0.5).ceil() as i32).max(style.clip.y_min);
        let last_row = ((y_bottom - 0.5).ceil() as i32 - 1).min(style.clip.y_max);

        let mut drawn = 0;
        for row in first_row..=last_row {
            let sy = row as f32 + 0.5;
            self.crossings.clear();
            for edge in self.edges.iter() {
                let (lo, hi) = if edge.y0 < edge.y1 { (edge.y0, edge.y1) } else { (edge.y1, edge.y0) };
                if sy < lo || sy >= hi {
                    continue;
                }
                let x = edge.x0 + (sy - edge.y0) * edge.dxdy;
                self.crossings
                    .alloc(Crossing { x, dir: edge.dir })
                    .map_err(|_| TrueTypeError::Malformed("too many scanline crossings"))?;
            }
            self.crossings
                .as_mut_slice()
                .sort_unstable_by(|a, b| a.x.total_cmp(&b.x));

            let mut winding = 0;
            let mut span_start = 0.0f32;
            for crossing in self.crossings.iter() {
                let was_inside = style.rule.is_inside(winding);
                winding += crossing.dir;
                let inside = style.rule.is_inside(winding);
                if !was_inside && inside {
                    span_start = crossing.x;
                } else if was_inside && !inside {
                    drawn += Self::span(span_start, crossing.x, row, &style.clip, color, drawer);
                }
            }
        }
        Ok(drawn)
    }

    /// Fill pixels whose centres lie in `[xa, xb)`
    fn span<D: LineDrawer + ?Sized>(xa: f32, xb: f32, row: i32, clip: &ClipRect, color: u32, drawer: &mut D) -> usize {
        let start = ((xa - 0.5).ceil() as i32).max(clip.x_min);
        let end = ((xb - 0.5).ceil() as i32 - 1).min(clip.x_max);
        if start > end {
            return 0;
        }
        drawer.draw_line(start, row, end, row, color);
        1
    }
}
