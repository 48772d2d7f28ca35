//! Text layout driver
//!
//! [`TextRenderer`] walks a code point sequence, resolves and decodes each
//! glyph, advances the pen by advance width, kerning and letter spacing,
//! and hands every outline to the scan filler.

mod settings;

pub use settings::{Alignment, EngineLimits, RenderSettings, TextBox};
pub use crate::render::{Paint, Rotation};

use crate::font::{ByteSource, Font, GlyphDecoder, GlyphId, GlyphOutline, HMetric, Polylines};
use crate::render::{FillStyle, GlyphTransform, LineDrawer, ScanFiller};
use crate::text::code_points_utf8;
use crate::Result;

/// Pixel box of one character relative to its pen position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharBox {
    /// Horizontal advance
    pub advance: i32,
    /// Offset from the pen to the left edge of the outline
    pub left: i32,
    /// Offset from the top of the line box to the top of the outline
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// Renders strings of one font.
///
/// Owns the font, the render settings and all glyph scratch storage. The
/// scratch is allocated once from [`EngineLimits`]; rendering never grows
/// it. One renderer draws one string at a time.
pub struct TextRenderer<S> {
    font: Font<S>,
    settings: RenderSettings,
    limits: EngineLimits,
    decoder: GlyphDecoder,
    outline: GlyphOutline,
    lines: Polylines,
    filler: ScanFiller,
}

impl<S: ByteSource> TextRenderer<S> {
    /// Create a renderer with default limits and settings
    pub fn new(font: Font<S>) -> Self {
        Self::build(font, EngineLimits::default())
    }

    /// Create a renderer with custom scratch capacities
    pub fn with_limits(font: Font<S>, limits: EngineLimits) -> Result<Self> {
        limits.validate()?;
        Ok(Self::build(font, limits))
    }

    fn build(font: Font<S>, limits: EngineLimits) -> Self {
        Self {
            font,
            settings: RenderSettings::default(),
            limits,
            decoder: GlyphDecoder::new(limits.max_points, limits.max_component_depth),
            outline: GlyphOutline::with_capacity(limits.max_points, limits.max_contours),
            lines: Polylines::with_capacity(limits.max_polyline_points, limits.max_contours),
            filler: ScanFiller::new(limits.max_polyline_points),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.settings
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    pub fn font(&self) -> &Font<S> {
        &self.font
    }

    pub fn font_mut(&mut self) -> &mut Font<S> {
        &mut self.font
    }

    pub fn into_font(self) -> Font<S> {
        self.font
    }

    /// Pixels per font unit at the current point size
    pub fn scale(&self) -> f32 {
        f32::from(self.settings.point_size()) / f32::from(self.font.units_per_em())
    }

    /// Distance between baselines in pixels
    pub fn line_height(&self) -> i32 {
        let units = i32::from(self.font.ascender()) - i32::from(self.font.descender())
            + i32::from(self.font.line_gap());
        (units as f32 * self.scale()).round() as i32
    }

    /// Kerning plus letter spacing between two consecutive glyphs, in pixels
    fn pair_gap(&mut self, prev: Option<GlyphId>, glyph: GlyphId, scale: f32) -> f32 {
        let Some(prev) = prev else {
            return 0.0;
        };
        let mut gap = f32::from(self.settings.letter_spacing());
        if self.settings.kerning() {
            match self.font.kerning(prev, glyph) {
                Ok(kern) => gap += f32::from(kern) * scale,
                Err(e) => tracing::debug!("Kerning lookup failed for {:?}/{:?}: {}", prev, glyph, e),
            }
        }
        gap
    }

    /// Width of `code_points` in pixels.
    ///
    /// Unmapped code points contribute nothing and break the kerning chain.
    pub fn measure_string(&mut self, code_points: &[u32]) -> i32 {
        self.measure(code_points.iter().copied()).round() as i32
    }

    pub fn measure_str(&mut self, text: &str) -> i32 {
        self.measure(code_points_utf8(text.as_bytes())).round() as i32
    }

    fn measure(&mut self, code_points: impl Iterator<Item = u32>) -> f32 {
        let scale = self.scale();
        let mut width = 0.0f32;
        let mut prev = None;
        for cp in code_points {
            let Ok(glyph) = self.font.glyph_index(cp) else {
                prev = None;
                continue;
            };
            let Ok(advance) = self.font.advance_width(glyph) else {
                prev = None;
                continue;
            };
            width += self.pair_gap(prev, glyph, scale) + f32::from(advance) * scale;
            prev = Some(glyph);
        }
        width
    }

    /// Draw `code_points` with the top-left of the line box at `(x, y)`.
    ///
    /// Returns the advance in pixels. Glyphs that fail to resolve or decode
    /// are skipped; the call itself never fails.
    pub fn draw_string<D: LineDrawer + ?Sized>(&mut self, x: i32, y: i32, code_points: &[u32], drawer: &mut D) -> i32 {
        self.draw(x, y, code_points.iter().copied(), drawer)
    }

    pub fn draw_str<D: LineDrawer + ?Sized>(&mut self, x: i32, y: i32, text: &str, drawer: &mut D) -> i32 {
        self.draw(x, y, code_points_utf8(text.as_bytes()), drawer)
    }

    fn draw<I, D>(&mut self, x: i32, y: i32, code_points: I, drawer: &mut D) -> i32
    where
        I: Iterator<Item = u32> + Clone,
        D: LineDrawer + ?Sized,
    {
        let scale = self.scale();
        let rotation = self.settings.rotation();
        let (dir_x, dir_y) = rotation.apply(1.0, 0.0);

        let shift = match self.settings.alignment() {
            Alignment::Left => 0.0,
            Alignment::Center => self.measure(code_points.clone()) * 0.5,
            Alignment::Right => self.measure(code_points.clone()),
        };
        let mut pen_x = x as f32 - dir_x * shift;
        let mut pen_y = y as f32 - dir_y * shift;
        let mut advance = 0.0f32;
        let mut prev = None;
        let mut drawn = 0usize;
        let mut skipped = 0usize;

        for cp in code_points {
            drawn += 1;
            let (glyph, metric) = match self.prepare(cp) {
                Ok(placed) => placed,
                Err(e) => {
                    tracing::debug!("Skipping code point U+{:04X}: {}", cp, e);
                    skipped += 1;
                    prev = None;
                    continue;
                }
            };

            let gap = self.pair_gap(prev, glyph, scale);
            pen_x += dir_x * gap;
            pen_y += dir_y * gap;
            advance += gap;

            if let Err(e) = self.render_current(pen_x, pen_y, drawer) {
                tracing::debug!("Failed to fill glyph {:?}: {}", glyph, e);
            }

            let step = f32::from(metric.advance_width) * scale;
            pen_x += dir_x * step;
            pen_y += dir_y * step;
            advance += step;
            prev = Some(glyph);
        }

        tracing::trace!(
            "Drew {} code points ({} skipped), advance {:.1}px",
            drawn,
            skipped,
            advance
        );
        advance.round() as i32
    }

    /// Decode one character and draw it with its line box at `(x, y)`.
    ///
    /// Unlike the string calls this reports per-glyph failures. Returns the
    /// advance in pixels.
    pub fn draw_char<D: LineDrawer + ?Sized>(&mut self, x: i32, y: i32, code_point: u32, drawer: &mut D) -> Result<i32> {
        let (_, metric) = self.prepare(code_point)?;
        self.render_current(x as f32, y as f32, drawer)?;
        Ok((f32::from(metric.advance_width) * self.scale()).round() as i32)
    }

    /// Resolve, decode and flatten one code point into scratch
    fn prepare(&mut self, code_point: u32) -> Result<(GlyphId, HMetric)> {
        let glyph = self.font.glyph_index(code_point)?;
        let metric = self.font.h_metric(glyph)?;
        self.font.decode_glyph(glyph, &mut self.decoder, &mut self.outline)?;
        self.lines.build_contours(&self.outline)?;
        Ok((glyph, metric))
    }

    /// Fill the flattened glyph held in scratch at a pen position
    fn render_current<D: LineDrawer + ?Sized>(&mut self, pen_x: f32, pen_y: f32, drawer: &mut D) -> Result<usize> {
        let scale = self.scale();
        let transform = GlyphTransform {
            scale,
            baseline: f32::from(self.font.ascender()) * scale,
            origin_x: pen_x,
            origin_y: pen_y,
            rotation: self.settings.rotation(),
        };
        let style = FillStyle {
            outline: self.settings.outline(),
            interior: self.settings.interior(),
            rule: self.settings.fill_rule(),
            clip: self.settings.text_box().clip_rect(),
        };
        self.filler.render(&self.lines, &transform, &style, drawer)
    }

    /// Pixel box of one character, unrotated
    pub fn char_box(&mut self, code_point: u32) -> Result<CharBox> {
        let scale = self.scale();
        let glyph = self.font.glyph_index(code_point)?;
        let metric = self.font.h_metric(glyph)?;
        let px = |units: i32| (units as f32 * scale).round() as i32;

        let mut char_box = CharBox {
            advance: px(i32::from(metric.advance_width)),
            ..CharBox::default()
        };
        if let Some(bounds) = self.font.glyph_bounds(glyph)? {
            char_box.left = px(i32::from(bounds.x_min));
            char_box.top = px(i32::from(self.font.ascender()) - i32::from(bounds.y_max));
            char_box.width = px(bounds.width());
            char_box.height = px(bounds.height());
        }
        Ok(char_box)
    }
}

impl<S> std::fmt::Debug for TextRenderer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("font", &self.font)
            .field("settings", &self.settings)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
