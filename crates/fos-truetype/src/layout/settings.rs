//! Render configuration
//!
//! [`EngineLimits`] sizes the scratch storage once; [`RenderSettings`] is
//! the per-render state changed through validating setters.

use crate::render::{ClipRect, FillRule, Paint, Rotation};
use crate::{Result, TrueTypeError};

/// Capacity configuration for a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    /// Outline points per glyph, compound components included
    pub max_points: usize,
    /// Contours per glyph
    pub max_contours: usize,
    /// Points after curve flattening
    pub max_polyline_points: usize,
    /// Compound glyph nesting
    pub max_component_depth: u8,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_points: 512,
            max_contours: 64,
            max_polyline_points: 4096,
            max_component_depth: 8,
        }
    }
}

impl EngineLimits {
    /// Deepest compound nesting a renderer accepts
    pub const MAX_COMPONENT_DEPTH: u8 = 32;

    pub fn validate(&self) -> Result<()> {
        if self.max_points == 0 || self.max_contours == 0 || self.max_polyline_points == 0 {
            return Err(TrueTypeError::InvalidParameter("engine limits must be non-zero"));
        }
        if self.max_component_depth > Self::MAX_COMPONENT_DEPTH {
            return Err(TrueTypeError::InvalidParameter("component depth limit too large"));
        }
        Ok(())
    }
}

/// Horizontal placement of a string relative to the pen position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Clip boundary for rendered text, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBox {
    pub start_x: i32,
    pub end_x: i32,
    pub end_y: i32,
}

impl Default for TextBox {
    fn default() -> Self {
        Self {
            start_x: 0,
            end_x: i16::MAX as i32,
            end_y: i16::MAX as i32,
        }
    }
}

impl TextBox {
    pub fn clip_rect(&self) -> ClipRect {
        ClipRect {
            x_min: self.start_x,
            y_min: 0,
            x_max: self.end_x,
            y_max: self.end_y,
        }
    }
}

/// Caller-configured render state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    point_size: u16,
    letter_spacing: i16,
    kerning: bool,
    text_box: TextBox,
    outline: Paint,
    interior: Paint,
    rotation: Rotation,
    alignment: Alignment,
    fill_rule: FillRule,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            point_size: 16,
            letter_spacing: 0,
            kerning: true,
            text_box: TextBox::default(),
            outline: Paint::None,
            interior: Paint::Color(1),
            rotation: Rotation::Deg0,
            alignment: Alignment::Left,
            fill_rule: FillRule::NonZero,
        }
    }
}

impl RenderSettings {
    /// Rendered size in pixels per em
    pub fn point_size(&self) -> u16 {
        self.point_size
    }

    pub fn set_point_size(&mut self, size: u16) -> Result<()> {
        if size == 0 {
            return Err(TrueTypeError::InvalidParameter("point size must be positive"));
        }
        self.point_size = size;
        Ok(())
    }

    /// Extra pixels between consecutive glyphs
    pub fn letter_spacing(&self) -> i16 {
        self.letter_spacing
    }

    pub fn set_letter_spacing(&mut self, spacing: i16) {
        self.letter_spacing = spacing;
    }

    pub fn kerning(&self) -> bool {
        self.kerning
    }

    pub fn set_kerning(&mut self, enabled: bool) {
        self.kerning = enabled;
    }

    pub fn text_box(&self) -> TextBox {
        self.text_box
    }

    pub fn set_text_box(&mut self, text_box: TextBox) -> Result<()> {
        if text_box.start_x > text_box.end_x {
            return Err(TrueTypeError::InvalidParameter("text box start_x exceeds end_x"));
        }
        if text_box.end_y < 0 {
            return Err(TrueTypeError::InvalidParameter("text box end_y is negative"));
        }
        self.text_box = text_box;
        Ok(())
    }

    pub fn outline(&self) -> Paint {
        self.outline
    }

    pub fn interior(&self) -> Paint {
        self.interior
    }

    /// Set outline and interior paint; either may be [`Paint::None`]
    pub fn set_colors(&mut self, outline: Paint, interior: Paint) {
        self.outline = outline;
        self.interior = interior;
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = rule;
    }
}
