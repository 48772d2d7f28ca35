//! fOS TrueType - Allocation-free Font Engine
//!
//! This crate turns raw `.ttf` bytes into pixels for constrained targets:
//! - Table directory parsing and checksum validation
//! - Character mapping (cmap format 4)
//! - Horizontal metrics and format-0 kerning
//! - Simple and compound glyph decoding from `glyf`/`loca`
//! - Quadratic curve flattening and winding-rule scan conversion
//! - Text layout with point size, spacing, kerning and quadrant rotation
//!
//! All per-glyph working memory is allocated once, from [`EngineLimits`],
//! when a [`TextRenderer`] is built. Pixels leave the engine only through a
//! caller-supplied [`LineDrawer`].
//!
//! # Example
//! ```rust,ignore
//! use fos_truetype::{Font, MemorySource, TextRenderer, Framebuffer, BitDepth};
//!
//! let font = Font::open(MemorySource::new(ttf_bytes), true)?;
//! let mut renderer = TextRenderer::new(font);
//! renderer.settings_mut().set_point_size(24)?;
//!
//! let mut fb = Framebuffer::new(320, 48, BitDepth::One)?;
//! renderer.draw_str(0, 0, "Hello", &mut fb);
//! ```

pub mod font;
pub mod layout;
pub mod render;
pub mod text;

pub use font::{
    BoundingBox, ByteSource, BufferedSource, Font, GlyphId, HMetric, MemorySource, TableTag,
};
pub use font::outline::{GlyphOutline, OutlineBuilder, OutlinePoint, Point, Polylines};
pub use layout::{Alignment, CharBox, EngineLimits, Paint, RenderSettings, Rotation, TextBox, TextRenderer};
pub use render::{BitDepth, FillRule, Framebuffer, LineDrawer, ScanFiller};

/// Font engine error types
#[derive(Debug, thiserror::Error)]
pub enum TrueTypeError {
    #[error("Invalid font file: {0}")]
    InvalidFile(&'static str),

    #[error("Checksum mismatch in table '{0}'")]
    ChecksumMismatch(TableTag),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("Glyph not found")]
    GlyphNotFound,

    #[error("Table not found: {0}")]
    TableNotFound(TableTag),

    #[error("Malformed font data: {0}")]
    Malformed(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrueTypeError>;
