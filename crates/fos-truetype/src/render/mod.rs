//! Glyph rendering
//!
//! Scan conversion of flattened outlines into [`LineDrawer`] calls, plus a
//! packed framebuffer that implements the drawer.

pub mod framebuffer;
pub mod rasterizer;

pub use framebuffer::{BitDepth, Framebuffer};
pub use rasterizer::{ClipRect, FillRule, FillStyle, GlyphTransform, LineDrawer, Paint, Rotation, ScanFiller};
