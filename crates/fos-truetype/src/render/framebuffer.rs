//! Packed-pixel framebuffer
//!
//! A simple [`LineDrawer`] target for tools and tests. Rows are packed
//! most-significant pixel first for sub-byte depths; 16-bit pixels are
//! little-endian.

use super::rasterizer::LineDrawer;
use crate::{Result, TrueTypeError};

/// Bits per pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    One,
    Four,
    Eight,
    Sixteen,
}

impl BitDepth {
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            1 => Ok(BitDepth::One),
            4 => Ok(BitDepth::Four),
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            _ => Err(TrueTypeError::InvalidParameter("bit depth must be 1, 4, 8 or 16")),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            BitDepth::One => 1,
            BitDepth::Four => 4,
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    fn mask(self) -> u32 {
        (1u32 << self.bits()) - 1
    }

    fn stride(self, width: u32) -> usize {
        (width as usize * self.bits() as usize).div_ceil(8)
    }
}

/// Owned pixel buffer
#[derive(Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    depth: BitDepth,
    stride: usize,
    data: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32, depth: BitDepth) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TrueTypeError::InvalidParameter("framebuffer dimensions must be non-zero"));
        }
        let stride = depth.stride(width);
        Ok(Self {
            width,
            height,
            depth,
            stride,
            data: vec![0; stride * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    fn index(&self, x: i32, y: i32) -> Option<(u32, u32)> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some((x as u32, y as u32))
    }

    /// Write one pixel; coordinates outside the buffer are ignored
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        let Some((x, y)) = self.index(x, y) else {
            return;
        };
        let value = color & self.depth.mask();
        let row = y as usize * self.stride;
        match self.depth {
            BitDepth::One => {
                let byte = &mut self.data[row + x as usize / 8];
                let bit = 7 - (x % 8);
                *byte = (*byte & !(1 << bit)) | ((value as u8) << bit);
            }
            BitDepth::Four => {
                let byte = &mut self.data[row + x as usize / 2];
                let shift = if x % 2 == 0 { 4 } else { 0 };
                *byte = (*byte & !(0x0F << shift)) | ((value as u8) << shift);
            }
            BitDepth::Eight => self.data[row + x as usize] = value as u8,
            BitDepth::Sixteen => {
                let at = row + x as usize * 2;
                self.data[at..at + 2].copy_from_slice(&(value as u16).to_le_bytes());
            }
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        let (x, y) = self.index(x, y)?;
        let row = y as usize * self.stride;
        let value = match self.depth {
            BitDepth::One => u32::from(self.data[row + x as usize / 8] >> (7 - (x % 8))) & 1,
            BitDepth::Four => {
                let shift = if x % 2 == 0 { 4 } else { 0 };
                u32::from(self.data[row + x as usize / 2] >> shift) & 0x0F
            }
            BitDepth::Eight => u32::from(self.data[row + x as usize]),
            BitDepth::Sixteen => {
                let at = row + x as usize * 2;
                u32::from(u16::from_le_bytes([self.data[at], self.data[at + 1]]))
            }
        };
        Some(value)
    }

    /// Number of non-zero pixels
    pub fn lit_pixels(&self) -> usize {
        (0..self.height as i32)
            .flat_map(|y| (0..self.width as i32).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y).is_some_and(|v| v != 0))
            .count()
    }
}

impl LineDrawer for Framebuffer {
    /// Bresenham line, both endpoints inclusive
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
