//! Challenge geometry.
//!
//! Every size, range and color used by the glyph renderer and the compositor.

use crate::config::{CaptchaError, Result};
use image::Rgba;
use std::ops::RangeInclusive;

/// Geometric parameters shared by all challenges of one generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Final image width.
    pub width: u32,
    /// Final image height.
    pub height: u32,
    /// Side of the square canvas each glyph is drawn and rotated on.
    pub glyph_canvas: u32,
    /// Font size in pixels.
    pub font_size: RangeInclusive<u32>,
    /// Maximum absolute rotation in degrees.
    pub max_rotation_deg: f32,
    /// Characters per challenge.
    pub char_count: RangeInclusive<usize>,
    /// Pixels consecutive glyphs are pulled together by.
    pub overlap: RangeInclusive<u32>,
    /// Glyph foreground color.
    pub color: Rgba<u8>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 140,
            height: 40,
            glyph_canvas: 60,
            font_size: 24..=39,
            max_rotation_deg: 20.0,
            char_count: 4..=6,
            overlap: 3..=6,
            color: Rgba([255, 109, 0, 255]),
        }
    }
}

impl Layout {
    /// Checks that the layout can produce a challenge.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` for zero-sized canvases, empty ranges,
    /// a negative rotation bound, or font sizes that do not fit the glyph canvas.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.glyph_canvas == 0 {
            return Err(CaptchaError::Config(format!(
                "canvas sizes must be non-zero (image {}x{}, glyph {})",
                self.width, self.height, self.glyph_canvas
            )));
        }
        if self.font_size.is_empty() || *self.font_size.start() == 0 {
            return Err(CaptchaError::Config(format!(
                "font size range {:?} is empty",
                self.font_size
            )));
        }
        if *self.font_size.end() >= self.glyph_canvas {
            return Err(CaptchaError::Config(format!(
                "font size {} does not fit a {}px glyph canvas",
                self.font_size.end(),
                self.glyph_canvas
            )));
        }
        if self.char_count.is_empty() || *self.char_count.start() == 0 {
            return Err(CaptchaError::Config(format!(
                "character count range {:?} is empty",
                self.char_count
            )));
        }
        if self.overlap.is_empty() {
            return Err(CaptchaError::Config(format!(
                "overlap range {:?} is empty",
                self.overlap
            )));
        }
        if !self.max_rotation_deg.is_finite() || self.max_rotation_deg < 0.0 {
            return Err(CaptchaError::Config(format!(
                "rotation bound {} must be a non-negative number of degrees",
                self.max_rotation_deg
            )));
        }
        Ok(())
    }
}
