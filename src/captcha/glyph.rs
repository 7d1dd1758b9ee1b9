//! Per-character glyph rendering.
//!
//! Each character is drawn upright on its own square canvas, rotated by
//! inverse mapping, and its occupied rectangle is recovered so the
//! compositor can crop away the surrounding transparency.

use crate::captcha::fonts::FontRegistry;
use crate::captcha::layout::Layout;
use crate::config::Result;
use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_text_mut;
use rand::Rng;
use tracing::debug;

/// Rectangle enclosing the ink of a glyph canvas.
///
/// `max_x`/`max_y` are inclusive pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    const fn point(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    /// The whole of a `width` x `height` canvas.
    #[must_use]
    pub const fn full(width: u32, height: u32) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: width.saturating_sub(1),
            max_y: height.saturating_sub(1),
        }
    }

    /// Cropped width used for layout.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    /// Cropped height used for layout.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.max_y - self.min_y
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Grows the box by one pixel on every side, clamped to the canvas.
    #[must_use]
    pub fn expanded(self, width: u32, height: u32) -> Self {
        Self {
            min_x: self.min_x.saturating_sub(1),
            min_y: self.min_y.saturating_sub(1),
            max_x: (self.max_x + 1).min(width.saturating_sub(1)),
            max_y: (self.max_y + 1).min(height.saturating_sub(1)),
        }
    }
}

/// One character drawn on its own canvas.
#[derive(Debug, Clone)]
pub struct RenderedGlyph {
    pub character: char,
    pub canvas: RgbaImage,
    pub bbox: BoundingBox,
}

impl RenderedGlyph {
    /// Copies the bounding-box region out of the canvas.
    #[must_use]
    pub fn cropped(&self) -> RgbaImage {
        imageops::crop_imm(
            &self.canvas,
            self.bbox.min_x,
            self.bbox.min_y,
            self.bbox.width(),
            self.bbox.height(),
        )
        .to_image()
    }
}

/// Randomized choices for one glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphParams {
    /// Index into the font registry (wraps).
    pub font_index: usize,
    /// Font size in pixels.
    pub size: f32,
    /// Clockwise rotation in degrees.
    pub angle_deg: f32,
}

impl GlyphParams {
    /// Draws font, size and angle uniformly from the layout's ranges.
    #[allow(clippy::cast_precision_loss)]
    pub fn random(fonts: &FontRegistry, layout: &Layout, rng: &mut impl Rng) -> Self {
        let max = layout.max_rotation_deg;
        Self {
            font_index: fonts.pick(rng),
            size: rng.random_range(layout.font_size.clone()) as f32,
            angle_deg: rng.random_range(-max..=max),
        }
    }
}

/// Finds the tight rectangle around every non-transparent pixel.
#[must_use]
pub fn ink_bounds(image: &RgbaImage) -> Option<BoundingBox> {
    let mut bounds: Option<BoundingBox> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        match bounds.as_mut() {
            Some(b) => b.include(x, y),
            None => bounds = Some(BoundingBox::point(x, y)),
        }
    }
    bounds
}

/// Draws `ch` centered on a transparent `side` x `side` canvas.
///
/// Horizontal centering uses the glyph advance, vertical centering the
/// ascent-to-descent line height.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn rasterize_upright(
    font: &FontArc,
    ch: char,
    size: f32,
    side: u32,
    color: Rgba<u8>,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(side, side);
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);
    let advance = scaled.h_advance(font.glyph_id(ch));
    let line_height = scaled.height();

    let side_f32 = side as f32;
    let x = ((side_f32 - advance) / 2.0).round() as i32;
    let y = ((side_f32 - line_height) / 2.0).round() as i32;

    draw_text_mut(&mut canvas, color, x, y, scale, font, &ch.to_string());
    canvas
}

/// Rotates `source` clockwise by `angle_deg` about its center.
///
/// Every destination pixel center is mapped back through the inverse
/// rotation and takes the source pixel it lands on, so the output has no
/// holes. Returns the rotated canvas and its ink rectangle grown by one
/// pixel. A canvas with no surviving ink reports the full canvas.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rotate_with_bounds(source: &RgbaImage, angle_deg: f32) -> (RgbaImage, BoundingBox) {
    let (width, height) = source.dimensions();
    let (w, h) = (f64::from(width), f64::from(height));
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (sin, cos) = f64::from(angle_deg).to_radians().sin_cos();

    let mut rotated = RgbaImage::new(width, height);
    let mut bounds: Option<BoundingBox> = None;

    for (x, y, pixel) in rotated.enumerate_pixels_mut() {
        let dx = f64::from(x) + 0.5 - cx;
        let dy = f64::from(y) + 0.5 - cy;
        let sx = cos.mul_add(dx, sin * dy) + cx;
        let sy = cos.mul_add(dy, -sin * dx) + cy;
        if sx < 0.0 || sy < 0.0 || sx >= w || sy >= h {
            continue;
        }

        let src = source.get_pixel(sx.floor() as u32, sy.floor() as u32);
        if src[3] == 0 {
            continue;
        }
        *pixel = *src;
        match bounds.as_mut() {
            Some(b) => b.include(x, y),
            None => bounds = Some(BoundingBox::point(x, y)),
        }
    }

    let bbox = bounds.map_or_else(
        || {
            debug!(angle_deg, "No ink after rotation, cropping full canvas");
            BoundingBox::full(width, height)
        },
        |b| b.expanded(width, height),
    );
    (rotated, bbox)
}

/// Renders `ch` with fixed parameters.
#[must_use]
pub fn render_glyph(
    fonts: &FontRegistry,
    ch: char,
    params: GlyphParams,
    layout: &Layout,
) -> RenderedGlyph {
    let upright = rasterize_upright(
        fonts.font(params.font_index),
        ch,
        params.size,
        layout.glyph_canvas,
        layout.color,
    );
    let (canvas, bbox) = rotate_with_bounds(&upright, params.angle_deg);
    RenderedGlyph {
        character: ch,
        canvas,
        bbox,
    }
}

/// Produces a rendered glyph for one character.
///
/// Implementations are shared across worker threads.
pub trait Rasterize: Send + Sync {
    fn rasterize(&self, ch: char) -> RenderedGlyph;
}

/// Font-backed renderer drawing fresh random parameters per glyph.
#[derive(Debug, Clone)]
pub struct GlyphRenderer {
    fonts: FontRegistry,
    layout: Layout,
}

impl GlyphRenderer {
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if `layout` fails [`Layout::validate`].
    pub fn new(fonts: FontRegistry, layout: Layout) -> Result<Self> {
        layout.validate()?;
        Ok(Self { fonts, layout })
    }
}

impl Rasterize for GlyphRenderer {
    fn rasterize(&self, ch: char) -> RenderedGlyph {
        let params = GlyphParams::random(&self.fonts, &self.layout, &mut rand::rng());
        render_glyph(&self.fonts, ch, params, &self.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CHARSET;
    use crate::test_utils::fixture_registry;

    const INK: Rgba<u8> = Rgba([255, 109, 0, 255]);

    fn canvas_with_rect(side: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbaImage {
        RgbaImage::from_fn(side, side, |x, y| {
            if (x0..=x1).contains(&x) && (y0..=y1).contains(&y) {
                INK
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    #[test]
    fn test_bbox_dimensions() {
        let bbox = BoundingBox {
            min_x: 3,
            min_y: 4,
            max_x: 13,
            max_y: 24,
        };
        assert_eq!(bbox.width(), 10);
        assert_eq!(bbox.height(), 20);
    }

    #[test]
    fn test_bbox_expansion_clamps_to_canvas() {
        let inner = BoundingBox {
            min_x: 5,
            min_y: 5,
            max_x: 10,
            max_y: 10,
        };
        assert_eq!(
            inner.expanded(60, 60),
            BoundingBox {
                min_x: 4,
                min_y: 4,
                max_x: 11,
                max_y: 11
            }
        );
        assert_eq!(BoundingBox::full(60, 60).expanded(60, 60), BoundingBox::full(60, 60));
    }

    #[test]
    fn test_ink_bounds() {
        assert_eq!(ink_bounds(&RgbaImage::new(20, 20)), None);
        let canvas = canvas_with_rect(20, 2, 3, 7, 9);
        assert_eq!(
            ink_bounds(&canvas),
            Some(BoundingBox {
                min_x: 2,
                min_y: 3,
                max_x: 7,
                max_y: 9
            })
        );
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let source = canvas_with_rect(60, 10, 5, 19, 7);
        let (rotated, bbox) = rotate_with_bounds(&source, 0.0);
        assert_eq!(rotated, source);
        assert_eq!(bbox, ink_bounds(&source).unwrap().expanded(60, 60));
    }

    #[test]
    fn test_rotate_half_turn() {
        let source = canvas_with_rect(60, 10, 5, 19, 7);
        let (rotated, bbox) = rotate_with_bounds(&source, 180.0);
        assert_eq!(
            ink_bounds(&rotated),
            Some(BoundingBox {
                min_x: 40,
                min_y: 52,
                max_x: 49,
                max_y: 54
            })
        );
        assert_eq!(
            bbox,
            BoundingBox {
                min_x: 39,
                min_y: 51,
                max_x: 50,
                max_y: 55
            }
        );
    }

    #[test]
    fn test_rotate_quarter_turn_swaps_extents() {
        let source = canvas_with_rect(60, 10, 5, 19, 7);
        let (rotated, _) = rotate_with_bounds(&source, 90.0);
        let ink = ink_bounds(&rotated).unwrap();
        assert_eq!(
            ink,
            BoundingBox {
                min_x: 52,
                min_y: 10,
                max_x: 54,
                max_y: 19
            }
        );
    }

    #[test]
    fn test_rotate_has_no_holes() {
        let source = canvas_with_rect(60, 15, 15, 44, 44);
        let (rotated, _) = rotate_with_bounds(&source, 17.0);
        // The square's center stays solidly inked under any rotation.
        for y in 25..35 {
            for x in 25..35 {
                assert_eq!(rotated.get_pixel(x, y)[3], 255, "hole at {x},{y}");
            }
        }
    }

    #[test]
    fn test_rotate_empty_canvas_falls_back_to_full() {
        let (rotated, bbox) = rotate_with_bounds(&RgbaImage::new(60, 60), 12.0);
        assert!(ink_bounds(&rotated).is_none());
        assert_eq!(bbox, BoundingBox::full(60, 60));
        assert_eq!(bbox.width(), 59);
    }

    #[test]
    fn test_upright_glyph_is_centered() {
        let registry = fixture_registry();
        let upright = rasterize_upright(registry.font(0), 'H', 32.0, 60, INK);
        let ink = ink_bounds(&upright).expect("glyph has ink");
        let center_x = (ink.min_x + ink.max_x) / 2;
        let center_y = (ink.min_y + ink.max_y) / 2;
        assert!((22..=38).contains(&center_x), "x center {center_x}");
        assert!((22..=38).contains(&center_y), "y center {center_y}");
    }

    #[test]
    fn test_unrotated_glyph_bbox_matches_ink() {
        let registry = fixture_registry();
        let layout = Layout::default();
        let params = GlyphParams {
            font_index: 0,
            size: 32.0,
            angle_deg: 0.0,
        };
        let upright = rasterize_upright(registry.font(0), 'K', 32.0, 60, layout.color);
        let glyph = render_glyph(&registry, 'K', params, &layout);

        assert_eq!(glyph.character, 'K');
        assert_eq!(glyph.canvas, upright);
        assert_eq!(glyph.bbox, ink_bounds(&upright).unwrap().expanded(60, 60));
    }

    #[test]
    fn test_render_is_deterministic_for_fixed_params() {
        let registry = fixture_registry();
        let layout = Layout::default();
        let params = GlyphParams {
            font_index: 1,
            size: 27.0,
            angle_deg: -13.0,
        };
        let a = render_glyph(&registry, 'w', params, &layout);
        let b = render_glyph(&registry, 'w', params, &layout);
        assert_eq!(a.canvas, b.canvas);
        assert_eq!(a.bbox, b.bbox);
    }

    #[test]
    fn test_random_glyphs_stay_inside_canvas() {
        let registry = fixture_registry();
        let layout = Layout::default();
        let renderer = GlyphRenderer::new(registry, layout.clone()).unwrap();
        for ch in DEFAULT_CHARSET.chars() {
            let glyph = renderer.rasterize(ch);
            assert_eq!(glyph.character, ch);
            assert_eq!(glyph.canvas.dimensions(), (60, 60));
            assert!(glyph.bbox.min_x <= glyph.bbox.max_x);
            assert!(glyph.bbox.min_y <= glyph.bbox.max_y);
            assert!(glyph.bbox.max_x < 60 && glyph.bbox.max_y < 60);
            assert!(glyph.bbox.width() < 60, "{ch} fills the canvas");

            let cropped = glyph.cropped();
            assert_eq!(cropped.dimensions(), (glyph.bbox.width(), glyph.bbox.height()));
        }
    }

    #[test]
    fn test_renderer_rejects_invalid_layout() {
        let layout = Layout {
            font_size: 24..=80,
            ..Layout::default()
        };
        assert!(matches!(
            GlyphRenderer::new(fixture_registry(), layout),
            Err(crate::config::CaptchaError::Config(_))
        ));
    }

    #[test]
    fn test_random_params_within_layout() {
        let registry = fixture_registry();
        let layout = Layout::default();
        let mut rng = rand::rng();
        for _ in 0..100 {
            let params = GlyphParams::random(&registry, &layout, &mut rng);
            assert!(params.font_index < registry.len());
            assert!((24.0..=39.0).contains(&params.size));
            assert!((-20.0..=20.0).contains(&params.angle_deg));
        }
    }
}
