//! Glyph compositing.
//!
//! Lays cropped glyphs out left to right on the final canvas with random
//! horizontal start, per-glyph vertical jitter and a small overlap between
//! neighbours.

use crate::captcha::alphabet::lowercase_single;
use crate::captcha::glyph::RenderedGlyph;
use crate::captcha::layout::Layout;
use image::{RgbaImage, imageops};
use rand::Rng;
use tracing::warn;

/// Merges `glyphs` into one `layout.width` x `layout.height` image.
///
/// Glyphs are drawn in slice order and their characters, lowercased, form
/// the returned text. When the glyphs are wider than the canvas the run
/// starts at the left edge and the trailing glyphs are clipped.
#[must_use]
pub fn compose(
    glyphs: &[RenderedGlyph],
    layout: &Layout,
    rng: &mut impl Rng,
) -> (String, RgbaImage) {
    let mut image = RgbaImage::new(layout.width, layout.height);
    let mut text = String::with_capacity(glyphs.len());

    let total_width = glyphs
        .iter()
        .fold(0u32, |acc, g| acc.saturating_add(g.bbox.width()));
    let mut cursor_x: i64 = if total_width < layout.width {
        i64::from(rng.random_range(0..layout.width - total_width))
    } else {
        warn!(
            total_width,
            canvas_width = layout.width,
            "Glyphs wider than the canvas, trailing characters may be clipped"
        );
        0
    };

    for glyph in glyphs {
        text.push(lowercase_single(glyph.character).unwrap_or(glyph.character));

        let height = glyph.bbox.height();
        let cursor_y = if height < layout.height {
            rng.random_range(0..layout.height - height)
        } else {
            0
        };

        let cropped = glyph.cropped();
        imageops::overlay(&mut image, &cropped, cursor_x, i64::from(cursor_y));

        let overlap = rng.random_range(layout.overlap.clone());
        cursor_x += i64::from(glyph.bbox.width()) - i64::from(overlap);
    }

    (text, image)
}
