//! CAPTCHA generation.
//!
//! Glyph rendering, rotation with bounding-box recovery, compositing and
//! encoding of distorted-text challenges.

pub mod alphabet;
pub mod compose;
pub mod encode;
pub mod fonts;
pub mod generator;
pub mod glyph;
pub mod layout;

pub use alphabet::Alphabet;
pub use fonts::FontRegistry;
pub use generator::{Challenge, ChallengeGenerator, ChallengeImage, Encoding};
pub use glyph::{BoundingBox, GlyphParams, GlyphRenderer, Rasterize, RenderedGlyph};
pub use layout::Layout;
