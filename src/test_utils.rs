//! Test utilities and shared fixtures.
//!
//! This module provides common helpers for unit tests, reducing
//! duplication across the codebase.

use crate::captcha::fonts::FontRegistry;
use crate::captcha::glyph::{BoundingBox, Rasterize, RenderedGlyph};
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const SANS: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const SERIF_ITALIC: &[u8] = include_bytes!("../assets/fonts/DejaVuSerif-Italic.ttf");

/// Glyph color used by synthetic glyphs.
pub const INK: Rgba<u8> = Rgba([255, 109, 0, 255]);

/// Directory holding the bundled fixture fonts.
#[must_use]
pub fn fixture_font_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

/// Bytes of a known-good TrueType font.
#[must_use]
pub fn font_fixture_bytes() -> Vec<u8> {
    SANS.to_vec()
}

/// Registry with two visually different fonts.
///
/// # Panics
///
/// Panics if the bundled fonts fail to parse.
#[must_use]
pub fn fixture_registry() -> FontRegistry {
    FontRegistry::from_bytes(vec![SANS.to_vec(), SERIF_ITALIC.to_vec()])
        .expect("bundled fixture fonts parse")
}

/// Creates a fresh, empty directory under the system temp dir.
///
/// # Panics
///
/// Panics if the directory cannot be created.
#[must_use]
pub fn scratch_dir(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "captchad_{name}_{}_{n}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// A 60x60 glyph whose ink is a solid `width` x `height` block at (5, 5).
#[must_use]
pub fn block_glyph(character: char, width: u32, height: u32) -> RenderedGlyph {
    let canvas = RgbaImage::from_fn(60, 60, |x, y| {
        if (5..5 + width).contains(&x) && (5..5 + height).contains(&y) {
            INK
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    RenderedGlyph {
        character,
        canvas,
        bbox: BoundingBox {
            min_x: 5,
            min_y: 5,
            max_x: 5 + width,
            max_y: 5 + height,
        },
    }
}

/// Rasterizer producing block glyphs after a per-character delay.
///
/// Records the order in which glyphs finished. Characters listed in
/// `panics_on` make the worker panic instead.
#[derive(Default)]
pub struct DelayedRasterizer {
    pub delays: HashMap<char, Duration>,
    pub panics_on: Vec<char>,
    pub completed: Mutex<Vec<char>>,
}

impl DelayedRasterizer {
    #[must_use]
    pub fn with_delays(delays: &[(char, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|&(ch, ms)| (ch, Duration::from_millis(ms)))
                .collect(),
            ..Self::default()
        }
    }

    /// Characters in completion order.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn completion_order(&self) -> Vec<char> {
        self.completed.lock().unwrap().clone()
    }
}

impl Rasterize for DelayedRasterizer {
    fn rasterize(&self, ch: char) -> RenderedGlyph {
        if let Some(delay) = self.delays.get(&ch) {
            std::thread::sleep(*delay);
        }
        assert!(!self.panics_on.contains(&ch), "rasterizer asked to fail on {ch}");
        self.completed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(ch);
        block_glyph(ch, 12, 20)
    }
}
