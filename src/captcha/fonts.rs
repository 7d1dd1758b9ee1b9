//! Font registry.
//!
//! Parses outline fonts once at startup; the registry is read-only afterwards
//! and shared between glyph workers without locking.

use crate::config::{CaptchaError, Result};
use ab_glyph::FontArc;
use rand::Rng;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// File extensions attempted as outline fonts (compared case-insensitively).
pub const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

/// Non-empty, immutable collection of parsed fonts.
#[derive(Clone)]
pub struct FontRegistry {
    fonts: Vec<FontArc>,
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry")
            .field("fonts", &self.fonts.len())
            .finish()
    }
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            FONT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

impl FontRegistry {
    /// Loads every `.ttf`/`.otf` file directly inside `dir`.
    ///
    /// Subdirectories are ignored and files with other extensions are skipped
    /// with a warning.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if the directory cannot be listed, is
    /// empty, holds no font file, or a font file cannot be read or parsed.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            CaptchaError::Config(format!("failed to open {}: {e}", dir.display()))
        })?;

        let mut fonts = Vec::new();
        let mut seen = 0usize;
        for entry in entries {
            let entry = entry.map_err(|e| {
                CaptchaError::Config(format!("failed to read {}: {e}", dir.display()))
            })?;
            seen += 1;

            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if !has_font_extension(&path) {
                warn!(file = %path.display(), "Not an outline font, skipped");
                continue;
            }

            let bytes = fs::read(&path).map_err(|e| {
                CaptchaError::Config(format!("failed to read font file {}: {e}", path.display()))
            })?;
            let font = FontArc::try_from_vec(bytes).map_err(|e| {
                CaptchaError::Config(format!("failed to parse font file {}: {e}", path.display()))
            })?;
            fonts.push(font);
        }

        if seen == 0 {
            return Err(CaptchaError::Config(format!("{} is empty", dir.display())));
        }
        let registry = Self::from_fonts(fonts).map_err(|_| {
            CaptchaError::Config(format!("no outline font found in {}", dir.display()))
        })?;

        info!(dir = %dir.display(), fonts = registry.len(), "Fonts loaded");
        Ok(registry)
    }

    /// Wraps already parsed fonts.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if `fonts` is empty.
    pub fn from_fonts(fonts: Vec<FontArc>) -> Result<Self> {
        if fonts.is_empty() {
            return Err(CaptchaError::Config("font registry is empty".to_string()));
        }
        Ok(Self { fonts })
    }

    /// Parses fonts held in memory.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if any buffer is not a font or none is given.
    pub fn from_bytes<I>(buffers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let fonts = buffers
            .into_iter()
            .enumerate()
            .map(|(index, bytes)| {
                FontArc::try_from_vec(bytes).map_err(|e| {
                    CaptchaError::Config(format!("failed to parse font buffer {index}: {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_fonts(fonts)
    }

    /// Returns the font at `index`, wrapping past the end.
    #[must_use]
    pub fn font(&self, index: usize) -> &FontArc {
        &self.fonts[index % self.fonts.len()]
    }

    /// Picks a font index uniformly at random.
    pub fn pick(&self, rng: &mut impl Rng) -> usize {
        rng.random_range(0..self.fonts.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Always false; construction guarantees at least one font.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}
