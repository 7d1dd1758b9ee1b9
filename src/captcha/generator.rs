//! Challenge generation.
//!
//! Picks the characters of a challenge, renders every glyph on its own
//! worker thread, reassembles the results by request position and hands
//! them to the compositor.

use crate::captcha::alphabet::Alphabet;
use crate::captcha::compose::compose;
use crate::captcha::encode::encode_base64;
use crate::captcha::fonts::FontRegistry;
use crate::captcha::glyph::{GlyphRenderer, Rasterize, RenderedGlyph};
use crate::captcha::layout::Layout;
use crate::config::{CaptchaError, Config, Result};
use image::RgbaImage;
use rand::Rng;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Requested form of the challenge image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// The RGBA raster itself.
    Raw,
    /// Base64 of the PNG container.
    Base64,
}

impl Encoding {
    #[must_use]
    pub const fn from_flag(base64: bool) -> Self {
        if base64 { Self::Base64 } else { Self::Raw }
    }
}

/// Challenge image in the requested encoding.
#[derive(Debug, Clone)]
pub enum ChallengeImage {
    Raw(RgbaImage),
    Base64(String),
}

/// One generated CAPTCHA.
#[derive(Debug, Clone)]
pub struct Challenge {
    /// Lowercased answer, in reading order.
    pub text: String,
    pub image: ChallengeImage,
}

struct Assets {
    rasterizer: Arc<dyn Rasterize>,
    alphabet: Alphabet,
    fonts: Option<FontRegistry>,
}

/// Produces challenges from fonts and an alphabet fixed at initialisation.
pub struct ChallengeGenerator {
    assets: OnceLock<Assets>,
    layout: Layout,
    timeout: Duration,
}

impl ChallengeGenerator {
    /// Creates an uninitialised generator.
    #[must_use]
    pub const fn new(layout: Layout, timeout: Duration) -> Self {
        Self {
            assets: OnceLock::new(),
            layout,
            timeout,
        }
    }

    /// Creates an uninitialised generator with the default layout.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(Layout::default(), config.render_timeout)
    }

    /// Creates a generator that is already initialised with `rasterizer`.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if `layout` fails [`Layout::validate`].
    pub fn with_rasterizer(
        rasterizer: Arc<dyn Rasterize>,
        alphabet: Alphabet,
        layout: Layout,
        timeout: Duration,
    ) -> Result<Self> {
        layout.validate()?;
        let generator = Self::new(layout, timeout);
        let _ = generator.assets.set(Assets {
            rasterizer,
            alphabet,
            fonts: None,
        });
        Ok(generator)
    }

    /// Loads the fonts in `font_dir` and fixes the alphabet.
    ///
    /// Once this has succeeded, further calls return `Ok(())` without
    /// touching the loaded state.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if the layout is invalid, the alphabet
    /// is too small, or the font directory yields no usable font.
    pub fn initialise(&self, font_dir: &Path, charset: &str) -> Result<()> {
        if self.is_initialised() {
            debug!("Captcha generator already initialised");
            return Ok(());
        }

        let alphabet = Alphabet::new(charset)?;
        let fonts = FontRegistry::load_dir(font_dir)?;
        let rasterizer = Arc::new(GlyphRenderer::new(fonts.clone(), self.layout.clone())?);

        info!(
            fonts = fonts.len(),
            alphabet = alphabet.len(),
            "Captcha generator initialised"
        );
        // A concurrent initialiser that won keeps its state.
        let _ = self.assets.set(Assets {
            rasterizer,
            alphabet,
            fonts: Some(fonts),
        });
        Ok(())
    }

    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.assets.get().is_some()
    }

    /// Fonts loaded by [`Self::initialise`], if any.
    #[must_use]
    pub fn fonts(&self) -> Option<&FontRegistry> {
        self.assets.get().and_then(|a| a.fonts.as_ref())
    }

    #[must_use]
    pub fn alphabet(&self) -> Option<&Alphabet> {
        self.assets.get().map(|a| &a.alphabet)
    }

    /// Generates a challenge with a random length and random characters.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::NotInitialized` before a successful
    /// [`Self::initialise`], and the errors of [`Self::generate_for`].
    pub fn generate(&self, encoding: Encoding) -> Result<Challenge> {
        let assets = self.assets.get().ok_or(CaptchaError::NotInitialized)?;

        let mut rng = rand::rng();
        let count = rng.random_range(self.layout.char_count.clone());
        let chars: Vec<char> = (0..count).map(|_| assets.alphabet.pick(&mut rng)).collect();
        self.generate_for(&chars, encoding)
    }

    /// Generates a challenge showing exactly `chars`, left to right.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::NotInitialized` before initialisation,
    /// `RenderTimeout` if the glyphs miss the deadline, `WorkerFailed` if a
    /// worker dies, and `Encode` if base64 output cannot be produced.
    pub fn generate_for(&self, chars: &[char], encoding: Encoding) -> Result<Challenge> {
        let assets = self.assets.get().ok_or(CaptchaError::NotInitialized)?;

        let glyphs = render_all(&assets.rasterizer, chars, self.timeout)?;
        let (text, image) = compose(&glyphs, &self.layout, &mut rand::rng());
        debug!(text = %text, glyphs = glyphs.len(), "Challenge composed");

        let image = match encoding {
            Encoding::Raw => ChallengeImage::Raw(image),
            Encoding::Base64 => ChallengeImage::Base64(encode_base64(&image)?),
        };
        Ok(Challenge { text, image })
    }
}

/// Renders one glyph per character concurrently, in request order.
fn render_all(
    rasterizer: &Arc<dyn Rasterize>,
    chars: &[char],
    timeout: Duration,
) -> Result<Vec<RenderedGlyph>> {
    let started = Instant::now();
    let deadline = started + timeout;
    let (tx, rx) = mpsc::channel::<(usize, RenderedGlyph)>();

    for (index, &ch) in chars.iter().enumerate() {
        let tx = tx.clone();
        let rasterizer = Arc::clone(rasterizer);
        thread::Builder::new()
            .name(format!("glyph-{index}"))
            .spawn(move || {
                let glyph = rasterizer.rasterize(ch);
                // The receiver is gone once the request timed out.
                let _ = tx.send((index, glyph));
            })
            .map_err(|e| CaptchaError::WorkerFailed(format!("spawn glyph worker: {e}")))?;
    }
    drop(tx);

    let mut slots: Vec<Option<RenderedGlyph>> = chars.iter().map(|_| None).collect();
    let mut pending = chars.len();
    while pending > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((index, glyph)) => {
                slots[index] = Some(glyph);
                pending -= 1;
            }
            Err(RecvTimeoutError::Timeout) => {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                warn!(elapsed_ms, pending, "Glyph rendering timed out");
                return Err(CaptchaError::RenderTimeout {
                    elapsed_ms,
                    pending,
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(CaptchaError::WorkerFailed(format!(
                    "{pending} glyph worker(s) exited without a result"
                )));
            }
        }
    }

    Ok(slots.into_iter().flatten().collect())
}
