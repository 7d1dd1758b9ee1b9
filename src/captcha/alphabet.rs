//! Admissible challenge characters.

use crate::config::{CaptchaError, Result};
use rand::Rng;

/// Lowercase form of `ch` when it maps to exactly one character.
#[must_use]
pub fn lowercase_single(ch: char) -> Option<char> {
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => Some(single),
        _ => None,
    }
}

/// Immutable set of characters a challenge may draw from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    /// Minimum number of distinct admissible characters.
    pub const MIN_LEN: usize = 6;

    /// Builds an alphabet from `characters`.
    ///
    /// Duplicates are collapsed keeping first-seen order; whitespace and
    /// control characters are not admissible and are dropped.
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if a character lowercases to more than
    /// one character, or if fewer than [`Self::MIN_LEN`] distinct admissible
    /// characters remain.
    pub fn new(characters: &str) -> Result<Self> {
        let mut chars: Vec<char> = Vec::with_capacity(characters.len());
        for ch in characters.chars() {
            if ch.is_whitespace() || ch.is_control() || chars.contains(&ch) {
                continue;
            }
            if lowercase_single(ch).is_none() {
                return Err(CaptchaError::Config(format!(
                    "character {ch:?} has no single-character lowercase form"
                )));
            }
            chars.push(ch);
        }

        if chars.len() < Self::MIN_LEN {
            return Err(CaptchaError::Config(format!(
                "character set is too small: {} distinct characters, at least {} required",
                chars.len(),
                Self::MIN_LEN
            )));
        }
        Ok(Self { chars })
    }

    /// Draws one character uniformly at random.
    pub fn pick(&self, rng: &mut impl Rng) -> char {
        self.chars[rng.random_range(0..self.chars.len())]
    }

    #[must_use]
    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always false; construction guarantees at least [`Self::MIN_LEN`] characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}
