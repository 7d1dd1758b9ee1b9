//! Error types and result aliases.
//!
//! Defines the core `CaptchaError` enumeration and common `Result` type.

use thiserror::Error;

/// CAPTCHA pipeline errors.
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// Unusable font directory, alphabet, layout or environment.
    #[error("configuration error: {0}")]
    Config(String),

    /// A challenge was requested before the generator was initialised.
    #[error("captcha generator is not initialised, call initialise() first")]
    NotInitialized,

    /// Glyph workers did not all report back before the deadline.
    #[error("glyph rendering timed out after {elapsed_ms}ms with {pending} glyph(s) pending")]
    RenderTimeout { elapsed_ms: u64, pending: usize },

    /// A glyph worker could not be spawned or exited without a result.
    #[error("glyph worker failed: {0}")]
    WorkerFailed(String),

    /// The final image could not be encoded.
    #[error("image encoding failed: {0}")]
    Encode(String),
}

/// Result type alias for `CaptchaError`.
pub type Result<T> = std::result::Result<T, CaptchaError>;
