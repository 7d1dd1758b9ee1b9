//! Library definitions.
//!
//! Exports the CAPTCHA pipeline, configuration and the HTTP service.

pub mod captcha;
pub mod config;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
pub use captcha::{
    Alphabet, Challenge, ChallengeGenerator, ChallengeImage, Encoding, FontRegistry, Layout,
};
pub use config::{CaptchaError, Config, Result};
pub use service::serve;
