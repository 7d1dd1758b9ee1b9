//! Configuration settings.
//!
//! Defines the main `Config` struct and environment variable loading logic.

use super::error::{CaptchaError, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Characters used when `CAPTCHA_CHARSET` is unset.
///
/// Digits and look-alikes (Gg/9, Ii, Jj, Ll/1, Oo/0, Ss/5, Zz/2) are omitted.
pub const DEFAULT_CHARSET: &str = "ABCDEFHKLMNPQRTUVWXYabcdefhkmnpqrtuvwxy";

fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_u64_or(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn get_env_usize_or(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Application configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP service binds to.
    pub listen_addr: SocketAddr,
    /// Directory scanned for `.ttf`/`.otf` fonts at startup.
    pub font_dir: PathBuf,
    /// Characters eligible for challenges.
    pub charset: String,
    /// Upper bound on rendering all glyphs of one challenge.
    pub render_timeout: Duration,
    /// Logging format: "json" or "pretty".
    pub log_format: String,
    /// Maximum connections served at once.
    pub concurrency_limit: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Every variable has a default:
    /// - `LISTEN_ADDR` (`0.0.0.0:8080`)
    /// - `FONT_DIR` (`./fonts`)
    /// - `CAPTCHA_CHARSET` ([`DEFAULT_CHARSET`])
    /// - `RENDER_TIMEOUT_MS` (`2000`)
    /// - `LOG_FORMAT` (`json`)
    /// - `CONCURRENCY_LIMIT` (`256`)
    ///
    /// # Errors
    ///
    /// Returns `CaptchaError::Config` if `LISTEN_ADDR` is not a valid socket address.
    pub fn from_env() -> Result<Arc<Self>> {
        let raw_addr = get_env_or("LISTEN_ADDR", "0.0.0.0:8080");
        let listen_addr = raw_addr.parse().map_err(|e| {
            CaptchaError::Config(format!("LISTEN_ADDR '{raw_addr}' is not a socket address: {e}"))
        })?;
        let font_dir = PathBuf::from(get_env_or("FONT_DIR", "./fonts"));
        let charset = get_env_or("CAPTCHA_CHARSET", DEFAULT_CHARSET);
        let render_timeout = Duration::from_millis(get_env_u64_or("RENDER_TIMEOUT_MS", 2000));

        Ok(Arc::new(Self {
            listen_addr,
            font_dir,
            charset,
            render_timeout,
            log_format: get_env_or("LOG_FORMAT", "json"),
            concurrency_limit: get_env_usize_or("CONCURRENCY_LIMIT", 256).max(1),
        }))
    }
}
