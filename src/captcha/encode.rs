//! Challenge image encoding.

use crate::config::{CaptchaError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use image::RgbaImage;

/// Encodes `image` as a PNG byte stream.
///
/// # Errors
///
/// Returns `CaptchaError::Encode` if the PNG encoder fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| CaptchaError::Encode(format!("PNG encode failed: {e}")))?;
    Ok(png)
}

/// Encodes `image` as standard, padded base64 of its PNG bytes.
///
/// The caller composes any data URI, e.g. `data:image/png;base64,{s}`.
///
/// # Errors
///
/// Returns `CaptchaError::Encode` if the PNG encoder fails.
pub fn encode_base64(image: &RgbaImage) -> Result<String> {
    Ok(STANDARD.encode(encode_png(image)?))
}
