//! PNG data URI encoding and decoding.
//!
//! Every bitmap crossing the delivery channel travels as a
//! `data:image/png;base64,…` URI.

// ============================================================================
// Imports
// ============================================================================

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Prefix of a PNG data URI.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

// ============================================================================
// Encoding
// ============================================================================

/// Encodes an image as a PNG data URI.
///
/// # Errors
///
/// Returns [`Error::Image`] if PNG encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<String> {
    let mut bytes = Vec::new();
    PngEncoder::new(Cursor::new(&mut bytes)).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;

    let mut data_url = String::from(PNG_DATA_URL_PREFIX);
    Base64Standard.encode_string(&bytes, &mut data_url);
    Ok(data_url)
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a PNG data URI into an image.
///
/// # Errors
///
/// - [`Error::Composition`] if the string is not a PNG data URI
/// - [`Error::Base64`] if the payload is not valid base64
/// - [`Error::Image`] if the bytes are not a valid PNG
pub fn decode_png(data_url: &str) -> Result<RgbaImage> {
    let payload = data_url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or_else(|| Error::composition("not a PNG data URI"))?;

    let bytes = Base64Standard.decode(payload)?;
    let image = image::load_from_memory(&bytes)?;
    Ok(image.to_rgba8())
}

// ============================================================================
// Tests
// ============================================================================
