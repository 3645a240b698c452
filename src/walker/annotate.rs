//! URL header annotation.
//!
//! Draws a fixed-height white band above the stitched content carrying
//! the page URL in black bitmap text with a thin separator line beneath,
//! matching the layout the presentation surface stamps for visible-area
//! captures. Whether a header is present travels with the image as the
//! `urlAlreadyIncluded` flag so it is never applied twice.

// ============================================================================
// Imports
// ============================================================================

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage, imageops};
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// Height of the header band in pixels.
pub const HEADER_HEIGHT: u32 = 50;

/// Left margin for the URL text and separator line.
const MARGIN: u32 = 15;

/// Top of the URL text inside the band.
const TEXT_TOP: u32 = 14;

/// Vertical position of the separator line.
const SEPARATOR_Y: u32 = 40;

/// Glyph magnification: 8x8 glyphs drawn at 16x16.
const GLYPH_SCALE: u32 = 2;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const SEPARATOR: Rgba<u8> = Rgba([204, 204, 204, 255]);

// ============================================================================
// Annotation
// ============================================================================

/// Returns a new image with a URL header band above `image`.
///
/// The output is exactly [`HEADER_HEIGHT`] taller than the input. Text
/// that would run past the right margin is truncated.
#[must_use]
pub fn annotate_with_url(image: &RgbaImage, url: &str) -> RgbaImage {
    let width = image.width();
    let mut canvas = RgbaImage::from_pixel(width, image.height() + HEADER_HEIGHT, WHITE);

    draw_text(&mut canvas, MARGIN, TEXT_TOP, url);

    // Separator line under the text
    if width > 2 * MARGIN {
        for x in MARGIN..width - MARGIN {
            canvas.put_pixel(x, SEPARATOR_Y, SEPARATOR);
        }
    }

    imageops::replace(&mut canvas, image, 0, i64::from(HEADER_HEIGHT));

    debug!(width, height = canvas.height(), "URL header stamped");
    canvas
}

/// Stamps the URL header unless one was already applied upstream.
///
/// Presentation surfaces call this with the `urlAlreadyIncluded` flag
/// from the hand-off payload; a full-page run stamps its own header and
/// must not receive a second one.
#[must_use]
pub fn ensure_url_header(image: &RgbaImage, url: &str, already_included: bool) -> RgbaImage {
    if already_included {
        image.clone()
    } else {
        annotate_with_url(image, url)
    }
}

/// Draws left-aligned bitmap text, truncating at the right margin.
fn draw_text(canvas: &mut RgbaImage, x: u32, y: u32, text: &str) {
    let glyph_size = 8 * GLYPH_SCALE;
    let mut cursor_x = x;

    for ch in text.chars() {
        if cursor_x + glyph_size + MARGIN > canvas.width() {
            break;
        }
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += glyph_size;
            continue;
        };
        for (row_index, row) in glyph.iter().enumerate() {
            let row_bits = *row;
            for col_index in 0..8u32 {
                if (row_bits >> col_index) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_index * GLYPH_SCALE;
                let py = y + row_index as u32 * GLYPH_SCALE;
                for sy in 0..GLYPH_SCALE {
                    for sx in 0..GLYPH_SCALE {
                        canvas.put_pixel(px + sx, py + sy, BLACK);
                    }
                }
            }
        }
        cursor_x += glyph_size;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_adds_fixed_height() {
        let image = RgbaImage::from_pixel(400, 300, Rgba([9, 9, 9, 255]));
        let annotated = annotate_with_url(&image, "https://example.com");

        assert_eq!(annotated.width(), 400);
        assert_eq!(annotated.height(), 300 + HEADER_HEIGHT);
        // Content shifted below the band, untouched
        assert_eq!(annotated.get_pixel(0, HEADER_HEIGHT), &Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn test_header_contains_text_and_separator() {
        let image = RgbaImage::from_pixel(400, 100, Rgba([9, 9, 9, 255]));
        let annotated = annotate_with_url(&image, "https://example.com");

        // Some black text pixels in the text row band
        let text_pixels = (0..annotated.width())
            .flat_map(|x| (TEXT_TOP..TEXT_TOP + 16).map(move |y| (x, y)))
            .filter(|&(x, y)| annotated.get_pixel(x, y) == &BLACK)
            .count();
        assert!(text_pixels > 0);

        // Separator line present inside the margins
        assert_eq!(annotated.get_pixel(MARGIN, SEPARATOR_Y), &SEPARATOR);
        assert_eq!(annotated.get_pixel(200, SEPARATOR_Y), &SEPARATOR);
        assert_eq!(annotated.get_pixel(5, SEPARATOR_Y), &WHITE);
    }

    #[test]
    fn test_header_not_stamped_twice() {
        let image = RgbaImage::from_pixel(400, 300, Rgba([9, 9, 9, 255]));
        let stamped = ensure_url_header(&image, "https://example.com", false);
        assert_eq!(stamped.height(), 300 + HEADER_HEIGHT);

        // Flag set upstream: the image passes through unchanged
        let again = ensure_url_header(&stamped, "https://example.com", true);
        assert_eq!(again.height(), stamped.height());
        assert_eq!(again, stamped);
    }

    #[test]
    fn test_long_url_is_truncated() {
        // Narrow image, absurdly long URL: must not panic or overdraw
        let image = RgbaImage::from_pixel(64, 20, Rgba([9, 9, 9, 255]));
        let url = "https://example.com/".repeat(50);
        let annotated = annotate_with_url(&image, &url);

        assert_eq!(annotated.width(), 64);
        assert_eq!(annotated.height(), 20 + HEADER_HEIGHT);
    }
}
