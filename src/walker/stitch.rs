//! Segment stitching.
//!
//! Consecutive captures deliberately overlap (see the scroll planner), so
//! drawing every segment at its full height at its own offset would paint
//! the overlap region twice. Stitching computes each segment's overlap
//! with the one before it and skips exactly that many rows from the top
//! of the incoming bitmap, continuing the canvas where the previous
//! segment ended. Overlapped rows therefore always come from the earlier
//! capture, never duplicated from the later one.

// ============================================================================
// Imports
// ============================================================================

use image::{Rgba, RgbaImage, imageops};
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::geometry::PageGeometry;

// ============================================================================
// Constants
// ============================================================================

/// Canvas background, visible wherever no segment lands.
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

// ============================================================================
// CapturedSegment
// ============================================================================

/// One captured viewport bitmap with its position in the page.
#[derive(Debug, Clone)]
pub struct CapturedSegment {
    /// Decoded viewport capture.
    pub image: RgbaImage,
    /// Scroll offset at capture time.
    pub scroll_offset: u32,
    /// Rows of the bitmap that carry page content; the final segment is
    /// clamped so it does not overdraw past the page bottom.
    pub capture_height: u32,
}

// ============================================================================
// Stitching
// ============================================================================

/// Composites ordered segments into one full-page image.
///
/// # Errors
///
/// Returns [`Error::Composition`] if the geometry describes an empty
/// canvas.
pub fn stitch_segments(
    geometry: &PageGeometry,
    segments: &[CapturedSegment],
) -> Result<RgbaImage> {
    if geometry.full_width == 0 || geometry.full_height == 0 {
        return Err(Error::composition("stitch canvas has zero size"));
    }

    let mut canvas = RgbaImage::from_pixel(geometry.full_width, geometry.full_height, BACKGROUND);

    // Bottom edge of content drawn so far
    let mut drawn_bottom: u32 = 0;

    for (index, segment) in segments.iter().enumerate() {
        // Overlap injected by the planner: rows the previous segment
        // already covers
        let overlap = drawn_bottom.saturating_sub(segment.scroll_offset);
        let skip = overlap.min(segment.capture_height).min(segment.image.height());

        let dest_y = segment.scroll_offset + skip;
        let available = segment
            .capture_height
            .min(segment.image.height())
            .saturating_sub(skip);
        // Clamp to the canvas bottom
        let draw_height = available.min(geometry.full_height.saturating_sub(dest_y));
        let draw_width = segment.image.width().min(geometry.full_width);

        if draw_height == 0 || draw_width == 0 {
            trace!(index, "Segment fully covered, skipping");
            continue;
        }

        let source = imageops::crop_imm(&segment.image, 0, skip, draw_width, draw_height);
        imageops::replace(&mut canvas, &*source, 0, i64::from(dest_y));

        drawn_bottom = drawn_bottom.max(dest_y + draw_height);
        trace!(index, skip, dest_y, draw_height, "Segment drawn");
    }

    debug!(
        segments = segments.len(),
        width = canvas.width(),
        height = canvas.height(),
        "Segments stitched"
    );

    Ok(canvas)
}

// ============================================================================
// Tests
// ============================================================================
