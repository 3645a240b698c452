//! Scroll-step planning.
//!
//! The plan walks the page top to bottom in viewport-height strides,
//! shortened by a fixed overlap margin so no sliver of content falls
//! between consecutive captures. The final step is pinned exactly to the
//! bottom-aligned offset rather than overshooting, so the last capture
//! ends precisely at the page bottom instead of reading past content
//! into blank canvas.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use super::geometry::PageGeometry;

// ============================================================================
// Planning
// ============================================================================

/// Computes the ordered scroll offsets for one capture run.
///
/// Guarantees:
///
/// - offsets are monotonically increasing and start at `0`
/// - the last offset equals [`PageGeometry::bottom_offset`]
/// - consecutive captures overlap by at least `overlap_margin` pixels
///   (more for the final, bottom-snapped pair)
///
/// A page no taller than the viewport yields the single step `[0]`.
#[must_use]
pub fn plan_scroll_steps(geometry: &PageGeometry, overlap_margin: u32) -> Vec<u32> {
    let viewport = geometry.viewport_height;
    if geometry.full_height <= viewport {
        return vec![0];
    }

    let bottom = geometry.bottom_offset();
    // A margin at or above the viewport height would stall the walk
    let stride = viewport.saturating_sub(overlap_margin).max(1);

    let mut steps = vec![0u32];
    let mut offset = 0u32;
    while offset + viewport < geometry.full_height {
        offset = (offset + stride).min(bottom);
        steps.push(offset);
    }

    debug!(
        steps = steps.len(),
        stride,
        bottom,
        "Scroll plan computed"
    );

    steps
}

// ============================================================================
// Tests
// ============================================================================
