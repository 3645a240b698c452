//! Page geometry discovery.
//!
//! A single measurement taken before any scrolling systematically
//! undercounts pages that lazy-load content below the fold. Discovery
//! therefore measures, forces a scroll round-trip to the bottom and back
//! (which triggers visibility-based loaders), re-measures, and keeps the
//! element-wise maximum of the two passes.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::page::{PageDriver, PageMetrics};

// ============================================================================
// PageGeometry
// ============================================================================

/// Final page dimensions for one capture run, in the page's own pixels.
///
/// Invariant: `full_width >= viewport_width` and
/// `full_height >= viewport_height` (clamped at construction). A page
/// shorter than the viewport clamps the effective viewport down, so the
/// stitched output never carries blank rows below the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    /// Total scrollable width.
    pub full_width: u32,
    /// Total scrollable height.
    pub full_height: u32,
    /// Effective viewport width.
    pub viewport_width: u32,
    /// Effective viewport height.
    pub viewport_height: u32,
}

impl PageGeometry {
    /// Builds a geometry from raw metrics, clamping the viewport to at
    /// most the full page size.
    #[must_use]
    pub fn from_metrics(metrics: PageMetrics) -> Self {
        Self {
            full_width: metrics.full_width,
            full_height: metrics.full_height,
            viewport_width: metrics.viewport_width.min(metrics.full_width),
            viewport_height: metrics.viewport_height.min(metrics.full_height),
        }
    }

    /// The bottom-aligned scroll offset, i.e. the largest offset at which
    /// a viewport-height capture still ends inside the page.
    #[inline]
    #[must_use]
    pub fn bottom_offset(&self) -> u32 {
        self.full_height - self.viewport_height
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Discovers the page geometry with a lazy-load round-trip.
///
/// `settle` is the pause after each forced scroll, giving loaders time to
/// insert content before the second measurement pass.
///
/// # Errors
///
/// Returns [`Error::Measurement`] if the page reports a zero-sized
/// viewport or a measurement pass fails.
pub async fn discover<P: PageDriver>(page: &P, settle: Duration) -> Result<PageGeometry> {
    let first = page.measure().await?;
    if first.viewport_width == 0 || first.viewport_height == 0 {
        return Err(Error::measurement("viewport has zero size"));
    }
    if first.full_width == 0 || first.full_height == 0 {
        return Err(Error::measurement("page has zero scrollable size"));
    }

    // Round-trip to the measured bottom to trigger lazy-loaded content
    page.scroll_to(0, i64::from(first.full_height)).await?;
    tokio::time::sleep(settle).await;
    page.scroll_to(0, 0).await?;
    tokio::time::sleep(settle).await;

    let second = page.measure().await?;

    let geometry = PageGeometry::from_metrics(PageMetrics {
        full_width: first.full_width.max(second.full_width),
        full_height: first.full_height.max(second.full_height),
        viewport_width: first.viewport_width.max(second.viewport_width),
        viewport_height: first.viewport_height.max(second.viewport_height),
    });

    debug!(
        full_width = geometry.full_width,
        full_height = geometry.full_height,
        viewport_width = geometry.viewport_width,
        viewport_height = geometry.viewport_height,
        "Page geometry discovered"
    );

    Ok(geometry)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use crate::page::testing::{ScriptedPage, ScriptedState};

    use super::*;

    const NO_SETTLE: Duration = Duration::from_millis(0);

    #[test]
    fn test_geometry_clamps_viewport_to_page() {
        // Page shorter and narrower than the viewport
        let geometry = PageGeometry::from_metrics(PageMetrics {
            full_width: 500,
            full_height: 300,
            viewport_width: 800,
            viewport_height: 400,
        });

        assert_eq!(geometry.full_width, 500);
        assert_eq!(geometry.full_height, 300);
        assert_eq!(geometry.viewport_width, 500);
        assert_eq!(geometry.viewport_height, 300);
        assert_eq!(geometry.bottom_offset(), 0);
    }

    #[tokio::test]
    async fn test_discover_takes_maximum_of_two_passes() {
        // Lazy-loading grows the page after the forced round-trip
        let page = ScriptedPage {
            measurements: vec![
                ScriptedPage::metrics(1000, 400),
                ScriptedPage::metrics(1600, 400),
            ],
            anchored: Vec::new(),
            state: Mutex::new(ScriptedState::default()),
        };

        let geometry = discover(&page, NO_SETTLE).await.expect("geometry");
        assert_eq!(geometry.full_height, 1600);
        assert_eq!(geometry.viewport_height, 400);

        // Round-trip actually happened: bottom then top
        let state = page.state.lock();
        assert_eq!(state.scroll_log, vec![(0, 1000), (0, 0)]);
        assert_eq!(state.measure_count, 2);
    }

    #[tokio::test]
    async fn test_discover_rejects_zero_viewport() {
        let page = ScriptedPage::with_metrics(PageMetrics {
            full_width: 800,
            full_height: 1000,
            viewport_width: 800,
            viewport_height: 0,
        });

        let err = discover(&page, NO_SETTLE).await.unwrap_err();
        assert!(matches!(err, Error::Measurement { .. }));
    }
}
