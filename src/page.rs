//! In-page DOM surface.
//!
//! The walker runs inside the page context but cannot assume a concrete
//! DOM binding; the host provides one behind [`PageDriver`]. The trait
//! covers exactly what the capture algorithm touches: size measurement,
//! absolute scrolling, the scrollbar-suppressing overflow override, and
//! hide/restore of anchored (fixed/sticky) elements.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// One measurement pass over the page.
///
/// Full sizes are the element-wise maxima of the scroll, offset, and
/// client sizes of both the root element and the body; any single metric
/// can undercount under CSS quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMetrics {
    /// Total scrollable width in CSS pixels.
    pub full_width: u32,
    /// Total scrollable height in CSS pixels.
    pub full_height: u32,
    /// Visible viewport width in CSS pixels.
    pub viewport_width: u32,
    /// Visible viewport height in CSS pixels.
    pub viewport_height: u32,
}

/// Opaque reference to an element in the live page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// Inline styles recorded before hiding an element, for restoration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementStyles {
    /// Original inline `display` value.
    pub display: String,
    /// Original inline `visibility` value.
    pub visibility: String,
    /// Original inline `opacity` value.
    pub opacity: String,
}

// ============================================================================
// PageDriver
// ============================================================================

/// Host-provided access to the live page.
///
/// All methods are fallible: the page may be torn down mid-run (e.g. a
/// navigation) and every failure surfaces as an error rather than a hang.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Measures the page and viewport once.
    async fn measure(&self) -> Result<PageMetrics>;

    /// Scrolls the page to an absolute position.
    async fn scroll_to(&self, x: i64, y: i64) -> Result<()>;

    /// Returns the current scroll position as `(x, y)`.
    async fn scroll_position(&self) -> Result<(i64, i64)>;

    /// Hides the scrollbars by overriding the body overflow style.
    ///
    /// Returns the original overflow value for later restoration.
    async fn override_overflow(&self) -> Result<String>;

    /// Restores the body overflow style recorded by
    /// [`override_overflow`](Self::override_overflow).
    async fn restore_overflow(&self, original: &str) -> Result<()>;

    /// Enumerates elements anchored to the viewport.
    ///
    /// Anchored means a computed position of `fixed` or `sticky` with a
    /// nonzero-area bounding box; everything else scrolls with the page
    /// and never duplicates across segments.
    async fn anchored_elements(&self) -> Result<Vec<ElementHandle>>;

    /// Makes an element invisible and non-interactive.
    ///
    /// Returns the styles needed to restore it.
    async fn hide_element(&self, element: ElementHandle) -> Result<ElementStyles>;

    /// Restores an element hidden by [`hide_element`](Self::hide_element).
    async fn restore_element(&self, element: ElementHandle, styles: &ElementStyles) -> Result<()>;
}

// ============================================================================
// Test Double
// ============================================================================
