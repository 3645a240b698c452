//! Fixed-element suppression.
//!
//! Fixed and sticky elements re-render at the same viewport position on
//! every scroll step and would duplicate across segments. They are hidden
//! for every capture after the first and restored immediately after each
//! step, so the live page spends as little time altered as possible. The
//! first step is exempt: top chrome appears once, in its natural position.
//!
//! Suppression is a cosmetic mitigation. Every failure here is logged and
//! swallowed; a sticky banner duplicated in the output is preferable to an
//! aborted run.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, warn};

use crate::page::{ElementHandle, ElementStyles, PageDriver};

// ============================================================================
// SuppressedElement
// ============================================================================

/// One hidden element with the styles needed to bring it back.
///
/// The set of suppressed elements is a value threaded from the suppression
/// call into the restoration call of the same loop iteration, never shared
/// across steps.
#[derive(Debug)]
pub struct SuppressedElement {
    /// The hidden element.
    pub element: ElementHandle,
    /// Inline styles recorded before hiding.
    pub styles: ElementStyles,
}

// ============================================================================
// Suppression
// ============================================================================

/// Hides all anchored elements, best-effort.
///
/// Elements that fail to hide are skipped; the returned set contains only
/// elements that were actually hidden and therefore need restoration.
pub async fn suppress_anchored<P: PageDriver>(page: &P) -> Vec<SuppressedElement> {
    let elements = match page.anchored_elements().await {
        Ok(elements) => elements,
        Err(e) => {
            warn!(error = %e, "Anchored element enumeration failed, skipping suppression");
            return Vec::new();
        }
    };

    let mut suppressed = Vec::with_capacity(elements.len());
    for element in elements {
        match page.hide_element(element).await {
            Ok(styles) => suppressed.push(SuppressedElement { element, styles }),
            Err(e) => warn!(element = element.0, error = %e, "Failed to hide anchored element"),
        }
    }

    if !suppressed.is_empty() {
        debug!(count = suppressed.len(), "Anchored elements suppressed");
    }

    suppressed
}

/// Restores previously suppressed elements, best-effort.
pub async fn restore_suppressed<P: PageDriver>(page: &P, suppressed: Vec<SuppressedElement>) {
    for entry in suppressed {
        if let Err(e) = page.restore_element(entry.element, &entry.styles).await {
            warn!(element = entry.element.0, error = %e, "Failed to restore anchored element");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
