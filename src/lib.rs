//! Easy Screenshot - Full-page and viewport screenshot pipeline.
//!
//! This library captures web pages as PNG images: either the visible
//! viewport in one shot, or the entire scrollable page assembled from a
//! series of viewport captures.
//!
//! # Architecture
//!
//! The pipeline spans two execution contexts joined by a message channel:
//!
//! - **Service (privileged)**: Owns the platform capture primitive and the
//!   presentation surface
//! - **Walker (page)**: Runs the scroll/capture/stitch algorithm against
//!   the live page
//!
//! Key design principles:
//!
//! - Only the service can rasterize pixels; the walker requests one
//!   viewport capture per scroll step over the channel
//! - Requests are action-tagged JSON frames correlated to replies by UUID
//! - Finished images cross the presentation boundary by hand-off key, not
//!   by value
//! - A failed step aborts the run; the page is restored either way
//!
//! # Quick Start
//!
//! ```no_run
//! use easy_screenshot::{CaptureRequest, Endpoint, PageWalker, Result};
//! # use easy_screenshot::PageDriver;
//!
//! # async fn example(page: impl PageDriver) -> Result<()> {
//! let ((_service, _service_inbox), (page_end, _page_inbox)) = Endpoint::pair();
//!
//! let walker = PageWalker::new(page, page_end);
//! let request = CaptureRequest::new("https://example.com", true);
//! let data_url = walker.run(&request).await?;
//! println!("captured {} bytes", data_url.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`channel`] | Delivery channel endpoints and request correlation |
//! | [`dataurl`] | PNG data URI encoding and decoding |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`handoff`] | Ephemeral screenshot hand-off store |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`page`] | The [`PageDriver`] surface the host implements |
//! | [`protocol`] | Action-tagged message types |
//! | [`service`] | Privileged capture service |
//! | [`walker`] | Scroll/capture/stitch pipeline |

// ============================================================================
// Modules
// ============================================================================

/// Delivery channel endpoints.
///
/// [`Endpoint::pair()`] creates two connected endpoints with their
/// inboxes, one per execution context.
pub mod channel;

/// PNG data URI encoding and decoding.
pub mod dataurl;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Ephemeral screenshot hand-off.
pub mod handoff;

/// Type-safe identifiers for pipeline entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Host-provided access to the live page.
pub mod page;

/// Action-tagged message types for the delivery channel.
pub mod protocol;

/// Privileged capture service.
///
/// Routes trigger and walker requests to the platform capture primitive
/// and the presentation surface.
pub mod service;

/// Full-page capture pipeline.
///
/// This module contains the core capture algorithm:
///
/// - [`PageGeometry`] - page dimension discovery
/// - [`plan_scroll_steps`] - overlapping scroll plan
/// - [`PageWalker`] - the run orchestrator
pub mod walker;

// ============================================================================
// Re-exports
// ============================================================================

// Channel types
pub use channel::{Endpoint, Inbox};

// Error types
pub use error::{Error, Result};

// Hand-off types
pub use handoff::{HandoffStore, ScreenshotPayload};

// Identifier types
pub use identifiers::{HandoffId, RequestId};

// Page surface types
pub use page::{ElementHandle, ElementStyles, PageDriver, PageMetrics};

// Protocol types
pub use protocol::{Action, Reply, Request};

// Service types
pub use service::{CaptureBackend, CaptureService, PresentationSurface};

// Walker types
pub use walker::{
    CaptureRequest, CapturedSegment, HEADER_HEIGHT, PageGeometry, PageWalker, WalkerConfig,
    ensure_url_header, plan_scroll_steps,
};
