//! Full-page capture: the scroll/capture/stitch pipeline.
//!
//! The walker runs in the page context and owns the whole algorithm:
//! geometry discovery, scroll planning, fixed-element suppression, the
//! serial per-step capture loop against the capture authority, stitching
//! with overlap resolution, and optional URL header annotation.
//!
//! # Run Flow
//!
//! ```text
//! measure ─► plan ─► [scroll ─► suppress ─► settle ─► capture ─► restore]*
//!                                                                   │
//!              restore scroll + overflow ◄──────────────────────────┘
//!                        │
//!                 stitch ─► annotate ─► encode ─► deliver
//! ```
//!
//! Any unrecoverable error aborts the run after a best-effort restoration
//! of the page's scroll position and overflow style. There is no retry: a
//! failed capture almost always means a restricted page or a platform
//! permission denial that recurs identically.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `geometry` | Page dimension discovery with lazy-load round-trip |
//! | `plan` | Overlapping scroll-step planning |
//! | `suppress` | Fixed/sticky element suppression per step |
//! | `stitch` | Segment compositing with overlap resolution |
//! | `annotate` | URL header band |

// ============================================================================
// Submodules
// ============================================================================

/// Page dimension discovery.
pub mod geometry;

/// Scroll-step planning.
pub mod plan;

/// Fixed-element suppression.
pub mod suppress;

/// Segment stitching.
pub mod stitch;

/// URL header annotation.
pub mod annotate;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::channel::{Endpoint, Inbox};
use crate::dataurl;
use crate::error::{Error, Result};
use crate::page::PageDriver;
use crate::protocol::{Action, Reply};

// ============================================================================
// Re-exports
// ============================================================================

pub use annotate::{HEADER_HEIGHT, ensure_url_header};
pub use geometry::PageGeometry;
pub use plan::plan_scroll_steps;
pub use stitch::CapturedSegment;

// ============================================================================
// WalkerConfig
// ============================================================================

/// Tunable timings and margins for one walker.
///
/// Settle waits are fixed empirical delays, not load-bearing constants;
/// hosts with slow paint pipelines should raise them.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Deliberate redundancy between consecutive scroll steps, in pixels.
    pub overlap_margin: u32,
    /// Pause after each scroll before capturing, for layout and paint.
    pub settle_wait: Duration,
    /// Pause after each forced scroll during geometry discovery, giving
    /// lazy loaders time to insert content.
    pub lazy_load_wait: Duration,
    /// Timeout for a single capture request to the authority.
    pub capture_timeout: Duration,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            overlap_margin: 50,
            settle_wait: Duration::from_millis(150),
            lazy_load_wait: Duration::from_millis(350),
            capture_timeout: Duration::from_secs(10),
        }
    }
}

// ============================================================================
// CaptureRequest
// ============================================================================

/// Input to one full-page capture run. Immutable for its duration.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// URL of the page being captured.
    pub target_url: String,
    /// Whether to stamp the URL header onto the stitched image.
    pub annotate_with_url: bool,
}

impl CaptureRequest {
    /// Creates a new capture request.
    #[inline]
    #[must_use]
    pub fn new(target_url: impl Into<String>, annotate_with_url: bool) -> Self {
        Self {
            target_url: target_url.into(),
            annotate_with_url,
        }
    }
}

// ============================================================================
// PageWalker
// ============================================================================

/// The in-page capture pipeline.
///
/// Holds the page surface and the channel endpoint through which the
/// capture authority is reached. One walker must never execute two runs
/// concurrently against the same page; [`serve`](Self::serve) processes
/// requests strictly one at a time.
pub struct PageWalker<P> {
    page: P,
    channel: Endpoint,
    config: WalkerConfig,
}

impl<P: PageDriver> PageWalker<P> {
    /// Creates a walker with default configuration.
    #[must_use]
    pub fn new(page: P, channel: Endpoint) -> Self {
        Self::with_config(page, channel, WalkerConfig::default())
    }

    /// Creates a walker with explicit configuration.
    #[must_use]
    pub fn with_config(page: P, channel: Endpoint, config: WalkerConfig) -> Self {
        Self {
            page,
            channel,
            config,
        }
    }

    /// Runs one full-page capture and returns the finished PNG data URI.
    ///
    /// The page's scroll position and overflow style are restored before
    /// returning, on the error path as well.
    ///
    /// # Errors
    ///
    /// - [`Error::Measurement`] if geometry discovery fails
    /// - [`Error::CaptureStep`] if any step's capture fails (not retried)
    /// - [`Error::Composition`] if decoding, stitching, or encoding fails
    pub async fn run(&self, request: &CaptureRequest) -> Result<String> {
        debug!(
            url = %request.target_url,
            annotate = request.annotate_with_url,
            "Full-page capture run started"
        );

        let origin = self.page.scroll_position().await?;
        let original_overflow = self.page.override_overflow().await?;

        let outcome = self.capture_segments().await;

        // Best-effort page restoration, error path included
        if let Err(e) = self.page.restore_overflow(&original_overflow).await {
            warn!(error = %e, "Failed to restore overflow style");
        }
        if let Err(e) = self.page.scroll_to(origin.0, origin.1).await {
            warn!(error = %e, "Failed to restore scroll position");
        }

        let (page_geometry, segments) = outcome?;
        let stitched = stitch::stitch_segments(&page_geometry, &segments)?;
        let finished = if request.annotate_with_url {
            annotate::annotate_with_url(&stitched, &request.target_url)
        } else {
            stitched
        };

        let data_url = dataurl::encode_png(&finished)?;
        debug!(bytes = data_url.len(), "Full-page capture run finished");
        Ok(data_url)
    }

    /// Serves `scrollAndCapture` requests from the inbox, one at a time.
    ///
    /// Finished images are handed off via `showScreenshot`; the request
    /// itself is answered asynchronously once the run completes or fails.
    pub async fn serve(self, mut inbox: Inbox) {
        while let Some(request) = inbox.recv().await {
            match request.action {
                Action::ScrollAndCapture { url, include_url } => {
                    let capture = CaptureRequest::new(url.clone(), include_url);
                    match self.run(&capture).await {
                        Ok(data_url) => {
                            let handed_off = self.channel.notify(Action::ShowScreenshot {
                                data_url,
                                url,
                                include_url,
                                // The header, if requested, is already in
                                // the stitched image
                                url_already_included: include_url,
                            });
                            if let Err(e) = handed_off {
                                error!(error = %e, "Failed to hand off finished screenshot");
                            }
                            let _ = self.channel.reply(Reply::ack(request.id));
                        }
                        Err(e) => {
                            error!(error = %e, "Full-page capture run failed");
                            let _ = self.channel.reply(Reply::failure(request.id, e.to_string()));
                        }
                    }
                }
                other => {
                    warn!(action = other.tag(), "Unhandled action in page context");
                    let _ = self.channel.reply(Reply::failure(
                        request.id,
                        Error::unknown_action(other.tag()).to_string(),
                    ));
                }
            }
        }
        debug!("Walker inbox closed");
    }

    /// Walks the scroll plan and captures every segment.
    async fn capture_segments(&self) -> Result<(PageGeometry, Vec<CapturedSegment>)> {
        let page_geometry = geometry::discover(&self.page, self.config.lazy_load_wait).await?;
        let steps = plan::plan_scroll_steps(&page_geometry, self.config.overlap_margin);
        let mut segments = Vec::with_capacity(steps.len());

        for (index, &offset) in steps.iter().enumerate() {
            self.page
                .scroll_to(0, i64::from(offset))
                .await
                .map_err(|e| Error::capture_step(index, format!("scroll failed: {e}")))?;

            // Step 0 keeps top chrome visible in its natural position
            let suppressed = if index > 0 {
                suppress::suppress_anchored(&self.page).await
            } else {
                Vec::new()
            };

            tokio::time::sleep(self.config.settle_wait).await;
            let captured = self.capture_step(index).await;
            suppress::restore_suppressed(&self.page, suppressed).await;

            let data_url = captured?;
            let image = dataurl::decode_png(&data_url)
                .map_err(|e| Error::composition(format!("step {index} decode: {e}")))?;
            let capture_height = page_geometry
                .viewport_height
                .min(page_geometry.full_height - offset);

            segments.push(CapturedSegment {
                image,
                scroll_offset: offset,
                capture_height,
            });
        }

        Ok((page_geometry, segments))
    }

    /// Requests one viewport capture from the authority.
    async fn capture_step(&self, index: usize) -> Result<String> {
        let reply = self
            .channel
            .send_with_timeout(
                Action::CaptureVisibleAreaForFullPage,
                self.config.capture_timeout,
            )
            .await
            .map_err(|e| Error::capture_step(index, e.to_string()))?;

        if let Some(message) = reply.error {
            return Err(Error::capture_step(index, message));
        }
        reply
            .data_url
            .ok_or_else(|| Error::capture_step(index, "no capture data returned"))
    }
}

// ============================================================================
// Tests
// ============================================================================
