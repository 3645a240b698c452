//! Privileged capture service.
//!
//! The service owns the platform capture primitive and the presentation
//! surface. It answers trigger requests for visible-area captures, starts
//! full-page runs in the page context, rasterizes one viewport per scroll
//! step on the walker's behalf, and receives finished images for hand-off
//! to the preview.
//!
//! # Message Routing
//!
//! | Action | Origin | Handling |
//! |--------|--------|----------|
//! | `captureVisibleArea` | trigger | capture, park, present, ack |
//! | `captureEntirePage` | trigger | ack, then forward `scrollAndCapture` |
//! | `captureVisibleAreaForFullPage` | walker | capture, return the data URI |
//! | `showScreenshot` | walker | park, present, ack |
//!
//! The full-page ack is deliberately early: the trigger UI closes itself
//! the moment the run starts, and the run outcome travels back through
//! `showScreenshot` or the forwarded request's own reply.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};
use url::Url;

use crate::channel::{Endpoint, Inbox};
use crate::error::{Error, Result};
use crate::handoff::{HandoffStore, ScreenshotPayload};
use crate::identifiers::HandoffId;
use crate::protocol::{Action, Reply};

// ============================================================================
// Constants
// ============================================================================

/// URL schemes the platform refuses to rasterize.
const RESTRICTED_SCHEMES: &[&str] = &["about", "chrome", "moz-extension", "view-source"];

/// Timeout for a forwarded full-page run.
///
/// Generous: a run on a very tall page performs dozens of captures with
/// settle waits between them.
const FULL_PAGE_RUN_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// Traits
// ============================================================================

/// Host-provided viewport rasterizer.
///
/// The platform analogue captures the visible area of the active tab into
/// a PNG data URI. Capture failures carry the platform's message.
#[async_trait]
pub trait CaptureBackend: Send + Sync + 'static {
    /// Rasterizes the currently visible viewport.
    async fn capture_visible(&self) -> Result<String>;
}

/// Host-provided preview surface.
///
/// Receives a hand-off key and opens a viewer that redeems it from the
/// [`HandoffStore`] exactly once.
#[async_trait]
pub trait PresentationSurface: Send + Sync + 'static {
    /// Opens the preview for a parked screenshot.
    async fn present(&self, id: HandoffId) -> Result<()>;
}

// ============================================================================
// Scheme Check
// ============================================================================

/// Returns `true` if the platform refuses to capture this URL.
///
/// Unparsable URLs are let through; the backend reports its own failure
/// with a more specific message.
#[must_use]
fn is_restricted(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => RESTRICTED_SCHEMES.contains(&parsed.scheme()),
        Err(_) => false,
    }
}

// ============================================================================
// CaptureService
// ============================================================================

/// The privileged side of the capture pipeline.
pub struct CaptureService<B, S> {
    backend: B,
    surface: S,
    store: Arc<HandoffStore>,
    channel: Endpoint,
}

impl<B: CaptureBackend, S: PresentationSurface> CaptureService<B, S> {
    /// Creates a service over a backend, a surface, and the page channel.
    #[must_use]
    pub fn new(backend: B, surface: S, store: Arc<HandoffStore>, channel: Endpoint) -> Self {
        Self {
            backend,
            surface,
            store,
            channel,
        }
    }

    /// Serves trigger and walker requests from the inbox until it closes.
    pub async fn serve(self, mut inbox: Inbox) {
        while let Some(request) = inbox.recv().await {
            let id = request.id;
            let reply = match request.action {
                Action::CaptureVisibleArea { url, include_url } => {
                    match self.capture_and_present(url, include_url).await {
                        Ok(()) => Reply::ack(id),
                        Err(e) => {
                            warn!(error = %e, "Visible-area capture failed");
                            Reply::failure(id, e.to_string())
                        }
                    }
                }

                Action::CaptureEntirePage { url, include_url } => {
                    if is_restricted(&url) {
                        Reply::failure(id, Error::restricted_page(url).to_string())
                    } else {
                        self.start_full_page_run(url, include_url);
                        Reply::ack(id)
                    }
                }

                Action::CaptureVisibleAreaForFullPage => {
                    match self.backend.capture_visible().await {
                        Ok(data_url) => Reply::capture(id, data_url),
                        Err(e) => {
                            warn!(error = %e, "Step capture failed");
                            Reply::failure(id, e.to_string())
                        }
                    }
                }

                Action::ShowScreenshot {
                    data_url,
                    url,
                    include_url,
                    url_already_included,
                } => {
                    let payload = ScreenshotPayload {
                        data_url,
                        url,
                        include_url,
                        url_already_included,
                    };
                    match self.present_payload(payload).await {
                        Ok(()) => Reply::ack(id),
                        Err(e) => {
                            warn!(error = %e, "Screenshot hand-off failed");
                            Reply::failure(id, e.to_string())
                        }
                    }
                }

                other => {
                    warn!(action = other.tag(), "Unhandled action in service context");
                    Reply::failure(id, Error::unknown_action(other.tag()).to_string())
                }
            };

            if let Err(e) = self.channel.reply(reply) {
                error!(error = %e, "Failed to send reply, stopping service");
                break;
            }
        }
        debug!("Service inbox closed");
    }

    /// Captures the visible viewport, parks it, and opens the preview.
    async fn capture_and_present(&self, url: String, include_url: bool) -> Result<()> {
        if is_restricted(&url) {
            return Err(Error::restricted_page(url));
        }

        let data_url = self.backend.capture_visible().await?;
        self.present_payload(ScreenshotPayload {
            data_url,
            url,
            include_url,
            // The preview stamps the header for visible-area captures
            url_already_included: false,
        })
        .await
    }

    /// Parks a payload and notifies the surface with its key.
    async fn present_payload(&self, payload: ScreenshotPayload) -> Result<()> {
        if payload.data_url.is_empty() {
            return Err(Error::delivery("screenshot carried no image data"));
        }

        let id = self.store.store(payload);
        self.surface.present(id).await
    }

    /// Forwards a full-page run to the walker without blocking the loop.
    ///
    /// The run's outcome only needs logging here; the finished image
    /// arrives separately as `showScreenshot`.
    fn start_full_page_run(&self, url: String, include_url: bool) {
        let channel = self.channel.clone();
        tokio::spawn(async move {
            debug!(url = %url, include_url, "Full-page run forwarded to page context");
            let outcome = channel
                .send_with_timeout(
                    Action::ScrollAndCapture { url, include_url },
                    FULL_PAGE_RUN_TIMEOUT,
                )
                .await
                .and_then(Reply::into_ack);

            match outcome {
                Ok(()) => debug!("Full-page run finished"),
                Err(e) => error!(error = %e, "Full-page run failed"),
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::mpsc;

    use super::*;

    /// Backend returning a fixed outcome and counting calls.
    struct FixedBackend {
        data_url: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CaptureBackend for FixedBackend {
        async fn capture_visible(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.data_url {
                Some(data_url) => Ok(data_url.to_string()),
                None => Err(Error::delivery("permission denied")),
            }
        }
    }

    /// Surface pushing presented keys into a channel.
    struct ChannelSurface {
        tx: mpsc::UnboundedSender<HandoffId>,
    }

    #[async_trait]
    impl PresentationSurface for ChannelSurface {
        async fn present(&self, id: HandoffId) -> Result<()> {
            self.tx
                .send(id)
                .map_err(|_| Error::delivery("preview gone"))
        }
    }

    struct Harness {
        trigger: Endpoint,
        trigger_inbox: Inbox,
        store: Arc<HandoffStore>,
        presented: mpsc::UnboundedReceiver<HandoffId>,
        backend_calls: Arc<AtomicUsize>,
    }

    fn spawn_service(data_url: Option<&'static str>) -> Harness {
        let ((service_end, service_inbox), (trigger, trigger_inbox)) = Endpoint::pair();
        let (tx, presented) = mpsc::unbounded_channel();
        let store = Arc::new(HandoffStore::new());
        let backend_calls = Arc::new(AtomicUsize::new(0));

        let service = CaptureService::new(
            FixedBackend {
                data_url,
                calls: Arc::clone(&backend_calls),
            },
            ChannelSurface { tx },
            Arc::clone(&store),
            service_end,
        );
        tokio::spawn(service.serve(service_inbox));

        Harness {
            trigger,
            trigger_inbox,
            store,
            presented,
            backend_calls,
        }
    }

    const DATA_URL: &str = "data:image/png;base64,AAAA";

    #[tokio::test]
    async fn test_visible_area_capture_presents_and_acks() {
        let mut harness = spawn_service(Some(DATA_URL));

        let reply = harness
            .trigger
            .send(Action::CaptureVisibleArea {
                url: "https://example.com".to_string(),
                include_url: true,
            })
            .await
            .expect("reply");
        reply.into_ack().expect("ack");

        let id = harness.presented.recv().await.expect("presented");
        let payload = harness.store.take(&id).expect("payload");
        assert_eq!(payload.data_url, DATA_URL);
        assert_eq!(payload.url, "https://example.com");
        assert!(payload.include_url);
        // Visible-area captures are stamped by the preview, not upstream
        assert!(!payload.url_already_included);
    }

    #[tokio::test]
    async fn test_restricted_page_is_refused_before_capture() {
        let mut harness = spawn_service(Some(DATA_URL));

        let reply = harness
            .trigger
            .send(Action::CaptureVisibleArea {
                url: "about:config".to_string(),
                include_url: false,
            })
            .await
            .expect("reply");

        let err = reply.into_ack().unwrap_err();
        assert!(err.to_string().contains("restricted"));
        assert_eq!(harness.backend_calls.load(Ordering::SeqCst), 0);
        assert!(harness.presented.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_backend_failure_presents_nothing() {
        let mut harness = spawn_service(None);

        let reply = harness
            .trigger
            .send(Action::CaptureVisibleArea {
                url: "https://example.com".to_string(),
                include_url: false,
            })
            .await
            .expect("reply");

        let err = reply.into_ack().unwrap_err();
        assert!(err.to_string().contains("permission denied"));
        assert!(harness.store.is_empty());
        assert!(harness.presented.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_step_capture_returns_data_url() {
        let harness = spawn_service(Some(DATA_URL));

        let reply = harness
            .trigger
            .send(Action::CaptureVisibleAreaForFullPage)
            .await
            .expect("reply");

        assert_eq!(reply.into_data_url().expect("data url"), DATA_URL);
    }

    #[tokio::test]
    async fn test_full_page_run_forwarded_and_acked_early() {
        let mut harness = spawn_service(Some(DATA_URL));

        let reply = harness
            .trigger
            .send(Action::CaptureEntirePage {
                url: "https://example.com/long".to_string(),
                include_url: true,
            })
            .await
            .expect("reply");
        // Ack arrives before the run completes
        reply.into_ack().expect("ack");

        let forwarded = harness.trigger_inbox.recv().await.expect("forwarded");
        match forwarded.action {
            Action::ScrollAndCapture { url, include_url } => {
                assert_eq!(url, "https://example.com/long");
                assert!(include_url);
            }
            other => panic!("unexpected action: {}", other.tag()),
        }
        harness
            .trigger
            .reply(Reply::ack(forwarded.id))
            .expect("run reply");
    }

    #[tokio::test]
    async fn test_restricted_page_refuses_full_page_run() {
        let harness = spawn_service(Some(DATA_URL));

        let reply = harness
            .trigger
            .send(Action::CaptureEntirePage {
                url: "moz-extension://abc/page.html".to_string(),
                include_url: false,
            })
            .await
            .expect("reply");

        assert!(reply.into_ack().unwrap_err().to_string().contains("restricted"));
    }

    #[tokio::test]
    async fn test_show_screenshot_parks_and_presents() {
        let mut harness = spawn_service(Some(DATA_URL));

        let reply = harness
            .trigger
            .send(Action::ShowScreenshot {
                data_url: DATA_URL.to_string(),
                url: "https://example.com".to_string(),
                include_url: true,
                url_already_included: true,
            })
            .await
            .expect("reply");
        reply.into_ack().expect("ack");

        let id = harness.presented.recv().await.expect("presented");
        let payload = harness.store.take(&id).expect("payload");
        // Flag travels through untouched: no double header
        assert!(payload.url_already_included);
    }

    #[tokio::test]
    async fn test_show_screenshot_rejects_empty_image() {
        let mut harness = spawn_service(Some(DATA_URL));

        let reply = harness
            .trigger
            .send(Action::ShowScreenshot {
                data_url: String::new(),
                url: "https://example.com".to_string(),
                include_url: false,
                url_already_included: false,
            })
            .await
            .expect("reply");

        let err = reply.into_ack().unwrap_err();
        assert!(err.to_string().contains("no image data"));
        assert!(harness.store.is_empty());
        assert!(harness.presented.try_recv().is_err());
    }

    #[test]
    fn test_restricted_schemes() {
        assert!(is_restricted("about:config"));
        assert!(is_restricted("chrome://settings"));
        assert!(is_restricted("view-source:https://example.com"));
        assert!(is_restricted("moz-extension://abc/p.html"));
        assert!(!is_restricted("https://example.com"));
        assert!(!is_restricted("not a url"));
    }
}
