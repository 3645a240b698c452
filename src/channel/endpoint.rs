//! Channel endpoints and the correlation event loop.
//!
//! An [`Endpoint`] is one side of the delivery channel. Messages travel as
//! JSON text frames; the event loop correlates replies to pending requests
//! by ID and hands incoming requests to the endpoint's inbox.
//!
//! # Event Loop
//!
//! Each endpoint spawns a tokio task that handles:
//!
//! - Incoming frames from the peer (requests, replies)
//! - Outgoing requests and replies from the local API
//! - Request/reply correlation by UUID

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{from_str, to_string};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Action, Reply, Request};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for a request awaiting its reply.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pending requests before rejecting new ones.
///
/// The capture pipeline keeps a single request in flight at a time; the
/// bound only guards against a stuck peer.
const MAX_PENDING_REQUESTS: usize = 16;

// ============================================================================
// Types
// ============================================================================

/// Map of request IDs to reply channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<Reply>>>;

/// Incoming request stream for one endpoint.
pub type Inbox = mpsc::UnboundedReceiver<Request>;

// ============================================================================
// EndpointCommand
// ============================================================================

/// Internal commands for the event loop.
enum EndpointCommand {
    /// Send a request and wait for the correlated reply.
    Send {
        request: Request,
        reply_tx: oneshot::Sender<Result<Reply>>,
    },
    /// Send a request without awaiting a reply.
    Notify { request: Request },
    /// Answer a request received on the inbox.
    Reply { reply: Reply },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(RequestId),
    /// Shutdown the endpoint.
    Shutdown,
}

// ============================================================================
// Endpoint
// ============================================================================

/// One side of the delivery channel.
///
/// Cloneable; all clones share the same event loop and correlation map.
///
/// # Thread Safety
///
/// `Endpoint` is `Send + Sync` and can be shared across tasks. All
/// operations are non-blocking.
pub struct Endpoint {
    /// Context name used in log output.
    name: &'static str,
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<EndpointCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
}

impl Clone for Endpoint {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            command_tx: self.command_tx.clone(),
            correlation: Arc::clone(&self.correlation),
        }
    }
}

impl Endpoint {
    /// Creates a connected endpoint pair with their inboxes.
    ///
    /// The first element plays the privileged (service) side and the
    /// second the page side, but the two are symmetrical.
    #[must_use]
    pub fn pair() -> ((Endpoint, Inbox), (Endpoint, Inbox)) {
        let (a_to_b_tx, a_to_b_rx) = mpsc::unbounded_channel();
        let (b_to_a_tx, b_to_a_rx) = mpsc::unbounded_channel();

        let a = Endpoint::spawn("service", a_to_b_tx, b_to_a_rx);
        let b = Endpoint::spawn("page", b_to_a_tx, a_to_b_rx);
        (a, b)
    }

    /// Spawns one endpoint's event loop over a frame channel pair.
    fn spawn(
        name: &'static str,
        frame_tx: mpsc::UnboundedSender<String>,
        frame_rx: mpsc::UnboundedReceiver<String>,
    ) -> (Endpoint, Inbox) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));

        tokio::spawn(Self::run_event_loop(
            name,
            frame_tx,
            frame_rx,
            command_rx,
            inbox_tx,
            Arc::clone(&correlation),
        ));

        (
            Self {
                name,
                command_tx,
                correlation,
            },
            inbox_rx,
        )
    }

    /// Sends a request and waits for its reply with the default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ChannelClosed`] if the endpoint is closed
    /// - [`Error::RequestTimeout`] if no reply arrives within the timeout
    /// - [`Error::Delivery`] if too many requests are pending
    pub async fn send(&self, action: Action) -> Result<Reply> {
        self.send_with_timeout(action, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Sends a request and waits for its reply with a custom timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ChannelClosed`] if the endpoint is closed
    /// - [`Error::RequestTimeout`] if no reply arrives within the timeout
    /// - [`Error::Delivery`] if too many requests are pending
    pub async fn send_with_timeout(
        &self,
        action: Action,
        request_timeout: Duration,
    ) -> Result<Reply> {
        let request = Request::new(action);
        let request_id = request.id;

        // Check pending request limit
        {
            let correlation = self.correlation.lock();
            if correlation.len() >= MAX_PENDING_REQUESTS {
                warn!(
                    endpoint = self.name,
                    pending = correlation.len(),
                    max = MAX_PENDING_REQUESTS,
                    "Too many pending requests"
                );
                return Err(Error::delivery(format!(
                    "Too many pending requests: {}/{}",
                    correlation.len(),
                    MAX_PENDING_REQUESTS
                )));
            }
        }

        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(EndpointCommand::Send { request, reply_tx })
            .map_err(|_| Error::ChannelClosed)?;

        match timeout(request_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ChannelClosed),
            Err(_) => {
                // Timeout - clean up correlation entry
                let _ = self
                    .command_tx
                    .send(EndpointCommand::RemoveCorrelation(request_id));

                Err(Error::request_timeout(
                    request_id,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Sends a request without awaiting a reply.
    ///
    /// Used for fire-and-forget hand-offs like `showScreenshot`. Any reply
    /// the peer sends is dropped by the event loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the endpoint is closed.
    pub fn notify(&self, action: Action) -> Result<()> {
        let request = Request::new(action);
        self.command_tx
            .send(EndpointCommand::Notify { request })
            .map_err(|_| Error::ChannelClosed)
    }

    /// Answers a request received on the inbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the endpoint is closed.
    pub fn reply(&self, reply: Reply) -> Result<()> {
        self.command_tx
            .send(EndpointCommand::Reply { reply })
            .map_err(|_| Error::ChannelClosed)
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Shuts down the endpoint.
    ///
    /// Pending requests are failed with [`Error::ChannelClosed`].
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(EndpointCommand::Shutdown);
    }

    /// Event loop that handles frame I/O for one endpoint.
    async fn run_event_loop(
        name: &'static str,
        frame_tx: mpsc::UnboundedSender<String>,
        mut frame_rx: mpsc::UnboundedReceiver<String>,
        mut command_rx: mpsc::UnboundedReceiver<EndpointCommand>,
        inbox_tx: mpsc::UnboundedSender<Request>,
        correlation: Arc<Mutex<CorrelationMap>>,
    ) {
        loop {
            tokio::select! {
                // Incoming frames from the peer
                frame = frame_rx.recv() => {
                    match frame {
                        Some(text) => {
                            Self::handle_incoming_frame(name, &text, &inbox_tx, &correlation);
                        }
                        None => {
                            debug!(endpoint = name, "Peer closed the channel");
                            break;
                        }
                    }
                }

                // Commands from the local API
                command = command_rx.recv() => {
                    match command {
                        Some(EndpointCommand::Send { request, reply_tx }) => {
                            let request_id = request.id;
                            match to_string(&request) {
                                Ok(json) => {
                                    correlation.lock().insert(request_id, reply_tx);
                                    if frame_tx.send(json).is_err()
                                        && let Some(tx) = correlation.lock().remove(&request_id)
                                    {
                                        let _ = tx.send(Err(Error::ChannelClosed));
                                    }
                                    trace!(endpoint = name, %request_id, "Request sent");
                                }
                                Err(e) => {
                                    let _ = reply_tx.send(Err(Error::Json(e)));
                                }
                            }
                        }

                        Some(EndpointCommand::Notify { request }) => {
                            match to_string(&request) {
                                Ok(json) => {
                                    if frame_tx.send(json).is_err() {
                                        warn!(endpoint = name, "Notification dropped: peer gone");
                                    }
                                }
                                Err(e) => warn!(endpoint = name, error = %e, "Notification serialization failed"),
                            }
                        }

                        Some(EndpointCommand::Reply { reply }) => {
                            match to_string(&reply) {
                                Ok(json) => {
                                    if frame_tx.send(json).is_err() {
                                        warn!(endpoint = name, "Reply dropped: peer gone");
                                    }
                                }
                                Err(e) => warn!(endpoint = name, error = %e, "Reply serialization failed"),
                            }
                        }

                        Some(EndpointCommand::RemoveCorrelation(request_id)) => {
                            correlation.lock().remove(&request_id);
                            debug!(endpoint = name, %request_id, "Removed timed-out correlation");
                        }

                        Some(EndpointCommand::Shutdown) => {
                            debug!(endpoint = name, "Shutdown command received");
                            break;
                        }

                        None => {
                            debug!(endpoint = name, "Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        // Fail all pending requests on shutdown
        Self::fail_pending_requests(name, &correlation);

        debug!(endpoint = name, "Event loop terminated");
    }

    /// Handles an incoming text frame from the peer.
    ///
    /// Requests carry an action tag, replies do not, so a frame is tried
    /// as a request first.
    fn handle_incoming_frame(
        name: &'static str,
        text: &str,
        inbox_tx: &mpsc::UnboundedSender<Request>,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        if let Ok(request) = from_str::<Request>(text) {
            trace!(endpoint = name, id = %request.id, action = request.action.tag(), "Request received");
            if inbox_tx.send(request).is_err() {
                warn!(endpoint = name, "Inbox dropped, discarding request");
            }
            return;
        }

        if let Ok(reply) = from_str::<Reply>(text) {
            let tx = correlation.lock().remove(&reply.id);
            if let Some(tx) = tx {
                let _ = tx.send(Ok(reply));
            } else {
                // Replies to notifications land here
                trace!(endpoint = name, id = %reply.id, "Reply for unknown request");
            }
            return;
        }

        warn!(endpoint = name, text = %text, "Failed to parse incoming frame");
    }

    /// Fails all pending requests with a closed-channel error.
    fn fail_pending_requests(name: &'static str, correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ChannelClosed));
        }

        if count > 0 {
            debug!(endpoint = name, count, "Failed pending requests on shutdown");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_reply_correlation() {
        let ((service, _service_inbox), (page, mut page_inbox)) = Endpoint::pair();

        // Page side answers capture requests
        tokio::spawn(async move {
            while let Some(request) = page_inbox.recv().await {
                let reply = Reply::capture(request.id, "data:image/png;base64,AAAA");
                page.reply(reply).expect("reply");
            }
        });

        let reply = service
            .send(Action::CaptureVisibleAreaForFullPage)
            .await
            .expect("reply");
        let data_url = reply.into_data_url().expect("data url");
        assert!(data_url.starts_with("data:image/png;base64,"));
        assert_eq!(service.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let ((service, _service_inbox), (_page, _page_inbox)) = Endpoint::pair();

        // Nobody answers
        let err = service
            .send_with_timeout(
                Action::CaptureVisibleAreaForFullPage,
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(service.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_notify_reaches_peer_inbox() {
        let ((service, mut service_inbox), (page, _page_inbox)) = Endpoint::pair();

        page.notify(Action::ShowScreenshot {
            data_url: "data:image/png;base64,AAAA".to_string(),
            url: "https://example.com".to_string(),
            include_url: true,
            url_already_included: true,
        })
        .expect("notify");

        let request = service_inbox.recv().await.expect("request");
        assert_eq!(request.action.tag(), "showScreenshot");
        assert_eq!(service.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_fails_pending() {
        let ((service, _service_inbox), (_page, _page_inbox)) = Endpoint::pair();

        let sender = service.clone();
        let pending =
            tokio::spawn(
                async move { sender.send(Action::CaptureVisibleAreaForFullPage).await },
            );

        // Give the request time to register, then shut down
        tokio::time::sleep(Duration::from_millis(20)).await;
        service.shutdown();

        let err = pending.await.expect("join").unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
    }

    #[tokio::test]
    async fn test_reply_to_notification_is_dropped() {
        let ((service, _service_inbox), (page, mut page_inbox)) = Endpoint::pair();

        service.notify(Action::CaptureVisibleAreaForFullPage).expect("notify");
        let request = page_inbox.recv().await.expect("request");
        // Peer replies even though nobody is waiting
        page.reply(Reply::ack(request.id)).expect("reply");

        // No correlation entry, nothing panics, nothing pends
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(service.pending_count(), 0);
    }
}
