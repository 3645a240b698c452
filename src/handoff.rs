//! Ephemeral screenshot hand-off.
//!
//! A finished screenshot travels to the presentation surface by reference,
//! not by value: the payload is parked under a generated key and only the
//! key crosses the presentation boundary. The surface redeems the key
//! exactly once; redemption removes the entry, so abandoned previews do
//! not accumulate image data.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::identifiers::HandoffId;

// ============================================================================
// ScreenshotPayload
// ============================================================================

/// A finished screenshot with its presentation metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotPayload {
    /// The image as a PNG data URI.
    pub data_url: String,
    /// URL of the captured page.
    pub url: String,
    /// Whether the user asked for the URL header.
    pub include_url: bool,
    /// Whether the header is already stamped into `data_url`. When set,
    /// the surface must not stamp it again.
    pub url_already_included: bool,
}

// ============================================================================
// HandoffStore
// ============================================================================

/// Keyed parking lot for screenshots in transit to a presentation surface.
#[derive(Debug, Default)]
pub struct HandoffStore {
    entries: Mutex<FxHashMap<HandoffId, ScreenshotPayload>>,
}

impl HandoffStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a payload and returns its redemption key.
    #[must_use]
    pub fn store(&self, payload: ScreenshotPayload) -> HandoffId {
        let id = HandoffId::generate();
        debug!(id = %id, bytes = payload.data_url.len(), "Screenshot parked for hand-off");
        self.entries.lock().insert(id.clone(), payload);
        id
    }

    /// Redeems a key, removing and returning its payload.
    ///
    /// A second redemption of the same key returns `None`.
    #[must_use]
    pub fn take(&self, id: &HandoffId) -> Option<ScreenshotPayload> {
        let payload = self.entries.lock().remove(id);
        if payload.is_none() {
            warn!(id = %id, "Hand-off key not found or already redeemed");
        }
        payload
    }

    /// Number of payloads currently parked.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is parked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ScreenshotPayload {
        ScreenshotPayload {
            data_url: "data:image/png;base64,AAAA".to_string(),
            url: "https://example.com".to_string(),
            include_url: true,
            url_already_included: false,
        }
    }

    #[test]
    fn test_store_and_redeem() {
        let store = HandoffStore::new();
        let id = store.store(payload());
        assert_eq!(store.len(), 1);

        let redeemed = store.take(&id).expect("payload");
        assert_eq!(redeemed, payload());
        assert!(store.is_empty());
    }

    #[test]
    fn test_second_redemption_is_empty() {
        let store = HandoffStore::new();
        let id = store.store(payload());

        assert!(store.take(&id).is_some());
        assert!(store.take(&id).is_none());
    }

    #[test]
    fn test_keys_are_distinct() {
        let store = HandoffStore::new();
        let first = store.store(payload());
        let second = store.store(payload());

        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }
}
