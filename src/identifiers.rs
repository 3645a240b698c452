//! Type-safe identifiers for pipeline entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time:
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`RequestId`] | Request/reply correlation on the delivery channel |
//! | [`HandoffId`] | Key for the ephemeral screenshot hand-off store |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// RequestId
// ============================================================================

/// Unique identifier correlating a channel request with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh random request ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// HandoffId
// ============================================================================

/// Counter disambiguating hand-off IDs generated within one millisecond.
static HANDOFF_SEQ: AtomicU64 = AtomicU64::new(0);

/// Timestamp-derived key for one screenshot hand-off entry.
///
/// The presentation surface receives this key, reads the payload once,
/// and the entry is removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandoffId(String);

impl HandoffId {
    /// Generates a fresh ID from the current wall clock.
    #[must_use]
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = HANDOFF_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("{millis}-{seq}"))
    }

    /// Returns the ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandoffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_request_id_serde_transparent() {
        let id = RequestId::generate();
        let json = serde_json::to_string(&id).expect("serialize");
        let back: RequestId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, back);
        // Serializes as a bare string, not an object
        assert!(json.starts_with('"'));
    }

    #[test]
    fn test_handoff_id_unique() {
        let a = HandoffId::generate();
        let b = HandoffId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_handoff_id_display() {
        let id = HandoffId::generate();
        assert_eq!(id.to_string(), id.as_str());
    }
}
