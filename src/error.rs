//! Error types for the capture pipeline.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use easy_screenshot::{Result, Error};
//!
//! async fn example(walker: &PageWalker<impl PageDriver>) -> Result<()> {
//!     let request = CaptureRequest::new("https://example.com", true);
//!     let data_url = walker.run(&request).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Measurement | [`Error::Measurement`] |
//! | Capture | [`Error::CaptureStep`], [`Error::RestrictedPage`] |
//! | Composition | [`Error::Composition`] |
//! | Delivery | [`Error::Delivery`], [`Error::ChannelClosed`], [`Error::RequestTimeout`], [`Error::UnknownAction`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Image`], [`Error::Base64`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. Capture failures
/// carry the index of the scroll step that failed so a run abort can be
/// traced to a specific viewport position.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Measurement Errors
    // ========================================================================
    /// Page geometry could not be measured.
    ///
    /// Returned when the page reports no usable document structure,
    /// e.g. a zero-sized viewport.
    #[error("Measurement failed: {message}")]
    Measurement {
        /// Description of the measurement failure.
        message: String,
    },

    // ========================================================================
    // Capture Errors
    // ========================================================================
    /// A single scroll-step capture failed.
    ///
    /// Fatal for the whole run. Capture failures typically reflect a
    /// permission or platform restriction that recurs identically on
    /// retry, so the run is aborted rather than retried.
    #[error("Capture failed at step {step}: {message}")]
    CaptureStep {
        /// Zero-based index into the scroll plan.
        step: usize,
        /// Authority error message, or a generic no-data signal.
        message: String,
    },

    /// The target page cannot be captured by the platform.
    ///
    /// Returned for privileged URL schemes before any capture is attempted.
    #[error("Cannot capture restricted page: {url}")]
    RestrictedPage {
        /// The refused target URL.
        url: String,
    },

    // ========================================================================
    // Composition Errors
    // ========================================================================
    /// Stitching or annotation failed.
    ///
    /// Returned when segment decode, canvas allocation, or final encoding
    /// cannot produce a valid image.
    #[error("Composition failed: {message}")]
    Composition {
        /// Description of the composition failure.
        message: String,
    },

    // ========================================================================
    // Delivery Errors
    // ========================================================================
    /// The delivery channel reported a transport-level error.
    ///
    /// Distinct from a step-level capture error: the message itself could
    /// not be relayed.
    #[error("Delivery failed: {message}")]
    Delivery {
        /// Description of the transport failure.
        message: String,
    },

    /// The delivery channel endpoint is closed.
    #[error("Channel closed")]
    ChannelClosed,

    /// A request over the delivery channel timed out.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// A peer sent a request this endpoint does not handle.
    #[error("Unknown action: {action}")]
    UnknownAction {
        /// The unrecognized action tag.
        action: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decode or encode error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Base64 decode error in a data URI payload.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelRecv(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a measurement error.
    #[inline]
    pub fn measurement(message: impl Into<String>) -> Self {
        Self::Measurement {
            message: message.into(),
        }
    }

    /// Creates a capture-step error.
    #[inline]
    pub fn capture_step(step: usize, message: impl Into<String>) -> Self {
        Self::CaptureStep {
            step,
            message: message.into(),
        }
    }

    /// Creates a restricted-page error.
    #[inline]
    pub fn restricted_page(url: impl Into<String>) -> Self {
        Self::RestrictedPage { url: url.into() }
    }

    /// Creates a composition error.
    #[inline]
    pub fn composition(message: impl Into<String>) -> Self {
        Self::Composition {
            message: message.into(),
        }
    }

    /// Creates a delivery error.
    #[inline]
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates an unknown-action error.
    #[inline]
    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction {
            action: action.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Returns `true` if this is a step-level capture error.
    #[inline]
    #[must_use]
    pub fn is_capture_error(&self) -> bool {
        matches!(self, Self::CaptureStep { .. } | Self::RestrictedPage { .. })
    }

    /// Returns `true` if this is a transport-level delivery error.
    #[inline]
    #[must_use]
    pub fn is_delivery_error(&self) -> bool {
        matches!(
            self,
            Self::Delivery { .. }
                | Self::ChannelClosed
                | Self::ChannelRecv(_)
                | Self::RequestTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::capture_step(3, "no capture data returned");
        assert_eq!(
            err.to_string(),
            "Capture failed at step 3: no capture data returned"
        );
    }

    #[test]
    fn test_measurement_error() {
        let err = Error::measurement("viewport has zero height");
        assert_eq!(
            err.to_string(),
            "Measurement failed: viewport has zero height"
        );
    }

    #[test]
    fn test_is_capture_error() {
        let step_err = Error::capture_step(0, "denied");
        let restricted_err = Error::restricted_page("about:config");
        let other_err = Error::composition("bad canvas");

        assert!(step_err.is_capture_error());
        assert!(restricted_err.is_capture_error());
        assert!(!other_err.is_capture_error());
    }

    #[test]
    fn test_is_delivery_error() {
        let delivery_err = Error::delivery("send failed");
        let closed_err = Error::ChannelClosed;
        let timeout_err = Error::request_timeout(RequestId::generate(), 5000);
        let other_err = Error::measurement("test");

        assert!(delivery_err.is_delivery_error());
        assert!(closed_err.is_delivery_error());
        assert!(timeout_err.is_delivery_error());
        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_delivery_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
