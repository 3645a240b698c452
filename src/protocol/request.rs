//! Request and Reply message types.
//!
//! Defines the message format relayed over the delivery channel between
//! execution contexts.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::Action;

// ============================================================================
// Request
// ============================================================================

/// An action-tagged request from one context to another.
///
/// # Format
///
/// ```json
/// {
///   "id": "uuid",
///   "action": "scrollAndCapture",
///   "url": "https://example.com",
///   "includeUrl": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier for request/reply correlation.
    pub id: RequestId,

    /// The action with its payload.
    #[serde(flatten)]
    pub action: Action,
}

impl Request {
    /// Creates a new request with auto-generated ID.
    #[inline]
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            id: RequestId::generate(),
            action,
        }
    }
}

// ============================================================================
// Reply
// ============================================================================

/// A reply correlated to a request by ID.
///
/// # Format
///
/// Ack: `{"id": "uuid", "success": true}`.
/// Capture data: `{"id": "uuid", "dataUrl": "data:image/png;base64,…"}`.
/// Error: `{"id": "uuid", "error": "message"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Set to `true` on a plain acknowledgement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    /// Captured image as a PNG data URI (capture replies only).
    #[serde(
        rename = "dataUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub data_url: Option<String>,

    /// Error message (error replies only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    /// Creates an acknowledgement reply.
    #[inline]
    #[must_use]
    pub fn ack(id: RequestId) -> Self {
        Self {
            id,
            success: Some(true),
            data_url: None,
            error: None,
        }
    }

    /// Creates a capture-data reply.
    #[inline]
    #[must_use]
    pub fn capture(id: RequestId, data_url: impl Into<String>) -> Self {
        Self {
            id,
            success: None,
            data_url: Some(data_url.into()),
            error: None,
        }
    }

    /// Creates an error reply.
    #[inline]
    #[must_use]
    pub fn failure(id: RequestId, message: impl Into<String>) -> Self {
        Self {
            id,
            success: None,
            data_url: None,
            error: Some(message.into()),
        }
    }

    /// Returns `true` if this is an error reply.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the acknowledgement, returning the peer error if present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Delivery`] if the reply carries an error message.
    pub fn into_ack(self) -> Result<()> {
        match self.error {
            None => Ok(()),
            Some(message) => Err(Error::delivery(message)),
        }
    }

    /// Extracts the capture data URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Delivery`] if the reply carries an error message
    /// or no capture data at all.
    pub fn into_data_url(self) -> Result<String> {
        if let Some(message) = self.error {
            return Err(Error::delivery(message));
        }
        self.data_url
            .ok_or_else(|| Error::delivery("reply carried no capture data"))
    }
}

// ============================================================================
// Tests
// ============================================================================
