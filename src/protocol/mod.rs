//! Delivery channel message types.
//!
//! This module defines the message format relayed between the trigger UI,
//! the capture service, and the in-page walker.
//!
//! # Protocol Overview
//!
//! | Message Type | Purpose |
//! |--------------|---------|
//! | `Request` | Action-tagged request |
//! | `Reply` | Correlated response (ack, capture data, or error) |
//!
//! # Action Naming
//!
//! Actions carry their tag in an `action` field:
//!
//! - `captureVisibleArea`
//! - `captureEntirePage`
//! - `captureVisibleAreaForFullPage`
//! - `scrollAndCapture`
//! - `showScreenshot`

// ============================================================================
// Submodules
// ============================================================================

/// Action definitions.
pub mod action;

/// Request and Reply message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use action::Action;
pub use request::{Reply, Request};
