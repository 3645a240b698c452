//! Delivery channel transport layer.
//!
//! This module relays action-tagged messages between execution contexts:
//! the trigger UI, the privileged capture service, and the in-page walker.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Capture        │        JSON frames           │  Page Walker    │
//! │  Service        │◄────────────────────────────►│  (page context) │
//! │                 │       Endpoint::pair         │                 │
//! │  Endpoint+Inbox │                              │  Endpoint+Inbox │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! Each endpoint owns an event loop task that correlates replies to
//! pending requests by ID and routes incoming requests to an inbox.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `endpoint` | Endpoint pair, correlation, and event loop |

// ============================================================================
// Submodules
// ============================================================================

/// Endpoint pair and event loop.
pub mod endpoint;

// ============================================================================
// Re-exports
// ============================================================================

pub use endpoint::{Endpoint, Inbox};
