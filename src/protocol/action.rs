//! Action definitions for the delivery channel.
//!
//! Each action is tagged on the wire by its `action` field, matching the
//! message contracts of the extension runtime bus.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Action
// ============================================================================

/// All delivery channel actions.
///
/// Field names are camelCased on the wire to match the runtime message
/// format the presentation surface and trigger UI speak.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Action {
    /// Trigger → service: capture the visible viewport and present it.
    #[serde(rename = "captureVisibleArea")]
    CaptureVisibleArea {
        /// URL of the captured tab.
        url: String,
        /// Whether the preview should stamp the URL header.
        #[serde(rename = "includeUrl")]
        include_url: bool,
    },

    /// Trigger → service: start a full-page capture run in the page context.
    #[serde(rename = "captureEntirePage")]
    CaptureEntirePage {
        /// URL of the captured tab.
        url: String,
        /// Whether the stitched image should carry the URL header.
        #[serde(rename = "includeUrl")]
        include_url: bool,
    },

    /// Walker → service: rasterize the currently visible viewport.
    ///
    /// Invoked once per scroll step during a full-page run.
    #[serde(rename = "captureVisibleAreaForFullPage")]
    CaptureVisibleAreaForFullPage,

    /// Service → walker: run the scroll/capture/stitch pipeline.
    #[serde(rename = "scrollAndCapture")]
    ScrollAndCapture {
        /// URL of the captured tab.
        url: String,
        /// Whether the stitched image should carry the URL header.
        #[serde(rename = "includeUrl")]
        include_url: bool,
    },

    /// Walker → service: hand a finished image to the presentation surface.
    #[serde(rename = "showScreenshot")]
    ShowScreenshot {
        /// Finished image as a PNG data URI.
        #[serde(rename = "dataUrl")]
        data_url: String,
        /// URL of the captured tab.
        url: String,
        /// Whether the URL header was requested.
        #[serde(rename = "includeUrl")]
        include_url: bool,
        /// Set when the header was already stamped upstream, so the
        /// presentation surface does not add a second one.
        #[serde(rename = "urlAlreadyIncluded", default)]
        url_already_included: bool,
    },
}

impl Action {
    /// Returns the wire tag for this action.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CaptureVisibleArea { .. } => "captureVisibleArea",
            Self::CaptureEntirePage { .. } => "captureEntirePage",
            Self::CaptureVisibleAreaForFullPage => "captureVisibleAreaForFullPage",
            Self::ScrollAndCapture { .. } => "scrollAndCapture",
            Self::ShowScreenshot { .. } => "showScreenshot",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tag_serialization() {
        let action = Action::CaptureVisibleArea {
            url: "https://example.com".to_string(),
            include_url: true,
        };
        let json = serde_json::to_string(&action).expect("serialize");

        assert!(json.contains(r#""action":"captureVisibleArea""#));
        assert!(json.contains(r#""includeUrl":true"#));
    }

    #[test]
    fn test_unit_action_round_trip() {
        let json = r#"{"action":"captureVisibleAreaForFullPage"}"#;
        let action: Action = serde_json::from_str(json).expect("parse");
        assert!(matches!(action, Action::CaptureVisibleAreaForFullPage));
        assert_eq!(action.tag(), "captureVisibleAreaForFullPage");
    }

    #[test]
    fn test_show_screenshot_flag_defaults() {
        // urlAlreadyIncluded is optional on the wire
        let json = r#"{
            "action": "showScreenshot",
            "dataUrl": "data:image/png;base64,AAAA",
            "url": "https://example.com",
            "includeUrl": false
        }"#;

        let action: Action = serde_json::from_str(json).expect("parse");
        match action {
            Action::ShowScreenshot {
                url_already_included,
                include_url,
                ..
            } => {
                assert!(!url_already_included);
                assert!(!include_url);
            }
            other => panic!("unexpected action: {}", other.tag()),
        }
    }
}
