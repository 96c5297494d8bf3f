//! Notifications emitted by local media instances

use serde::{Deserialize, Serialize};

/// The media type a control operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Audio tracks
    Audio,
    /// Video tracks
    Video,
}

/// Events published by a [`crate::LocalMedia`] instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// A media kind was muted or unmuted
    Mute {
        /// Which tracks were toggled
        kind: MediaKind,
        /// The new muted state
        muted: bool,
    },
    /// The instance was stopped and its stream reference released
    Stopped,
    /// Capture completed and access to the devices was granted
    Allowed,
    /// A capture request has been pending long enough that a permission
    /// prompt is probably showing
    RequestingMedia,
}
