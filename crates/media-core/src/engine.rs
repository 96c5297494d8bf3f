//! Trait seams for the external media engine
//!
//! The capture engine, screen-source selection, and local preview rendering
//! are platform collaborators this crate consumes but does not implement.
//! Each seam is an object-safe trait so applications and tests can supply
//! their own.

use std::sync::Arc;

use async_trait::async_trait;
use peerlink_infra_common::events::Notifier;

use crate::constraints::{CaptureConstraints, CaptureSource};
use crate::error::MediaError;

/// Engine-reported capture failure code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureErrorCode {
    /// The user or platform denied access to the requested devices
    PermissionDenied,
    /// Any other engine failure, with the engine's own description
    Failed(String),
}

/// One track of a captured stream
pub trait MediaTrack: Send + Sync {
    /// Track identifier
    fn id(&self) -> &str;
    /// Whether the track currently produces media
    fn enabled(&self) -> bool;
    /// Toggle the track
    fn set_enabled(&self, enabled: bool);
}

/// A captured media stream owned by the engine
pub trait MediaStreamHandle: Send + Sync {
    /// Stream identifier
    fn id(&self) -> &str;
    /// All audio tracks
    fn audio_tracks(&self) -> Vec<Arc<dyn MediaTrack>>;
    /// All video tracks
    fn video_tracks(&self) -> Vec<Arc<dyn MediaTrack>>;
    /// Stop the underlying capture
    fn stop(&self);
    /// Fires when the engine ends the stream (device unplugged, share
    /// stopped from the platform UI)
    fn ended(&self) -> &Notifier<()>;
}

/// The capture engine itself
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Request a captured stream matching the constraints
    ///
    /// Resolution is bounded only by the engine and the user; a request
    /// cannot be canceled once issued. Callers that stop waiting must
    /// tolerate and discard a late completion.
    async fn request_capture(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Arc<dyn MediaStreamHandle>, CaptureErrorCode>;
}

/// Platform integration that resolves a screen-share source id
#[async_trait]
pub trait ScreenSourceChooser: Send + Sync {
    /// Pick a concrete source for the requested screen-share kind
    async fn choose_source(&self, source: CaptureSource) -> Result<String, MediaError>;
}

/// How a stream should be attached to a local preview
#[derive(Debug, Clone, Copy)]
pub struct PreviewOptions {
    /// Mute the preview output (self-preview must not echo)
    pub muted: bool,
    /// Start playback immediately
    pub autoplay: bool,
}

/// Local self-preview output for a captured stream
pub trait PreviewSink: Send + Sync {
    /// Attach a stream to the preview
    fn attach(&self, stream: &Arc<dyn MediaStreamHandle>, options: PreviewOptions);
    /// Detach whatever is attached
    fn detach(&self);
}
