//! Local media resource management for peerlink
//!
//! This crate owns everything about locally captured media: the structural
//! capture constraints and their normalization, a process-wide
//! reference-counted cache of captured streams, the per-instance capture
//! state machine with its permission-prompt suppression timer, idempotent
//! mute controls, and capability introspection that works both before and
//! after capture completes.
//!
//! The actual capture engine, screen-source selection, and local preview
//! rendering are external collaborators behind the trait seams in
//! [`engine`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use peerlink_media_core::{CaptureConstraints, LocalMediaManager, MediaEngine};
//!
//! async fn capture(engine: Arc<dyn MediaEngine>) -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = LocalMediaManager::new(engine);
//!     let media = manager.create(Some(CaptureConstraints::audio_video(true, true)), None);
//!     media.start().await?;
//!     assert!(media.has_audio());
//!     media.stop();
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod constraints;
pub mod engine;
pub mod error;
pub mod events;
pub mod instance;
pub mod manager;
pub mod sdp;

pub use cache::{ReleaseOutcome, StreamCache};
pub use constraints::{CaptureConstraints, CaptureSource, ConstraintKey, TrackConstraint, TrackSettings};
pub use engine::{
    CaptureErrorCode, MediaEngine, MediaStreamHandle, MediaTrack, PreviewOptions, PreviewSink,
    ScreenSourceChooser,
};
pub use error::{CaptureFailureKind, MediaError, MediaResult};
pub use events::{MediaEvent, MediaKind};
pub use instance::{CaptureState, LocalMedia};
pub use manager::LocalMediaManager;
pub use sdp::{summarize_sdp, MediaSummary};
