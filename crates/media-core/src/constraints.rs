//! Capture constraints and normalization
//!
//! Constraints are the structural description of an acquisition request:
//! each media kind is either a plain on/off flag or a settings object. Two
//! requests that differ only in volatile fields (the chooser-resolved screen
//! source id) must share one captured stream, so cache keys are computed
//! from a normalized form with those fields stripped.

use serde::{Deserialize, Serialize};

/// Where video should be captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    /// A camera device
    Camera,
    /// An entire screen
    Screen,
    /// A single window
    Window,
    /// An application's windows
    Application,
}

impl CaptureSource {
    /// Whether this source is a screen-share variant
    pub fn is_screen_share(&self) -> bool {
        !matches!(self, CaptureSource::Camera)
    }
}

/// Detailed settings for one media kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSettings {
    /// Requested capture source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CaptureSource>,
    /// Platform-resolved source identifier; volatile, excluded from
    /// normalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Requested frame width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Requested frame height
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Requested frame rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<u32>,
}

/// A single media kind's constraint: a flag or a settings object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackConstraint {
    /// Request (or decline) the kind with defaults
    Flag(bool),
    /// Request the kind with detailed settings
    Settings(TrackSettings),
}

impl Default for TrackConstraint {
    fn default() -> Self {
        TrackConstraint::Flag(false)
    }
}

impl TrackConstraint {
    /// Whether this constraint requests the media kind at all
    pub fn is_requested(&self) -> bool {
        match self {
            TrackConstraint::Flag(enabled) => *enabled,
            TrackConstraint::Settings(_) => true,
        }
    }

    fn normalized(&self) -> TrackConstraint {
        match self {
            TrackConstraint::Flag(enabled) => TrackConstraint::Flag(*enabled),
            TrackConstraint::Settings(settings) => TrackConstraint::Settings(TrackSettings {
                source_id: None,
                ..settings.clone()
            }),
        }
    }

    fn canonical(&self) -> String {
        match self {
            TrackConstraint::Flag(enabled) => enabled.to_string(),
            TrackConstraint::Settings(s) => format!(
                "{{source={:?},width={:?},height={:?},frame_rate={:?}}}",
                s.source, s.width, s.height, s.frame_rate
            ),
        }
    }
}

/// Cache key derived from normalized constraints
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintKey(String);

impl std::fmt::Display for ConstraintKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structural specification of requested audio and video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    /// Audio constraint
    pub audio: TrackConstraint,
    /// Video constraint
    pub video: TrackConstraint,
}

impl CaptureConstraints {
    /// Plain audio/video flags
    pub fn audio_video(audio: bool, video: bool) -> Self {
        Self {
            audio: TrackConstraint::Flag(audio),
            video: TrackConstraint::Flag(video),
        }
    }

    /// Screen-share video, no audio
    pub fn screen() -> Self {
        Self {
            audio: TrackConstraint::Flag(false),
            video: TrackConstraint::Settings(TrackSettings {
                source: Some(CaptureSource::Screen),
                ..Default::default()
            }),
        }
    }

    /// Replace the video settings
    pub fn with_video_settings(mut self, settings: TrackSettings) -> Self {
        self.video = TrackConstraint::Settings(settings);
        self
    }

    /// Whether audio is requested
    pub fn audio_requested(&self) -> bool {
        self.audio.is_requested()
    }

    /// Whether video is requested
    pub fn video_requested(&self) -> bool {
        self.video.is_requested()
    }

    /// The screen-share source named by the video constraint, if any
    pub fn requested_screen_source(&self) -> Option<CaptureSource> {
        match &self.video {
            TrackConstraint::Settings(settings) => {
                settings.source.filter(CaptureSource::is_screen_share)
            }
            TrackConstraint::Flag(_) => None,
        }
    }

    /// Whether the video constraint names a screen-share source
    pub fn screen_requested(&self) -> bool {
        self.requested_screen_source().is_some()
    }

    /// Copy with the platform-resolved screen source id filled in
    ///
    /// The id is volatile and never participates in cache keying.
    pub fn with_screen_source_id(&self, source_id: impl Into<String>) -> Self {
        let video = match &self.video {
            TrackConstraint::Settings(settings) => TrackConstraint::Settings(TrackSettings {
                source_id: Some(source_id.into()),
                ..settings.clone()
            }),
            TrackConstraint::Flag(flag) => TrackConstraint::Flag(*flag),
        };
        Self {
            audio: self.audio.clone(),
            video,
        }
    }

    /// Normalized copy with volatile fields stripped
    pub fn normalized(&self) -> Self {
        Self {
            audio: self.audio.normalized(),
            video: self.video.normalized(),
        }
    }

    /// Deterministic cache key over the normalized form
    pub fn cache_key(&self) -> ConstraintKey {
        let normalized = self.normalized();
        ConstraintKey(format!(
            "audio={};video={}",
            normalized.audio.canonical(),
            normalized.video.canonical()
        ))
    }
}
