//! Per-instance capture state machine
//!
//! A [`LocalMedia`] instance represents one request for local media. Live
//! instances move `Idle → RequestingCapture → Capturing → Stopped` (with
//! `Failed` reachable from `RequestingCapture`); temporary snapshots
//! describe capability only and never capture.
//!
//! Capture requests share streams through the injected [`StreamCache`]: a
//! request whose normalized constraints are already cached attaches to the
//! existing stream instead of touching the engine. A fresh request arms a
//! deferred "requesting media" notification so the application can show a
//! permission hint, canceled the instant the engine answers so it never
//! flashes when access is granted silently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use peerlink_infra_common::events::Notifier;

use crate::cache::{ReleaseOutcome, StreamCache};
use crate::constraints::{CaptureConstraints, CaptureSource, ConstraintKey};
use crate::engine::{
    MediaEngine, MediaStreamHandle, PreviewOptions, PreviewSink, ScreenSourceChooser,
};
use crate::error::{MediaError, MediaResult};
use crate::events::{MediaEvent, MediaKind};
use crate::sdp::{summarize_sdp, MediaSummary};

/// How long a capture request may stay pending before the
/// requesting-media notification fires
const PERMISSION_PROMPT_DELAY: Duration = Duration::from_millis(500);

/// Lifecycle state of a [`LocalMedia`] instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Created, no capture requested yet
    Idle,
    /// A capture request is in flight
    RequestingCapture,
    /// A stream is attached and live
    Capturing,
    /// Stopped; the stream reference has been released
    Stopped,
    /// The capture request failed
    Failed,
}

/// One local media request with its capture state, stream reference, mute
/// flags, and notification surface
pub struct LocalMedia {
    id: Uuid,
    created_at: DateTime<Utc>,
    constraints: Option<CaptureConstraints>,
    temporary: bool,
    engine: Arc<dyn MediaEngine>,
    cache: Arc<StreamCache>,
    chooser: Option<Arc<dyn ScreenSourceChooser>>,
    sink: Option<Arc<dyn PreviewSink>>,
    state: Mutex<CaptureState>,
    stream: Mutex<Option<Arc<dyn MediaStreamHandle>>>,
    cache_key: Mutex<Option<ConstraintKey>>,
    screen_requested: AtomicBool,
    remote_summary: Mutex<Option<MediaSummary>>,
    audio_muted: AtomicBool,
    video_muted: AtomicBool,
    prompt_timer: Mutex<Option<tokio::task::JoinHandle<()>>>,
    events: Notifier<MediaEvent>,
}

impl LocalMedia {
    pub(crate) fn new(
        constraints: Option<CaptureConstraints>,
        temporary: bool,
        engine: Arc<dyn MediaEngine>,
        cache: Arc<StreamCache>,
        chooser: Option<Arc<dyn ScreenSourceChooser>>,
        sink: Option<Arc<dyn PreviewSink>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            constraints,
            temporary,
            engine,
            cache,
            chooser,
            sink,
            state: Mutex::new(CaptureState::Idle),
            stream: Mutex::new(None),
            cache_key: Mutex::new(None),
            screen_requested: AtomicBool::new(false),
            remote_summary: Mutex::new(None),
            audio_muted: AtomicBool::new(false),
            video_muted: AtomicBool::new(false),
            prompt_timer: Mutex::new(None),
            events: Notifier::new(),
        })
    }

    /// Instance identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the instance was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this is a temporary capability snapshot
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// The requested constraints
    pub fn constraints(&self) -> Option<&CaptureConstraints> {
        self.constraints.as_ref()
    }

    /// Current lifecycle state
    pub fn state(&self) -> CaptureState {
        *self.state.lock()
    }

    /// Notification surface for this instance
    pub fn events(&self) -> &Notifier<MediaEvent> {
        &self.events
    }

    /// The attached stream, while capturing
    pub fn stream(&self) -> Option<Arc<dyn MediaStreamHandle>> {
        self.stream.lock().clone()
    }

    /// Begin capturing
    ///
    /// Temporary snapshots always fail; live instances issue a capture
    /// request, reusing a cached stream when one matches.
    pub async fn start(self: &Arc<Self>) -> MediaResult<()> {
        if self.temporary {
            return Err(MediaError::invalid_operation(
                "temporary media describes capability only and cannot be started",
            ));
        }
        self.request_capture().await
    }

    async fn request_capture(self: &Arc<Self>) -> MediaResult<()> {
        let constraints = self
            .constraints
            .clone()
            .ok_or(MediaError::MissingConstraints)?;

        *self.state.lock() = CaptureState::RequestingCapture;
        self.screen_requested
            .store(constraints.screen_requested(), Ordering::SeqCst);

        let key = constraints.cache_key();
        if let Some(stream) = self.cache.checkout(&key) {
            self.adopt_stream(key, stream);
            return Ok(());
        }

        // Deferred permission hint, canceled the instant the engine answers
        self.arm_prompt_timer();

        let effective = match constraints.requested_screen_source() {
            Some(source) => match self.resolve_screen_source(&constraints, source).await {
                Ok(resolved) => resolved,
                Err(err) => {
                    self.cancel_prompt_timer();
                    *self.state.lock() = CaptureState::Failed;
                    return Err(err);
                }
            },
            None => constraints.clone(),
        };

        match self.engine.request_capture(&effective).await {
            Ok(stream) => {
                self.cancel_prompt_timer();
                if self.state() == CaptureState::Stopped {
                    // Stopped while the request was in flight; discard the
                    // completion without a state transition
                    tracing::debug!(media_id = %self.id, "capture completed after stop, discarding");
                    stream.stop();
                    return Ok(());
                }
                let canonical = self.cache.insert(key.clone(), constraints, stream.clone());
                if !Arc::ptr_eq(&canonical, &stream) {
                    // A concurrent capture for the same constraints won
                    stream.stop();
                }
                self.adopt_stream(key, canonical);
                self.events.emit(&MediaEvent::Allowed);
                Ok(())
            }
            Err(code) => {
                self.cancel_prompt_timer();
                *self.state.lock() = CaptureState::Failed;
                tracing::warn!(media_id = %self.id, ?code, "capture request failed");
                Err(MediaError::capture_failed(code))
            }
        }
    }

    async fn resolve_screen_source(
        &self,
        constraints: &CaptureConstraints,
        source: CaptureSource,
    ) -> MediaResult<CaptureConstraints> {
        let Some(chooser) = &self.chooser else {
            return Err(MediaError::unsupported_platform(
                "no screen source integration available",
            ));
        };
        let source_id = chooser.choose_source(source).await?;
        Ok(constraints.with_screen_source_id(source_id))
    }

    fn adopt_stream(self: &Arc<Self>, key: ConstraintKey, stream: Arc<dyn MediaStreamHandle>) {
        if let Some(sink) = &self.sink {
            sink.attach(
                &stream,
                PreviewOptions {
                    muted: true,
                    autoplay: true,
                },
            );
        }

        // Mute flags recorded before capture carry over to the live tracks
        if self.audio_muted.load(Ordering::SeqCst) {
            for track in stream.audio_tracks() {
                track.set_enabled(false);
            }
        }
        if self.video_muted.load(Ordering::SeqCst) {
            for track in stream.video_tracks() {
                track.set_enabled(false);
            }
        }

        let weak = Arc::downgrade(self);
        stream.ended().subscribe_once(move |()| {
            if let Some(instance) = weak.upgrade() {
                tracing::debug!(media_id = %instance.id, "stream ended, stopping instance");
                instance.stop();
            }
        });

        *self.stream.lock() = Some(stream);
        *self.cache_key.lock() = Some(key);
        *self.state.lock() = CaptureState::Capturing;
    }

    fn arm_prompt_timer(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(PERMISSION_PROMPT_DELAY).await;
            if let Some(instance) = weak.upgrade() {
                instance.events.emit(&MediaEvent::RequestingMedia);
            }
        });
        if let Some(previous) = self.prompt_timer.lock().replace(handle) {
            previous.abort();
        }
    }

    fn cancel_prompt_timer(&self) {
        if let Some(handle) = self.prompt_timer.lock().take() {
            handle.abort();
        }
    }

    /// Stop this instance and release its stream reference
    ///
    /// Idempotent. The underlying capture stops only when this was the last
    /// instance holding the cached stream.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock();
            if *state == CaptureState::Stopped {
                return;
            }
            *state = CaptureState::Stopped;
        }
        self.cancel_prompt_timer();

        let key = self.cache_key.lock().take();
        if let Some(key) = key {
            match self.cache.release(&key) {
                ReleaseOutcome::Removed { stream } => stream.stop(),
                ReleaseOutcome::Retained { remaining } => {
                    tracing::debug!(media_id = %self.id, remaining, "stream retained by other instances");
                }
                ReleaseOutcome::Missing => {
                    tracing::warn!(media_id = %self.id, "no cached stream entry to release");
                }
            }
        }

        if let Some(sink) = &self.sink {
            sink.detach();
        }
        *self.stream.lock() = None;
        self.events.emit(&MediaEvent::Stopped);
    }

    /// Mute all audio tracks
    pub fn mute_audio(&self) {
        self.set_muted(MediaKind::Audio, true);
    }

    /// Unmute all audio tracks
    pub fn unmute_audio(&self) {
        self.set_muted(MediaKind::Audio, false);
    }

    /// Mute all video tracks
    pub fn mute_video(&self) {
        self.set_muted(MediaKind::Video, true);
    }

    /// Unmute all video tracks
    pub fn unmute_video(&self) {
        self.set_muted(MediaKind::Video, false);
    }

    /// Whether audio is muted
    pub fn is_audio_muted(&self) -> bool {
        self.audio_muted.load(Ordering::SeqCst)
    }

    /// Whether video is muted
    pub fn is_video_muted(&self) -> bool {
        self.video_muted.load(Ordering::SeqCst)
    }

    fn set_muted(&self, kind: MediaKind, muted: bool) {
        let flag = match kind {
            MediaKind::Audio => &self.audio_muted,
            MediaKind::Video => &self.video_muted,
        };
        if flag.swap(muted, Ordering::SeqCst) == muted {
            // Already in the requested state
            return;
        }

        if let Some(stream) = self.stream.lock().as_ref() {
            let tracks = match kind {
                MediaKind::Audio => stream.audio_tracks(),
                MediaKind::Video => stream.video_tracks(),
            };
            for track in tracks {
                track.set_enabled(!muted);
            }
        }

        self.events.emit(&MediaEvent::Mute { kind, muted });
    }

    /// Record a received session description for pre-capture capability
    /// queries
    pub fn apply_remote_description(&self, sdp: &str) {
        *self.remote_summary.lock() = Some(summarize_sdp(sdp));
    }

    /// Whether this media carries audio
    ///
    /// Answers from live tracks once capturing; before that, from a received
    /// session description or the requested constraints.
    pub fn has_audio(&self) -> bool {
        if let Some(stream) = self.stream.lock().as_ref() {
            return !stream.audio_tracks().is_empty();
        }
        if let Some(summary) = *self.remote_summary.lock() {
            return summary.audio;
        }
        self.constraints
            .as_ref()
            .map(CaptureConstraints::audio_requested)
            .unwrap_or(false)
    }

    /// Whether this media carries video
    pub fn has_video(&self) -> bool {
        if let Some(stream) = self.stream.lock().as_ref() {
            return !stream.video_tracks().is_empty();
        }
        if let Some(summary) = *self.remote_summary.lock() {
            return summary.video;
        }
        self.constraints
            .as_ref()
            .map(CaptureConstraints::video_requested)
            .unwrap_or(false)
    }

    /// Whether this media is a screen share
    pub fn has_screen_share(&self) -> bool {
        if let Some(stream) = self.stream.lock().as_ref() {
            return !stream.video_tracks().is_empty()
                && self.screen_requested.load(Ordering::SeqCst);
        }
        self.constraints
            .as_ref()
            .map(CaptureConstraints::screen_requested)
            .unwrap_or(false)
    }

    /// Whether this media carries anything at all
    pub fn has_media(&self) -> bool {
        self.has_audio() || self.has_video()
    }
}

impl Drop for LocalMedia {
    fn drop(&mut self) {
        if let Some(handle) = self.prompt_timer.lock().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for LocalMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalMedia")
            .field("id", &self.id)
            .field("temporary", &self.temporary)
            .field("state", &self.state())
            .finish()
    }
}
