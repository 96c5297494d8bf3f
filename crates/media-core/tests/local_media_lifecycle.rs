//! Lifecycle tests for local media instances against a scripted fake engine:
//! cache sharing, refcounts, mute idempotence, capability queries, the
//! permission-prompt timer, and stop-during-capture tolerance.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use peerlink_infra_common::events::Notifier;
use peerlink_media_core::{
    CaptureConstraints, CaptureErrorCode, CaptureFailureKind, CaptureState, LocalMedia,
    LocalMediaManager, MediaEngine, MediaError, MediaEvent, MediaKind, MediaStreamHandle,
    MediaTrack, ScreenSourceChooser,
};

struct FakeTrack {
    id: String,
    enabled: AtomicBool,
}

impl FakeTrack {
    fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            enabled: AtomicBool::new(true),
        })
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }
    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

struct FakeStream {
    id: String,
    audio: Vec<Arc<FakeTrack>>,
    video: Vec<Arc<FakeTrack>>,
    stopped: AtomicBool,
    ended: Notifier<()>,
}

impl FakeStream {
    fn for_constraints(id: &str, constraints: &CaptureConstraints) -> Arc<Self> {
        let audio = if constraints.audio_requested() {
            vec![FakeTrack::new("audio-0")]
        } else {
            vec![]
        };
        let video = if constraints.video_requested() {
            vec![FakeTrack::new("video-0")]
        } else {
            vec![]
        };
        Arc::new(Self {
            id: id.to_string(),
            audio,
            video,
            stopped: AtomicBool::new(false),
            ended: Notifier::new(),
        })
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn end_from_platform(&self) {
        self.ended.emit(&());
    }
}

impl MediaStreamHandle for FakeStream {
    fn id(&self) -> &str {
        &self.id
    }
    fn audio_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.audio.iter().map(|t| t.clone() as Arc<dyn MediaTrack>).collect()
    }
    fn video_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.video.iter().map(|t| t.clone() as Arc<dyn MediaTrack>).collect()
    }
    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
    fn ended(&self) -> &Notifier<()> {
        &self.ended
    }
}

#[derive(Default)]
struct FakeEngine {
    requests: AtomicUsize,
    delay: Option<Duration>,
    failure: Option<CaptureErrorCode>,
    streams: Mutex<Vec<Arc<FakeStream>>>,
}

impl FakeEngine {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    fn failing(code: CaptureErrorCode) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(code),
            ..Default::default()
        })
    }

    fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn last_stream(&self) -> Arc<FakeStream> {
        self.streams.lock().last().cloned().expect("no stream captured")
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn request_capture(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Arc<dyn MediaStreamHandle>, CaptureErrorCode> {
        let n = self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(code) = &self.failure {
            return Err(code.clone());
        }
        let stream = FakeStream::for_constraints(&format!("stream-{n}"), constraints);
        self.streams.lock().push(stream.clone());
        Ok(stream as Arc<dyn MediaStreamHandle>)
    }
}

fn collect_events(media: &Arc<LocalMedia>) -> Arc<Mutex<Vec<MediaEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    media.events().subscribe(move |event| {
        sink.lock().push(event.clone());
    });
    log
}

#[tokio::test]
async fn start_then_stop_empties_the_cache() {
    let engine = FakeEngine::new();
    let manager = LocalMediaManager::new(engine.clone());
    let constraints = CaptureConstraints::audio_video(true, true);
    let key = constraints.cache_key();

    let media = manager.create(Some(constraints), None);
    media.start().await.unwrap();
    assert_eq!(media.state(), CaptureState::Capturing);
    assert_eq!(manager.cache().ref_count(&key), Some(1));

    media.stop();
    assert_eq!(media.state(), CaptureState::Stopped);
    assert!(manager.cache().is_empty());
    assert!(engine.last_stream().is_stopped());
    assert!(media.stream().is_none());
}

#[tokio::test]
async fn equal_constraints_share_one_cache_entry() {
    let engine = FakeEngine::new();
    let manager = LocalMediaManager::new(engine.clone());
    let constraints = CaptureConstraints::audio_video(true, false);
    let key = constraints.cache_key();

    let first = manager.create(Some(constraints.clone()), None);
    let second = manager.create(Some(constraints), None);

    first.start().await.unwrap();
    second.start().await.unwrap();

    // One engine request, one entry, two references
    assert_eq!(engine.request_count(), 1);
    assert_eq!(manager.cache().len(), 1);
    assert_eq!(manager.cache().ref_count(&key), Some(2));

    second.stop();
    assert_eq!(manager.cache().ref_count(&key), Some(1));
    assert!(!engine.last_stream().is_stopped());

    first.stop();
    assert!(manager.cache().is_empty());
    assert!(engine.last_stream().is_stopped());
}

#[tokio::test]
async fn temporary_snapshot_never_starts() {
    let manager = LocalMediaManager::new(FakeEngine::new());
    let snapshot = manager.create_temporary(Some(CaptureConstraints::audio_video(true, true)));

    let err = snapshot.start().await.unwrap_err();
    assert!(matches!(err, MediaError::InvalidOperation { .. }));
    assert_eq!(snapshot.state(), CaptureState::Idle);

    // Capability queries still answer from constraints
    assert!(snapshot.has_audio());
    assert!(snapshot.has_video());
}

#[tokio::test]
async fn missing_constraints_fail_synchronously() {
    let engine = FakeEngine::new();
    let manager = LocalMediaManager::new(engine.clone());
    let media = manager.create(None, None);

    let err = media.start().await.unwrap_err();
    assert!(matches!(err, MediaError::MissingConstraints));
    assert_eq!(engine.request_count(), 0);
}

#[tokio::test]
async fn permission_denial_is_classified() {
    let engine = FakeEngine::failing(CaptureErrorCode::PermissionDenied);
    let manager = LocalMediaManager::new(engine);
    let media = manager.create(Some(CaptureConstraints::audio_video(true, true)), None);

    let err = media.start().await.unwrap_err();
    assert!(matches!(
        err,
        MediaError::CaptureFailed {
            kind: CaptureFailureKind::PermissionDenied
        }
    ));
    assert_eq!(media.state(), CaptureState::Failed);
}

#[tokio::test]
async fn engine_failure_is_unknown() {
    let engine = FakeEngine::failing(CaptureErrorCode::Failed("device busy".into()));
    let manager = LocalMediaManager::new(engine);
    let media = manager.create(Some(CaptureConstraints::audio_video(true, true)), None);

    let err = media.start().await.unwrap_err();
    assert!(matches!(
        err,
        MediaError::CaptureFailed {
            kind: CaptureFailureKind::Unknown
        }
    ));
}

#[tokio::test]
async fn screen_capture_without_integration_is_unsupported() {
    let manager = LocalMediaManager::new(FakeEngine::new());
    let media = manager.create(Some(CaptureConstraints::screen()), None);

    let err = media.start().await.unwrap_err();
    assert!(matches!(err, MediaError::UnsupportedPlatform { .. }));
    assert_eq!(media.state(), CaptureState::Failed);
}

struct FixedChooser;

#[async_trait]
impl ScreenSourceChooser for FixedChooser {
    async fn choose_source(
        &self,
        _source: peerlink_media_core::CaptureSource,
    ) -> Result<String, MediaError> {
        Ok("display:0".to_string())
    }
}

#[tokio::test]
async fn screen_capture_resolves_a_source_first() {
    let engine = FakeEngine::new();
    let manager = LocalMediaManager::new(engine.clone()).with_screen_chooser(Arc::new(FixedChooser));
    let media = manager.create(Some(CaptureConstraints::screen()), None);

    media.start().await.unwrap();
    assert_eq!(media.state(), CaptureState::Capturing);
    assert!(media.has_screen_share());
    assert!(!media.has_audio());
}

#[tokio::test]
async fn mute_is_idempotent() {
    let engine = FakeEngine::new();
    let manager = LocalMediaManager::new(engine.clone());
    let media = manager.create(Some(CaptureConstraints::audio_video(true, true)), None);
    media.start().await.unwrap();

    let events = collect_events(&media);

    media.mute_video();
    media.mute_video();
    let mutes: Vec<_> = events
        .lock()
        .iter()
        .filter(|e| matches!(e, MediaEvent::Mute { .. }))
        .cloned()
        .collect();
    assert_eq!(
        mutes,
        vec![MediaEvent::Mute {
            kind: MediaKind::Video,
            muted: true
        }]
    );

    // Tracks actually disabled
    let stream = engine.last_stream();
    assert!(stream.video_tracks().iter().all(|t| !t.enabled()));
    assert!(stream.audio_tracks().iter().all(|t| t.enabled()));

    // Unmuting an unmuted kind emits nothing
    events.lock().clear();
    media.unmute_audio();
    assert!(events.lock().is_empty());

    media.unmute_video();
    assert_eq!(
        events.lock().as_slice(),
        &[MediaEvent::Mute {
            kind: MediaKind::Video,
            muted: false
        }]
    );
    assert!(stream.video_tracks().iter().all(|t| t.enabled()));
}

#[tokio::test]
async fn mute_before_capture_carries_over_to_the_tracks() {
    let engine = FakeEngine::new();
    let manager = LocalMediaManager::new(engine.clone());
    let media = manager.create(Some(CaptureConstraints::audio_video(true, true)), None);

    media.mute_audio();
    assert!(media.is_audio_muted());

    media.start().await.unwrap();

    let stream = engine.last_stream();
    assert!(stream.audio_tracks().iter().all(|t| !t.enabled()));
    assert!(stream.video_tracks().iter().all(|t| t.enabled()));
}

#[tokio::test]
async fn capabilities_follow_captured_tracks() {
    let manager = LocalMediaManager::new(FakeEngine::new());
    let media = manager.create(Some(CaptureConstraints::audio_video(false, true)), None);

    // Before capture: answered from constraints
    assert!(!media.has_audio());
    assert!(media.has_video());

    media.start().await.unwrap();

    // After capture: answered from the live tracks
    assert!(!media.has_audio());
    assert!(media.has_video());
    assert!(media.has_media());
    assert!(!media.has_screen_share());
}

#[tokio::test]
async fn capabilities_fall_back_to_remote_description() {
    let manager = LocalMediaManager::new(FakeEngine::new());
    let media = manager.create(None, None);

    assert!(!media.has_media());

    media.apply_remote_description("v=0\r\nm=audio 9 RTP/AVP 0\r\n");
    assert!(media.has_audio());
    assert!(!media.has_video());
}

#[tokio::test]
async fn stream_ending_stops_the_instance() {
    let engine = FakeEngine::new();
    let manager = LocalMediaManager::new(engine.clone());
    let media = manager.create(Some(CaptureConstraints::audio_video(true, true)), None);
    media.start().await.unwrap();

    let events = collect_events(&media);
    engine.last_stream().end_from_platform();

    assert_eq!(media.state(), CaptureState::Stopped);
    assert!(manager.cache().is_empty());
    assert!(events.lock().contains(&MediaEvent::Stopped));
}

#[tokio::test]
async fn stop_is_idempotent() {
    let manager = LocalMediaManager::new(FakeEngine::new());
    let media = manager.create(Some(CaptureConstraints::audio_video(true, true)), None);
    media.start().await.unwrap();

    let events = collect_events(&media);
    media.stop();
    media.stop();

    let stops = events
        .lock()
        .iter()
        .filter(|e| matches!(e, MediaEvent::Stopped))
        .count();
    assert_eq!(stops, 1);
}

#[tokio::test(start_paused = true)]
async fn instant_grant_never_shows_the_permission_hint() {
    let manager = LocalMediaManager::new(FakeEngine::new());
    let media = manager.create(Some(CaptureConstraints::audio_video(true, true)), None);
    let events = collect_events(&media);

    media.start().await.unwrap();

    // Run well past the prompt delay; the canceled timer must stay silent
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!events.lock().contains(&MediaEvent::RequestingMedia));
    assert!(events.lock().contains(&MediaEvent::Allowed));
}

#[tokio::test(start_paused = true)]
async fn slow_grant_shows_the_permission_hint() {
    let engine = FakeEngine::with_delay(Duration::from_secs(3));
    let manager = LocalMediaManager::new(engine);
    let media = manager.create(Some(CaptureConstraints::audio_video(true, true)), None);
    let events = collect_events(&media);

    let starter = {
        let media = media.clone();
        tokio::spawn(async move { media.start().await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(events.lock().contains(&MediaEvent::RequestingMedia));

    starter.await.unwrap().unwrap();
    assert_eq!(media.state(), CaptureState::Capturing);
}

#[tokio::test(start_paused = true)]
async fn stop_during_inflight_capture_discards_the_completion() {
    let engine = FakeEngine::with_delay(Duration::from_secs(2));
    let manager = LocalMediaManager::new(engine.clone());
    let media = manager.create(Some(CaptureConstraints::audio_video(true, true)), None);

    let starter = {
        let media = media.clone();
        tokio::spawn(async move { media.start().await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    media.stop();
    assert_eq!(media.state(), CaptureState::Stopped);

    // The engine eventually answers; the completion must be discarded and
    // the stray stream stopped
    starter.await.unwrap().unwrap();
    assert_eq!(media.state(), CaptureState::Stopped);
    assert!(manager.cache().is_empty());
    assert!(engine.last_stream().is_stopped());
    assert!(media.stream().is_none());
}
