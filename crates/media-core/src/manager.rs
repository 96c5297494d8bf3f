//! Local media manager
//!
//! Owns the process's stream cache and the engine/chooser collaborators, and
//! mints [`LocalMedia`] instances that share them.

use std::sync::Arc;

use crate::cache::StreamCache;
use crate::constraints::CaptureConstraints;
use crate::engine::{MediaEngine, PreviewSink, ScreenSourceChooser};
use crate::instance::LocalMedia;

/// Factory for [`LocalMedia`] instances sharing one stream cache
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use peerlink_media_core::{CaptureConstraints, LocalMediaManager, MediaEngine};
///
/// fn build(engine: Arc<dyn MediaEngine>) {
///     let manager = LocalMediaManager::new(engine);
///     let live = manager.create(Some(CaptureConstraints::audio_video(true, false)), None);
///     let snapshot = manager.create_temporary(Some(CaptureConstraints::audio_video(true, true)));
///     assert!(!live.is_temporary());
///     assert!(snapshot.is_temporary());
/// }
/// ```
pub struct LocalMediaManager {
    engine: Arc<dyn MediaEngine>,
    cache: Arc<StreamCache>,
    chooser: Option<Arc<dyn ScreenSourceChooser>>,
}

impl LocalMediaManager {
    /// Create a manager with a fresh cache
    pub fn new(engine: Arc<dyn MediaEngine>) -> Self {
        Self {
            engine,
            cache: Arc::new(StreamCache::new()),
            chooser: None,
        }
    }

    /// Use an externally owned cache
    pub fn with_cache(mut self, cache: Arc<StreamCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Wire the platform screen-source integration
    pub fn with_screen_chooser(mut self, chooser: Arc<dyn ScreenSourceChooser>) -> Self {
        self.chooser = Some(chooser);
        self
    }

    /// The shared stream cache
    pub fn cache(&self) -> &Arc<StreamCache> {
        &self.cache
    }

    /// Create a live instance
    pub fn create(
        &self,
        constraints: Option<CaptureConstraints>,
        sink: Option<Arc<dyn PreviewSink>>,
    ) -> Arc<LocalMedia> {
        LocalMedia::new(
            constraints,
            false,
            self.engine.clone(),
            self.cache.clone(),
            self.chooser.clone(),
            sink,
        )
    }

    /// Create a temporary capability snapshot; it can never capture
    pub fn create_temporary(&self, constraints: Option<CaptureConstraints>) -> Arc<LocalMedia> {
        LocalMedia::new(
            constraints,
            true,
            self.engine.clone(),
            self.cache.clone(),
            self.chooser.clone(),
            None,
        )
    }
}
