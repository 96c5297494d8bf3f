//! Session directory
//!
//! One [`SessionDirectory`] per signaling connection: the local [`User`]
//! plus a lazily-populated map of remote [`Endpoint`]s, all sharing the
//! same transport, session factory, and call defaults.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::CallConfig;
use crate::endpoint::Endpoint;
use crate::session::SessionFactory;
use crate::signaling::{NoopReportSink, ReportSink, SignalingTransport};
use crate::user::User;

/// Construction parameters for a [`SessionDirectory`]
pub struct DirectoryConfig {
    /// The local user's endpoint id
    pub user_id: String,
    /// Defaults applied to every call placed through the directory
    pub call_defaults: CallConfig,
    /// Where diagnostic reports go
    pub reports: Arc<dyn ReportSink>,
}

impl DirectoryConfig {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            call_defaults: CallConfig::new(),
            reports: Arc::new(NoopReportSink),
        }
    }

    pub fn with_call_defaults(mut self, defaults: CallConfig) -> Self {
        self.call_defaults = defaults;
        self
    }

    pub fn with_report_sink(mut self, reports: Arc<dyn ReportSink>) -> Self {
        self.reports = reports;
        self
    }
}

/// The per-connection registry of the local user and remote endpoints
pub struct SessionDirectory {
    user: Arc<User>,
    factory: Arc<dyn SessionFactory>,
    transport: Arc<dyn SignalingTransport>,
    reports: Arc<dyn ReportSink>,
    call_defaults: CallConfig,
    endpoints: DashMap<String, Arc<Endpoint>>,
}

impl SessionDirectory {
    /// Create a directory over a signaling transport and session factory
    pub fn new(
        config: DirectoryConfig,
        factory: Arc<dyn SessionFactory>,
        transport: Arc<dyn SignalingTransport>,
    ) -> Self {
        let user = User::new(config.user_id, transport.clone());
        Self {
            user,
            factory,
            transport,
            reports: config.reports,
            call_defaults: config.call_defaults,
            endpoints: DashMap::new(),
        }
    }

    /// The local user
    pub fn user(&self) -> &Arc<User> {
        &self.user
    }

    /// Get or create the endpoint for a remote id
    ///
    /// Idempotent: the same id always yields the same [`Endpoint`]
    /// instance, so presence and session state accumulate in one place.
    pub fn endpoint(&self, id: impl Into<String>) -> Arc<Endpoint> {
        let id = id.into();
        self.endpoints
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::debug!(endpoint_id = %id, "creating endpoint");
                Endpoint::with_config(
                    Some(id.clone()),
                    self.user.clone(),
                    self.factory.clone(),
                    self.transport.clone(),
                    self.call_defaults.clone(),
                    self.reports.clone(),
                )
            })
            .clone()
    }

    /// Look up an endpoint without creating it
    pub fn find(&self, id: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.get(id).map(|entry| entry.clone())
    }

    /// Number of known endpoints
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}

impl std::fmt::Debug for SessionDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDirectory")
            .field("user", &self.user)
            .field("endpoints", &self.endpoints.len())
            .finish()
    }
}
