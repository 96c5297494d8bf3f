//! Remote endpoints
//!
//! An [`Endpoint`] is the remote party role of the session directory: it
//! originates calls and direct connections scoped to one remote identity,
//! wires each to the signaling transport through a [`SignalBridge`], and
//! holds at most one direct-connection back-reference (the reference, not
//! the connection, is what the close handler releases).

use std::sync::Arc;

use parking_lot::Mutex;

use peerlink_media_core::CaptureConstraints;

use crate::config::{CallConfig, IceServer};
use crate::error::{ClientError, ClientResult};
use crate::identity::{Identity, Presentable};
use crate::session::{
    CallSession, CallSetup, DataChannelHooks, DirectConnectionSession, DirectConnectionSetup,
    SessionFactory,
};
use crate::signaling::{
    NoopReportSink, ReportSink, SignalBridge, SignalMessage, SignalTarget, SignalingTransport,
};
use crate::user::User;

/// Parameters for originating or accepting a call
#[derive(Debug)]
pub struct CallParams {
    /// Call-specific constraints; merged over the endpoint defaults
    pub constraints: Option<CaptureConstraints>,
    /// Call-specific ICE servers; merged over the endpoint defaults
    pub servers: Option<Vec<IceServer>>,
    /// Restrict signaling to one remote session
    pub connection_id: Option<String>,
    /// Whether the local side originates; defaults to true
    pub initiator: bool,
}

impl Default for CallParams {
    fn default() -> Self {
        Self {
            constraints: None,
            servers: None,
            connection_id: None,
            initiator: true,
        }
    }
}

/// Parameters for obtaining a direct connection
#[derive(Debug)]
pub struct DirectConnectionParams {
    /// Connection-specific ICE servers; merged over the endpoint defaults
    pub servers: Option<Vec<IceServer>>,
    /// Restrict signaling to one remote session
    pub connection_id: Option<String>,
    /// Whether the local side originates; defaults to true
    pub initiator: bool,
    /// Data-channel hooks, applied when the local side originates
    pub hooks: DataChannelHooks,
}

impl Default for DirectConnectionParams {
    fn default() -> Self {
        Self {
            servers: None,
            connection_id: None,
            initiator: true,
            hooks: DataChannelHooks::new(),
        }
    }
}

/// A remote party: identity plus call/direct-connection origination
pub struct Endpoint {
    identity: Identity,
    user: Arc<User>,
    factory: Arc<dyn SessionFactory>,
    transport: Arc<dyn SignalingTransport>,
    reports: Arc<dyn ReportSink>,
    call_defaults: CallConfig,
    direct_connection: Mutex<Option<Arc<dyn DirectConnectionSession>>>,
}

impl Endpoint {
    /// Create an endpoint bound to the local user and session factory
    pub fn new(
        id: Option<String>,
        user: Arc<User>,
        factory: Arc<dyn SessionFactory>,
        transport: Arc<dyn SignalingTransport>,
    ) -> Arc<Self> {
        Arc::new(Self {
            identity: Identity::new(id),
            user,
            factory,
            transport,
            reports: Arc::new(NoopReportSink),
            call_defaults: CallConfig::new(),
            direct_connection: Mutex::new(None),
        })
    }

    /// Create with explicit defaults and report sink
    pub fn with_config(
        id: Option<String>,
        user: Arc<User>,
        factory: Arc<dyn SessionFactory>,
        transport: Arc<dyn SignalingTransport>,
        call_defaults: CallConfig,
        reports: Arc<dyn ReportSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            identity: Identity::new(id),
            user,
            factory,
            transport,
            reports,
            call_defaults,
            direct_connection: Mutex::new(None),
        })
    }

    /// The endpoint's identity
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The local user this endpoint reports to
    pub fn user(&self) -> &Arc<User> {
        &self.user
    }

    /// Default call settings for this endpoint
    pub fn call_defaults(&self) -> &CallConfig {
        &self.call_defaults
    }

    /// Originate (or accept) a call scoped to this endpoint
    ///
    /// Fails fast with [`ClientError::MissingEndpointId`] when the endpoint
    /// has no id. The constructed call is registered with the local user
    /// and deregistered automatically when it reaches a terminal state.
    pub fn call(self: &Arc<Self>, params: CallParams) -> ClientResult<Arc<dyn CallSession>> {
        let Some(recipient) = self.identity.id().map(str::to_string) else {
            tracing::warn!("cannot place a call to an endpoint without an id");
            return Err(ClientError::MissingEndpointId);
        };

        let config = self
            .call_defaults
            .merged_with(params.constraints, params.servers);

        let bridge = Arc::new(SignalBridge::new(
            self.transport.clone(),
            SignalTarget::Call,
            recipient.clone(),
            params.connection_id.clone(),
            self.reports.clone(),
        ));

        let call = self.factory.create_call(
            CallSetup {
                recipient: recipient.clone(),
                connection_id: params.connection_id,
                constraints: config.constraints,
                servers: config.servers,
                initiator: params.initiator,
            },
            bridge,
        )?;

        if params.initiator {
            call.start()?;
        }

        self.user.add_call(self, call.clone(), params.initiator);

        // Deregister exactly once when the call ends
        let user = Arc::downgrade(&self.user);
        let call_id = call.id().to_string();
        call.terminations().subscribe_once(move |_event| {
            if let Some(user) = user.upgrade() {
                user.remove_call_by_id(&call_id);
            }
        });

        tracing::info!(%recipient, call_id = call.id(), initiator = params.initiator, "call constructed");
        Ok(call)
    }

    /// Get this endpoint's direct connection, constructing it on first use
    ///
    /// Idempotent: while a connection is cached, further calls return the
    /// identical reference. An inbound connection with no registered
    /// direct-connection subscriber is auto-rejected so it cannot sit
    /// half-open.
    pub fn get_direct_connection(
        self: &Arc<Self>,
        params: DirectConnectionParams,
    ) -> ClientResult<Arc<dyn DirectConnectionSession>> {
        if let Some(existing) = self.direct_connection.lock().clone() {
            return Ok(existing);
        }

        let Some(recipient) = self.identity.id().map(str::to_string) else {
            tracing::warn!("cannot open a direct connection to an endpoint without an id");
            return Err(ClientError::MissingEndpointId);
        };

        let config = self.call_defaults.merged_with(None, params.servers);

        let bridge = Arc::new(SignalBridge::new(
            self.transport.clone(),
            SignalTarget::DirectConnection,
            recipient.clone(),
            params.connection_id.clone(),
            self.reports.clone(),
        ));

        let connection = self.factory.create_direct_connection(
            DirectConnectionSetup {
                recipient: recipient.clone(),
                connection_id: params.connection_id,
                servers: config.servers,
                initiator: params.initiator,
            },
            bridge,
        )?;

        *self.direct_connection.lock() = Some(connection.clone());

        // Closing releases the back-reference, not the connection
        let endpoint = Arc::downgrade(self);
        connection.closures().subscribe_once(move |_event| {
            if let Some(endpoint) = endpoint.upgrade() {
                *endpoint.direct_connection.lock() = None;
            }
        });

        if params.initiator {
            connection.open(params.hooks)?;
        } else if self.user.direct_connection_events().subscriber_count() == 0 {
            tracing::warn!(%recipient, "no direct-connection listeners registered, rejecting inbound connection");
            connection.reject();
            // The engine may not emit a close for a rejected connection
            *self.direct_connection.lock() = None;
        } else {
            self.user.announce_direct_connection(self, connection.clone());
        }

        tracing::info!(%recipient, connection_id = connection.id(), "direct connection ready");
        Ok(connection)
    }

    /// The cached direct connection, if one is active
    pub fn direct_connection(&self) -> Option<Arc<dyn DirectConnectionSession>> {
        self.direct_connection.lock().clone()
    }

    /// Relay an application payload to this endpoint
    pub async fn send_signal(
        &self,
        payload: serde_json::Value,
        connection_id: Option<String>,
    ) -> ClientResult<()> {
        let Some(recipient) = self.identity.id().map(str::to_string) else {
            return Err(ClientError::MissingEndpointId);
        };
        self.transport
            .send_signal(SignalMessage {
                recipient,
                connection_id,
                payload,
            })
            .await
    }
}

impl Presentable for Endpoint {
    fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.identity.id())
            .field("has_direct_connection", &self.direct_connection.lock().is_some())
            .finish()
    }
}
