//! The local user
//!
//! The [`User`] is the local identity role of the session directory: it owns
//! the ordered, deduplicated collection of active sessions, announces
//! inbound calls and direct connections to the application, and pushes its
//! own presence to the signaling transport.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use peerlink_infra_common::events::Notifier;

use crate::endpoint::{CallParams, Endpoint};
use crate::error::ClientResult;
use crate::events::{CallAnnounced, DirectConnectionAnnounced};
use crate::identity::{Identity, Presentable};
use crate::presence::Presence;
use crate::session::{CallSession, DirectConnectionSession};
use crate::signaling::SignalingTransport;

/// One entry in the user's active-session collection
#[derive(Clone)]
pub enum ActiveSession {
    /// A media call
    Call(Arc<dyn CallSession>),
    /// A data-only direct connection
    DirectConnection(Arc<dyn DirectConnectionSession>),
}

impl ActiveSession {
    /// Session identifier
    pub fn id(&self) -> &str {
        match self {
            ActiveSession::Call(call) => call.id(),
            ActiveSession::DirectConnection(connection) => connection.id(),
        }
    }

    fn is_same_call(&self, other: &Arc<dyn CallSession>) -> bool {
        match self {
            ActiveSession::Call(call) => Arc::ptr_eq(call, other) || call.id() == other.id(),
            ActiveSession::DirectConnection(_) => false,
        }
    }
}

impl std::fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveSession::Call(call) => f.debug_tuple("Call").field(&call.id()).finish(),
            ActiveSession::DirectConnection(connection) => {
                f.debug_tuple("DirectConnection").field(&connection.id()).finish()
            }
        }
    }
}

/// The local identity with its active-session collection
pub struct User {
    identity: Identity,
    transport: Arc<dyn SignalingTransport>,
    active_sessions: Mutex<Vec<ActiveSession>>,
    call_events: Notifier<CallAnnounced>,
    direct_connection_events: Notifier<DirectConnectionAnnounced>,
}

impl User {
    /// Create the local user
    pub fn new(id: impl Into<String>, transport: Arc<dyn SignalingTransport>) -> Arc<Self> {
        Arc::new(Self {
            identity: Identity::new(Some(id.into())),
            transport,
            active_sessions: Mutex::new(Vec::new()),
            call_events: Notifier::new(),
            direct_connection_events: Notifier::new(),
        })
    }

    /// Notifications for registered calls
    pub fn call_events(&self) -> &Notifier<CallAnnounced> {
        &self.call_events
    }

    /// Notifications for inbound direct connections
    pub fn direct_connection_events(&self) -> &Notifier<DirectConnectionAnnounced> {
        &self.direct_connection_events
    }

    /// Snapshot of the active-session collection
    pub fn active_sessions(&self) -> Vec<ActiveSession> {
        self.active_sessions.lock().clone()
    }

    /// Number of active sessions
    pub fn active_session_count(&self) -> usize {
        self.active_sessions.lock().len()
    }

    /// Register a call, announcing it to call subscribers
    ///
    /// Deduplicates by reference or id. Inbound calls (`initiator ==
    /// false`) with zero registered call subscribers are auto-rejected and
    /// never registered, so nothing rings into the void.
    pub fn add_call(
        &self,
        endpoint: &Arc<Endpoint>,
        call: Arc<dyn CallSession>,
        initiator: bool,
    ) {
        {
            let sessions = self.active_sessions.lock();
            if sessions.iter().any(|session| session.is_same_call(&call)) {
                tracing::debug!(call_id = call.id(), "call already registered, skipping");
                return;
            }
        }

        if !initiator && self.call_events.subscriber_count() == 0 {
            tracing::warn!(call_id = call.id(), "no call listeners registered, rejecting inbound call");
            call.reject();
            return;
        }

        self.active_sessions
            .lock()
            .push(ActiveSession::Call(call.clone()));

        self.call_events.emit(&CallAnnounced {
            endpoint: endpoint.clone(),
            call,
            timestamp: Utc::now(),
        });
    }

    /// Deregister a call by id
    ///
    /// Scans in reverse and removes the matched entry **together with every
    /// entry after it** in the collection's current order. This truncating
    /// removal reproduces long-standing behavior that callers have come to
    /// rely on; it is not a targeted single-element delete.
    pub fn remove_call_by_id(&self, call_id: &str) {
        self.remove_last_matching(|session| {
            matches!(session, ActiveSession::Call(call) if call.id() == call_id)
        });
    }

    /// Deregister a call by reference; same truncating removal as
    /// [`User::remove_call_by_id`]
    pub fn remove_call(&self, call: &Arc<dyn CallSession>) {
        self.remove_last_matching(|session| session.is_same_call(call));
    }

    fn remove_last_matching(&self, matches: impl Fn(&ActiveSession) -> bool) {
        let mut sessions = self.active_sessions.lock();
        let matched = sessions
            .iter()
            .enumerate()
            .rev()
            .find(|(_, session)| matches(session))
            .map(|(index, _)| index);
        match matched {
            Some(index) => {
                let dropped = sessions.len() - index;
                sessions.truncate(index);
                tracing::debug!(dropped, "deregistered call entries");
            }
            None => {
                tracing::warn!("no call removed, none matched");
            }
        }
    }

    /// Find the live call for an endpoint, optionally creating one
    ///
    /// Skips calls in a terminal state. With `create`, synthesizes a
    /// non-initiator call through the endpoint; construction failures are
    /// logged and degrade to `None` so one broken call cannot abort the
    /// surrounding event processing.
    pub fn get_call(
        &self,
        endpoint: &Arc<Endpoint>,
        create: bool,
    ) -> Option<Arc<dyn CallSession>> {
        let target = endpoint.identity().id()?.to_string();

        {
            let sessions = self.active_sessions.lock();
            for session in sessions.iter() {
                if let ActiveSession::Call(call) = session {
                    if call.peer_id() == target && !call.state().is_terminal() {
                        return Some(call.clone());
                    }
                }
            }
        }

        if !create {
            return None;
        }

        match endpoint.call(CallParams {
            initiator: false,
            ..Default::default()
        }) {
            Ok(call) => Some(call),
            Err(err) => {
                tracing::warn!(%target, error = %err, "implicit call construction failed");
                None
            }
        }
    }

    pub(crate) fn announce_direct_connection(
        &self,
        endpoint: &Arc<Endpoint>,
        connection: Arc<dyn DirectConnectionSession>,
    ) {
        self.direct_connection_events.emit(&DirectConnectionAnnounced {
            endpoint: endpoint.clone(),
            connection,
            timestamp: Utc::now(),
        });
    }
}

#[async_trait]
impl Presentable for User {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Record the presence locally and broadcast it through the transport
    async fn set_presence(&self, presence: Presence) -> ClientResult<()> {
        self.identity.apply_presence(presence.clone());
        self.transport.send_presence(&presence).await
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.identity.id())
            .field("active_sessions", &self.active_session_count())
            .finish()
    }
}
