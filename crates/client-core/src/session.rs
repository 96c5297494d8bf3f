//! Session engine seams
//!
//! Call and direct-connection state machines (offer/answer, ICE,
//! data-channel framing) live in an external engine. This layer consumes
//! them through the traits here: it constructs sessions through a
//! [`SessionFactory`], observes their coarse state, and reacts only to the
//! terminal transition.

use std::sync::Arc;

use peerlink_infra_common::events::Notifier;
use peerlink_media_core::CaptureConstraints;

use crate::config::IceServer;
use crate::error::ClientResult;
use crate::signaling::SignalBridge;

/// Coarse session state as observed by this layer
///
/// Ordered; states at or past [`SessionState::Ended`] are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Constructed, nothing sent yet
    Created,
    /// Offer/answer/candidate exchange in progress
    Negotiating,
    /// Media or data flowing
    Connected,
    /// Ended normally
    Ended,
    /// Ended by failure
    Failed,
}

impl SessionState {
    /// Whether the session is over
    pub fn is_terminal(&self) -> bool {
        *self >= SessionState::Ended
    }
}

/// Payload of a session's terminal notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTerminated {
    /// The session that ended
    pub session_id: String,
    /// Engine-supplied reason, when available
    pub reason: Option<String>,
}

/// A negotiated media call (external state machine)
pub trait CallSession: Send + Sync {
    /// Session identifier
    fn id(&self) -> &str;
    /// The remote identity this call is scoped to
    fn peer_id(&self) -> &str;
    /// Current coarse state
    fn state(&self) -> SessionState;
    /// Begin the offer (initiator) or answer (responder) sequence
    fn start(&self) -> ClientResult<()>;
    /// Decline and terminate
    fn reject(&self);
    /// Fires once when the call reaches a terminal state
    fn terminations(&self) -> &Notifier<SessionTerminated>;
}

/// Open/close/message hooks for a direct connection's data channel
#[derive(Default)]
pub struct DataChannelHooks {
    /// Invoked when the channel opens
    pub on_open: Option<Box<dyn Fn() + Send + Sync>>,
    /// Invoked when the channel closes
    pub on_close: Option<Box<dyn Fn() + Send + Sync>>,
    /// Invoked per inbound message
    pub on_message: Option<Box<dyn Fn(&[u8]) + Send + Sync>>,
}

impl DataChannelHooks {
    /// Hooks that ignore everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the open hook
    pub fn on_open(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Box::new(hook));
        self
    }

    /// Set the close hook
    pub fn on_close(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Set the message hook
    pub fn on_message(mut self, hook: impl Fn(&[u8]) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for DataChannelHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataChannelHooks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_message", &self.on_message.is_some())
            .finish()
    }
}

/// A negotiated data-only session (external state machine)
pub trait DirectConnectionSession: Send + Sync {
    /// Session identifier
    fn id(&self) -> &str;
    /// The remote identity this connection is scoped to
    fn peer_id(&self) -> &str;
    /// Current coarse state
    fn state(&self) -> SessionState;
    /// Start or accept with the supplied data-channel hooks
    fn open(&self, hooks: DataChannelHooks) -> ClientResult<()>;
    /// Decline and terminate
    fn reject(&self);
    /// Fires once when the connection closes
    fn closures(&self) -> &Notifier<SessionTerminated>;
}

/// Construction parameters for a call
#[derive(Debug, Clone)]
pub struct CallSetup {
    /// Remote identity id
    pub recipient: String,
    /// Restrict to one remote session
    pub connection_id: Option<String>,
    /// Effective capture constraints after merging
    pub constraints: Option<CaptureConstraints>,
    /// Effective ICE servers after merging
    pub servers: Vec<IceServer>,
    /// Whether the local side originates
    pub initiator: bool,
}

/// Construction parameters for a direct connection
#[derive(Debug, Clone)]
pub struct DirectConnectionSetup {
    /// Remote identity id
    pub recipient: String,
    /// Restrict to one remote session
    pub connection_id: Option<String>,
    /// Effective ICE servers after merging
    pub servers: Vec<IceServer>,
    /// Whether the local side originates
    pub initiator: bool,
}

/// Builds sessions, wiring in the outbound signal bridge
pub trait SessionFactory: Send + Sync {
    /// Construct a call
    fn create_call(
        &self,
        setup: CallSetup,
        signals: Arc<SignalBridge>,
    ) -> ClientResult<Arc<dyn CallSession>>;

    /// Construct a direct connection
    fn create_direct_connection(
        &self,
        setup: DirectConnectionSetup,
        signals: Arc<SignalBridge>,
    ) -> ClientResult<Arc<dyn DirectConnectionSession>>;
}
