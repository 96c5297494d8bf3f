//! Notification payloads published by the session layer

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::endpoint::Endpoint;
use crate::presence::Presence;
use crate::session::{CallSession, DirectConnectionSession};

/// An identity's resolved presence was (re)computed
///
/// Emitted on every session presence update, including updates that leave
/// the resolved value unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceChanged {
    /// The resolved presence
    pub presence: Presence,
    /// When the resolution happened
    pub timestamp: DateTime<Utc>,
}

/// A call was registered with the local user
#[derive(Clone)]
pub struct CallAnnounced {
    /// The remote party
    pub endpoint: Arc<Endpoint>,
    /// The call itself
    pub call: Arc<dyn CallSession>,
    /// When the call was registered
    pub timestamp: DateTime<Utc>,
}

impl std::fmt::Debug for CallAnnounced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallAnnounced")
            .field("endpoint", &self.endpoint.identity().id())
            .field("call", &self.call.id())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// An inbound direct connection awaits the application
#[derive(Clone)]
pub struct DirectConnectionAnnounced {
    /// The remote party
    pub endpoint: Arc<Endpoint>,
    /// The connection itself
    pub connection: Arc<dyn DirectConnectionSession>,
    /// When the connection was announced
    pub timestamp: DateTime<Utc>,
}

impl std::fmt::Debug for DirectConnectionAnnounced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectConnectionAnnounced")
            .field("endpoint", &self.endpoint.identity().id())
            .field("connection", &self.connection.id())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}
