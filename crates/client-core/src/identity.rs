//! Addressable identities
//!
//! An [`Identity`] is any addressable party: the local user or a remote
//! endpoint. It holds per-session presence entries keyed by connection id
//! and a derived resolved value. Every session update re-resolves and emits
//! a presence notification **unconditionally**: subscribers see a
//! notification even when the resolved value did not change, which existing
//! consumers depend on.

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use async_trait::async_trait;
use peerlink_infra_common::events::Notifier;

use crate::error::ClientResult;
use crate::events::PresenceChanged;
use crate::presence::{resolve, Presence, SessionEntry};

/// An addressable party with a name and resolved presence
pub struct Identity {
    id: Option<String>,
    name: RwLock<Option<String>>,
    sessions: DashMap<String, SessionEntry>,
    resolved: Mutex<Presence>,
    presence_events: Notifier<PresenceChanged>,
}

impl Identity {
    /// Create an identity; remote endpoints may lack an id until discovered
    pub fn new(id: Option<String>) -> Self {
        Self {
            id,
            name: RwLock::new(None),
            sessions: DashMap::new(),
            resolved: Mutex::new(Presence::Unavailable),
            presence_events: Notifier::new(),
        }
    }

    /// The identity's id, when known
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Display name
    pub fn name(&self) -> Option<String> {
        self.name.read().clone()
    }

    /// Set the display name
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = Some(name.into());
    }

    /// The current resolved presence
    pub fn resolved_presence(&self) -> Presence {
        self.resolved.lock().clone()
    }

    /// Presence notifications
    pub fn presence_events(&self) -> &Notifier<PresenceChanged> {
        &self.presence_events
    }

    /// Number of sessions currently reporting presence
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// The presence one session last reported
    pub fn session_presence(&self, connection_id: &str) -> Option<Presence> {
        self.sessions
            .get(connection_id)
            .map(|entry| entry.presence.clone())
    }

    /// Record a session's presence report and re-resolve
    ///
    /// Later reports for the same connection overwrite; no history is kept.
    /// A notification is emitted on every call, whether or not the resolved
    /// value changed.
    pub fn update_session_presence(&self, connection_id: impl Into<String>, presence: Presence) {
        let connection_id = connection_id.into();
        self.sessions.insert(
            connection_id.clone(),
            SessionEntry {
                connection_id,
                presence,
            },
        );
        self.reresolve_and_emit();
    }

    /// Drop a session (client disconnected) and re-resolve
    pub fn remove_session(&self, connection_id: &str) {
        self.sessions.remove(connection_id);
        self.reresolve_and_emit();
    }

    /// Set the resolved presence directly, bypassing resolution
    pub fn apply_presence(&self, presence: Presence) {
        *self.resolved.lock() = presence.clone();
        self.presence_events.emit(&PresenceChanged {
            presence,
            timestamp: Utc::now(),
        });
    }

    fn reresolve_and_emit(&self) {
        let reports: Vec<(String, Presence)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().presence.clone()))
            .collect();
        let resolved = resolve(reports);
        *self.resolved.lock() = resolved.clone();
        self.presence_events.emit(&PresenceChanged {
            presence: resolved,
            timestamp: Utc::now(),
        });
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("sessions", &self.sessions.len())
            .field("resolved", &self.resolved_presence())
            .finish()
    }
}

/// Presence-carrying capability with an overridable setter
///
/// The default implementation records the presence locally; roles that need
/// extra behavior (the local user pushes its presence to the transport)
/// override [`Presentable::set_presence`].
#[async_trait]
pub trait Presentable: Send + Sync {
    /// The underlying identity
    fn identity(&self) -> &Identity;

    /// Set this party's presence
    async fn set_presence(&self, presence: Presence) -> ClientResult<()> {
        self.identity().apply_presence(presence);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn updates_overwrite_per_connection() {
        let identity = Identity::new(Some("alice@example.com".to_string()));
        identity.update_session_presence("conn-1", Presence::Away);
        identity.update_session_presence("conn-1", Presence::Available);

        assert_eq!(identity.session_count(), 1);
        assert_eq!(
            identity.session_presence("conn-1"),
            Some(Presence::Available)
        );
        assert_eq!(identity.resolved_presence(), Presence::Available);
    }

    #[test]
    fn emits_unconditionally_even_when_unchanged() {
        let identity = Identity::new(Some("alice@example.com".to_string()));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        identity.presence_events().subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        identity.update_session_presence("conn-1", Presence::Available);
        identity.update_session_presence("conn-1", Presence::Available);

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn removing_the_last_session_resolves_unavailable() {
        let identity = Identity::new(None);
        identity.update_session_presence("conn-1", Presence::Chat);
        assert_eq!(identity.resolved_presence(), Presence::Chat);

        identity.remove_session("conn-1");
        assert_eq!(identity.resolved_presence(), Presence::Unavailable);
    }
}
