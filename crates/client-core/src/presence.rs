//! Presence values and resolution
//!
//! One identity may be signed in from several places at once; each connected
//! session reports its own presence and the layer resolves them to a single
//! value under a fixed priority order. Values outside the known list rank
//! after everything listed. Ties between sessions at the same priority are
//! broken by the smallest connection id, so resolution never depends on map
//! iteration order.
//!
//! # Examples
//!
//! ```rust
//! use peerlink_client_core::presence::{resolve, Presence};
//!
//! let sessions = vec![
//!     ("desk".to_string(), Presence::Away),
//!     ("phone".to_string(), Presence::Available),
//! ];
//! assert_eq!(resolve(sessions), Presence::Available);
//! assert_eq!(resolve(Vec::<(String, Presence)>::new()), Presence::Unavailable);
//! ```

use serde::{Deserialize, Serialize};

/// An identity's availability state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Actively chatting
    Chat,
    /// Online and available
    Available,
    /// Temporarily away
    Away,
    /// Do not disturb
    Dnd,
    /// Extended away
    Xa,
    /// Offline
    Unavailable,
    /// Any unlisted value; ranks after every listed value
    #[serde(untagged)]
    Custom(String),
}

impl Presence {
    /// Position in the fixed priority order; lower wins
    pub fn priority_index(&self) -> usize {
        match self {
            Presence::Chat => 0,
            Presence::Available => 1,
            Presence::Away => 2,
            Presence::Dnd => 3,
            Presence::Xa => 4,
            Presence::Unavailable => 5,
            Presence::Custom(_) => 6,
        }
    }
}

impl std::fmt::Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Presence::Chat => write!(f, "chat"),
            Presence::Available => write!(f, "available"),
            Presence::Away => write!(f, "away"),
            Presence::Dnd => write!(f, "dnd"),
            Presence::Xa => write!(f, "xa"),
            Presence::Unavailable => write!(f, "unavailable"),
            Presence::Custom(value) => write!(f, "{value}"),
        }
    }
}

impl std::str::FromStr for Presence {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "chat" => Presence::Chat,
            "available" => Presence::Available,
            "away" => Presence::Away,
            "dnd" => Presence::Dnd,
            "xa" => Presence::Xa,
            "unavailable" => Presence::Unavailable,
            other => Presence::Custom(other.to_string()),
        })
    }
}

/// One connected session of an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    /// Connection identifier; a session never exists without one
    pub connection_id: String,
    /// The presence this session last reported
    pub presence: Presence,
}

/// Resolve per-session presence reports to one value
///
/// Picks the session with the smallest priority index, breaking ties with
/// the smallest connection id. Empty input resolves to
/// [`Presence::Unavailable`].
pub fn resolve<I>(sessions: I) -> Presence
where
    I: IntoIterator<Item = (String, Presence)>,
{
    sessions
        .into_iter()
        .min_by(|(a_id, a), (b_id, b)| {
            a.priority_index()
                .cmp(&b.priority_index())
                .then_with(|| a_id.cmp(b_id))
        })
        .map(|(_, presence)| presence)
        .unwrap_or(Presence::Unavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sessions(entries: &[(&str, Presence)]) -> Vec<(String, Presence)> {
        entries
            .iter()
            .map(|(id, presence)| (id.to_string(), presence.clone()))
            .collect()
    }

    #[test]
    fn empty_resolves_to_unavailable() {
        assert_eq!(resolve(Vec::new()), Presence::Unavailable);
    }

    #[test]
    fn highest_priority_wins() {
        let result = resolve(sessions(&[
            ("a", Presence::Xa),
            ("b", Presence::Chat),
            ("c", Presence::Dnd),
        ]));
        assert_eq!(result, Presence::Chat);
    }

    #[test]
    fn resolved_priority_never_exceeds_any_input() {
        let inputs = sessions(&[
            ("a", Presence::Away),
            ("b", Presence::Unavailable),
            ("c", Presence::Custom("fishing".to_string())),
        ]);
        let resolved = resolve(inputs.clone());
        for (_, presence) in inputs {
            assert!(resolved.priority_index() <= presence.priority_index());
        }
    }

    #[test]
    fn unknown_values_rank_last() {
        let result = resolve(sessions(&[
            ("a", Presence::Custom("busy-ish".to_string())),
            ("b", Presence::Unavailable),
        ]));
        assert_eq!(result, Presence::Unavailable);
    }

    #[test]
    fn ties_break_on_smallest_connection_id() {
        let result = resolve(sessions(&[
            ("zeta", Presence::Custom("zebra".to_string())),
            ("alpha", Presence::Custom("aardvark".to_string())),
        ]));
        assert_eq!(result, Presence::Custom("aardvark".to_string()));
    }

    #[test]
    fn round_trips_strings() {
        for value in ["chat", "available", "away", "dnd", "xa", "unavailable", "gone"] {
            let presence: Presence = value.parse().unwrap();
            assert_eq!(presence.to_string(), value);
        }
    }
}
