//! Call configuration
//!
//! Each endpoint carries default call settings; per-call parameters merge
//! over them with call-specific values winning.
//!
//! # Examples
//!
//! ```rust
//! use peerlink_client_core::config::{CallConfig, IceServer};
//! use peerlink_media_core::CaptureConstraints;
//!
//! let defaults = CallConfig::new()
//!     .with_constraints(CaptureConstraints::audio_video(true, true))
//!     .with_servers(vec![IceServer::stun("stun:stun.example.com:3478")]);
//!
//! let merged = defaults.merged_with(Some(CaptureConstraints::audio_video(true, false)), None);
//! assert!(!merged.constraints.unwrap().video_requested());
//! assert_eq!(merged.servers.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use peerlink_media_core::CaptureConstraints;

/// One ICE server entry handed to the session engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    /// Server URLs
    pub urls: Vec<String>,
    /// Credential user name, for TURN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Credential, for TURN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServer {
    /// A credential-less STUN entry
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }

    /// A TURN entry with credentials
    pub fn turn(
        url: impl Into<String>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            urls: vec![url.into()],
            username: Some(username.into()),
            credential: Some(credential.into()),
        }
    }
}

/// Default call settings for an endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallConfig {
    /// Default capture constraints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<CaptureConstraints>,
    /// Default ICE servers
    #[serde(default)]
    pub servers: Vec<IceServer>,
}

impl CallConfig {
    /// Empty defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set default constraints
    pub fn with_constraints(mut self, constraints: CaptureConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    /// Set default ICE servers
    pub fn with_servers(mut self, servers: Vec<IceServer>) -> Self {
        self.servers = servers;
        self
    }

    /// Merge call-specific values over these defaults; specific values win
    pub fn merged_with(
        &self,
        constraints: Option<CaptureConstraints>,
        servers: Option<Vec<IceServer>>,
    ) -> CallConfig {
        CallConfig {
            constraints: constraints.or_else(|| self.constraints.clone()),
            servers: servers.unwrap_or_else(|| self.servers.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn specific_values_win() {
        let defaults = CallConfig::new()
            .with_constraints(CaptureConstraints::audio_video(true, true))
            .with_servers(vec![IceServer::stun("stun:default")]);

        let merged = defaults.merged_with(None, Some(vec![IceServer::stun("stun:override")]));
        assert_eq!(
            merged.constraints,
            Some(CaptureConstraints::audio_video(true, true))
        );
        assert_eq!(merged.servers, vec![IceServer::stun("stun:override")]);
    }

    #[test]
    fn defaults_fill_gaps() {
        let defaults = CallConfig::new().with_servers(vec![IceServer::turn(
            "turn:relay", "user", "secret",
        )]);
        let merged = defaults.merged_with(None, None);
        assert_eq!(merged.servers.len(), 1);
        assert!(merged.constraints.is_none());
    }
}
