//! Signaling transport seam and per-session signal wiring
//!
//! The transport delivers signaling messages to a remote party; its
//! connection lifecycle is outside this layer. Every call or direct
//! connection gets a [`SignalBridge`] scoped to one recipient (and
//! optionally one of their connections): the session engine invokes the
//! bridge's five signal operations and the bridge forwards them to the
//! transport, stamped with the [`SignalTarget`] discriminator so the same
//! wiring serves both session kinds.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::presence::Presence;

/// Which session kind a signal belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalTarget {
    /// A media call
    #[serde(rename = "call")]
    Call,
    /// A data-only direct connection
    #[serde(rename = "directConnection")]
    DirectConnection,
}

impl std::fmt::Display for SignalTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalTarget::Call => write!(f, "call"),
            SignalTarget::DirectConnection => write!(f, "directConnection"),
        }
    }
}

/// Whether a session description is an offer or an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    /// Local description sent first
    Offer,
    /// Local description sent in response
    Answer,
}

/// A session description on its way out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdpMessage {
    /// Offer or answer
    #[serde(rename = "type")]
    pub kind: SdpKind,
    /// Session kind discriminator
    pub target: SignalTarget,
    /// Remote identity id
    pub recipient: String,
    /// Restrict delivery to one of the recipient's sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    /// The session description
    pub sdp: String,
}

/// One negotiated network candidate on its way out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateMessage {
    /// Session kind discriminator
    pub target: SignalTarget,
    /// Remote identity id
    pub recipient: String,
    /// Restrict delivery to one of the recipient's sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    /// The candidate line
    pub candidate: String,
}

/// A termination signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ByeMessage {
    /// Session kind discriminator
    pub target: SignalTarget,
    /// Remote identity id
    pub recipient: String,
    /// Restrict delivery to one of the recipient's sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
}

/// A transport-level connect notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedMessage {
    /// Session kind discriminator
    pub target: SignalTarget,
    /// Remote identity id
    pub recipient: String,
    /// Restrict delivery to one of the recipient's sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
}

/// An application payload to relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalMessage {
    /// Remote identity id
    pub recipient: String,
    /// Restrict delivery to one of the recipient's sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    /// Arbitrary payload
    pub payload: serde_json::Value,
}

/// The consumed signaling transport
///
/// All operations complete asynchronously; connection lifecycle and wire
/// framing are the transport's business.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    /// Send a session description
    async fn send_sdp(&self, message: SdpMessage) -> ClientResult<()>;
    /// Send a network candidate
    async fn send_candidate(&self, message: CandidateMessage) -> ClientResult<()>;
    /// Send a termination signal
    async fn send_bye(&self, message: ByeMessage) -> ClientResult<()>;
    /// Send a transport-level connect notification
    async fn send_connected(&self, message: ConnectedMessage) -> ClientResult<()>;
    /// Broadcast the local identity's presence
    async fn send_presence(&self, presence: &Presence) -> ClientResult<()>;
    /// Relay an application payload
    async fn send_signal(&self, message: SignalMessage) -> ClientResult<()>;
}

/// A diagnostic report produced by a session engine
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    /// Which session kind produced the report
    pub target: SignalTarget,
    /// The session it concerns
    pub session_id: String,
    /// When the report was captured
    pub created_at: DateTime<Utc>,
    /// Engine-defined report body
    pub data: serde_json::Value,
}

/// Destination for diagnostic reports
pub trait ReportSink: Send + Sync {
    /// Accept one report; delivery is the sink's business
    fn deliver(&self, report: DiagnosticReport);
}

/// Discards every report; the default sink
pub struct NoopReportSink;

impl ReportSink for NoopReportSink {
    fn deliver(&self, _report: DiagnosticReport) {}
}

/// Outbound signal wiring for one call or direct connection
///
/// Scoped to one recipient and session kind at construction; the session
/// engine holds the bridge and drives it as its state machine progresses.
/// Signals for one session fire in invocation order; nothing is ordered
/// across sessions.
pub struct SignalBridge {
    transport: Arc<dyn SignalingTransport>,
    target: SignalTarget,
    recipient: String,
    connection_id: Option<String>,
    reports: Arc<dyn ReportSink>,
}

impl SignalBridge {
    /// Wire a bridge for one session
    pub fn new(
        transport: Arc<dyn SignalingTransport>,
        target: SignalTarget,
        recipient: impl Into<String>,
        connection_id: Option<String>,
        reports: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            transport,
            target,
            recipient: recipient.into(),
            connection_id,
            reports,
        }
    }

    /// The session kind this bridge serves
    pub fn target(&self) -> SignalTarget {
        self.target
    }

    /// The remote identity this bridge addresses
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// Send the local session description as an offer
    pub async fn signal_offer(&self, sdp: impl Into<String> + Send) -> ClientResult<()> {
        self.transport
            .send_sdp(SdpMessage {
                kind: SdpKind::Offer,
                target: self.target,
                recipient: self.recipient.clone(),
                connection_id: self.connection_id.clone(),
                sdp: sdp.into(),
            })
            .await
    }

    /// Send the local session description as an answer
    pub async fn signal_answer(&self, sdp: impl Into<String> + Send) -> ClientResult<()> {
        self.transport
            .send_sdp(SdpMessage {
                kind: SdpKind::Answer,
                target: self.target,
                recipient: self.recipient.clone(),
                connection_id: self.connection_id.clone(),
                sdp: sdp.into(),
            })
            .await
    }

    /// Forward one negotiated network candidate
    pub async fn signal_candidate(&self, candidate: impl Into<String> + Send) -> ClientResult<()> {
        self.transport
            .send_candidate(CandidateMessage {
                target: self.target,
                recipient: self.recipient.clone(),
                connection_id: self.connection_id.clone(),
                candidate: candidate.into(),
            })
            .await
    }

    /// Send a termination signal
    pub async fn signal_terminate(&self) -> ClientResult<()> {
        self.transport
            .send_bye(ByeMessage {
                target: self.target,
                recipient: self.recipient.clone(),
                connection_id: self.connection_id.clone(),
            })
            .await
    }

    /// Notify transport-level connect
    pub async fn signal_connected(&self) -> ClientResult<()> {
        self.transport
            .send_connected(ConnectedMessage {
                target: self.target,
                recipient: self.recipient.clone(),
                connection_id: self.connection_id.clone(),
            })
            .await
    }

    /// Stamp a diagnostic report with this session's kind and hand it to
    /// the report sink
    pub fn signal_report(&self, session_id: impl Into<String>, data: serde_json::Value) {
        self.reports.deliver(DiagnosticReport {
            target: self.target,
            session_id: session_id.into(),
            created_at: Utc::now(),
            data,
        });
    }
}

impl std::fmt::Debug for SignalBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBridge")
            .field("target", &self.target)
            .field("recipient", &self.recipient)
            .field("connection_id", &self.connection_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_serializes_with_wire_names() {
        assert_eq!(
            serde_json::to_string(&SignalTarget::Call).unwrap(),
            "\"call\""
        );
        assert_eq!(
            serde_json::to_string(&SignalTarget::DirectConnection).unwrap(),
            "\"directConnection\""
        );
    }

    #[test]
    fn sdp_message_omits_absent_connection_id() {
        let message = SdpMessage {
            kind: SdpKind::Offer,
            target: SignalTarget::Call,
            recipient: "bob@example.com".to_string(),
            connection_id: None,
            sdp: "v=0".to_string(),
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(!json.contains("connection_id"));
        assert!(json.contains("\"type\":\"offer\""));
    }
}
