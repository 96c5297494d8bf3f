//! Client session layer for real-time peer communication.
//!
//! This crate sits between an application and its signaling/peer-connection
//! plumbing: it tracks the presence of remote endpoints across their
//! simultaneous sessions, originates and registers calls and data-only
//! direct connections, and forwards negotiation artifacts (SDP, ICE
//! candidates, teardown) over a pluggable signaling transport. Local media
//! capture lives in `peerlink-media-core`; the actual peer-connection
//! engine is abstracted behind [`SessionFactory`].

// Error handling
pub mod error;

// Presence model and resolution
pub mod presence;

// Shared identity state (user and endpoints)
pub mod identity;

// Signaling transport, messages, and the per-session signal bridge
pub mod signaling;

// Session traits and factory
pub mod session;

// Call configuration
pub mod config;

// Notification payloads
pub mod events;

// Remote endpoints
pub mod endpoint;

// The local user and its active sessions
pub mod user;

// Per-connection registry
pub mod directory;

// Public exports
pub use config::{CallConfig, IceServer};
pub use directory::{DirectoryConfig, SessionDirectory};
pub use endpoint::{CallParams, DirectConnectionParams, Endpoint};
pub use error::{ClientError, ClientResult};
pub use events::{CallAnnounced, DirectConnectionAnnounced, PresenceChanged};
pub use identity::{Identity, Presentable};
pub use presence::{Presence, SessionEntry};
pub use session::{
    CallSession, CallSetup, DataChannelHooks, DirectConnectionSession, DirectConnectionSetup,
    SessionFactory, SessionState, SessionTerminated,
};
pub use signaling::{
    ByeMessage, CandidateMessage, ConnectedMessage, DiagnosticReport, NoopReportSink, ReportSink,
    SdpKind, SdpMessage, SignalBridge, SignalMessage, SignalTarget, SignalingTransport,
};
pub use user::{ActiveSession, User};

/// Re-export of the types most integrations need
pub mod prelude {
    pub use super::{
        CallConfig, CallParams, CallSession, ClientError, ClientResult, DirectConnectionParams,
        DirectConnectionSession, DirectoryConfig, Endpoint, IceServer, Presence, Presentable,
        SessionDirectory, SessionFactory, SessionState, SignalingTransport, User,
    };
}
