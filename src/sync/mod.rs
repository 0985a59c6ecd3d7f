pub mod hub;
pub mod protocol;
pub mod registry;
pub mod remote;

pub use hub::{BroadcastHub, BroadcastReport, HubStatus};
pub use protocol::{InboundMessage, Session, SessionState, Signal};
pub use registry::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, Eviction, Frame, Registration,
};
pub use remote::HubClient;

// Real-time fan-out: a shared device store, the set of live stream
// subscribers, and the per-connection protocol that ties them together.
