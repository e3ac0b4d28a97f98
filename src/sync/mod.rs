//! Host/guest synchronisation for online play.
//!
//! The host owns the only authoritative `GameSession`. A guest forwards its
//! player's actions as requests and renders whatever snapshot arrives last.

pub mod frame;
pub mod message;
pub mod peer;
pub mod transport;

pub use frame::PROTOCOL_VERSION;
pub use message::{Message, Snapshot};
pub use peer::{GUEST_SEAT, HOST_SEAT, PeerEvent, ProtocolFlags, Role, SyncPeer};
pub use transport::{LoopbackTransport, Transport};
