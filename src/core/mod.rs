//! Core functionality: the broadcast hub and its peers

pub mod hub;
pub mod message;
pub mod peer;
pub mod ranking;

// Re-export main components for convenience
pub use hub::{ControlLoop, Hub};
pub use message::{rank, Player, RankingEntry, RankingUpdate};
pub use peer::{Outbox, Peer, PeerHandle, PeerId};
pub use ranking::RankingPublisher;
