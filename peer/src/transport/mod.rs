//! Boundary between a session and whatever carries its packets. The
//! session only needs to hand bytes to a peer and to drain what arrived.

use meadow_shared::PeerId;

cfg_if! {
    if #[cfg(feature = "transport_local")] {
        mod local;
        pub use local::{LinkConditionerConfig, LocalHub};
    }
}

pub struct SendError;

pub struct RecvError;

pub trait PacketSender {
    /// Sends a packet to a peer
    fn send(&self, peer: &PeerId, payload: &[u8]) -> Result<(), SendError>;
}

pub trait PacketReceiver {
    /// Receives the next queued packet together with the transport-level
    /// sender, `Ok(None)` when nothing is queued
    fn receive(&mut self) -> Result<Option<(PeerId, &[u8])>, RecvError>;
}
