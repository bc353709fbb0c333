use meadow_shared::{MessageError, PeerId, RpcError, SyncError};
use thiserror::Error;

/// Errors surfaced by a running [`Session`](crate::Session)
#[derive(Debug, Error)]
pub enum MeadowPeerError {
    /// The transport refused an outgoing packet
    #[error("Cannot send packet to {peer}. The transport rejected it or the peer is unreachable")]
    Send { peer: PeerId },

    /// The transport failed while receiving
    #[error("Cannot receive packets. The transport is closed")]
    Recv,

    /// Send or receive attempted before `io_load`
    #[error("Session transport is not loaded. Call Session::io_load first")]
    IoNotLoaded,

    /// An incoming packet could not be decoded
    #[error("Malformed packet from {peer}: {source}")]
    Decode {
        peer: PeerId,
        #[source]
        source: MessageError,
    },

    /// A packet or message from a peer that never said hello
    #[error("Dropping {message} from unknown {peer}")]
    UnknownPeer { peer: PeerId, message: &'static str },

    /// A peer stopped answering and was removed from the session
    #[error("Connection to {peer} lost after {silent_ticks} silent ticks")]
    PeerConnectionLost { peer: PeerId, silent_ticks: u64 },

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The mod-list negotiation worker could not be started
    #[error("Cannot start mod negotiation worker: {reason}")]
    WorkerSpawn { reason: String },

    /// The mod-list negotiation worker exited without a result
    #[error("Mod negotiation worker exited without reporting a result")]
    WorkerLost,
}
