use meadow_serde::SerdeErr;
use thiserror::Error;

/// Errors raised while framing or unframing packets
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The payload could not be decoded
    #[error("Failed to decode packet: {0}")]
    Decode(#[from] SerdeErr),

    /// A decoded packet claims to come from another peer than the one the
    /// transport delivered it from
    #[error("Packet from {transport} claims sender {claimed}")]
    SenderMismatch { transport: u64, claimed: u64 },

    /// Bytes were left over after the last message
    #[error("Packet has {remaining} trailing bytes")]
    TrailingBytes { remaining: usize },
}
