use std::fmt;

use meadow_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::{
    rpc::arg::RpcArg,
    types::{PeerId, StateTick},
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RpcTarget {
    Peer(PeerId),
    Broadcast,
}

impl RpcTarget {
    /// Whether a peer other than the sender should execute the event
    pub fn includes(&self, peer: &PeerId) -> bool {
        match self {
            RpcTarget::Peer(target) => target == peer,
            RpcTarget::Broadcast => true,
        }
    }
}

impl fmt::Display for RpcTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcTarget::Peer(peer) => write!(f, "{}", peer),
            RpcTarget::Broadcast => write!(f, "broadcast"),
        }
    }
}

impl Serde for RpcTarget {
    fn ser(&self, writer: &mut dyn BitWrite) {
        match self {
            RpcTarget::Peer(peer) => {
                writer.write_bit(true);
                peer.ser(writer);
            }
            RpcTarget::Broadcast => writer.write_bit(false),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        if reader.read_bit()? {
            Ok(RpcTarget::Peer(PeerId::de(reader)?))
        } else {
            Ok(RpcTarget::Broadcast)
        }
    }
}

/// Sequence tagging an invoke-once event. A sender numbers each target
/// (one peer, or the broadcast stream) separately.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OnceKey {
    pub sequence: u16,
}

impl Serde for OnceKey {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.sequence.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            sequence: u16::de(reader)?,
        })
    }
}

/// A procedure call on the wire
#[derive(Clone, PartialEq, Debug)]
pub struct RpcEvent {
    pub sender: PeerId,
    pub target: RpcTarget,
    pub procedure: String,
    pub args: Vec<RpcArg>,
    pub sent_at: StateTick,
    pub once: Option<OnceKey>,
}

impl Serde for RpcEvent {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.sender.ser(writer);
        self.target.ser(writer);
        self.procedure.ser(writer);
        self.args.ser(writer);
        UnsignedVariableInteger::<15>::new(self.sent_at).ser(writer);
        self.once.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            sender: PeerId::de(reader)?,
            target: RpcTarget::de(reader)?,
            procedure: String::de(reader)?,
            args: Vec::<RpcArg>::de(reader)?,
            sent_at: UnsignedVariableInteger::<15>::de(reader)?.get(),
            once: Option::<OnceKey>::de(reader)?,
        })
    }
}
