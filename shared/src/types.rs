use std::fmt;

use meadow_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

/// Monotonic tick used to stamp resource states and liveness
pub type StateTick = u64;
/// Wrapping version of a feed baseline
pub type FeedVersion = u16;
/// Discriminator for the external serializer of an entity
pub type EntityTypeId = u16;

// PeerId
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

impl Serde for PeerId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedVariableInteger::<7>::new(self.0).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self(UnsignedVariableInteger::<7>::de(reader)?.get()))
    }
}
