use std::fmt;

use meadow_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::types::PeerId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum EntityIdType {
    /// Placeholder for "no entity", e.g. a lobby avatar that has not spawned yet
    None,
    /// A physical object living in a room
    Object,
    /// A peer's avatar
    Avatar,
}

/// Identifier of a replicated entity: its type plus the peer that created it
/// and that peer's local index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct EntityId {
    id_type: EntityIdType,
    originator: PeerId,
    index: u32,
}

impl EntityId {
    pub fn new(id_type: EntityIdType, originator: PeerId, index: u32) -> Self {
        if id_type == EntityIdType::None {
            return Self::none();
        }
        Self {
            id_type,
            originator,
            index,
        }
    }

    pub fn none() -> Self {
        Self {
            id_type: EntityIdType::None,
            originator: PeerId::new(0),
            index: 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.id_type == EntityIdType::None
    }

    pub fn id_type(&self) -> EntityIdType {
        self.id_type
    }

    pub fn originator(&self) -> PeerId {
        self.originator
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id_type {
            EntityIdType::None => write!(f, "none"),
            EntityIdType::Object => write!(f, "obj:{}:{}", self.originator.to_u64(), self.index),
            EntityIdType::Avatar => write!(f, "avatar:{}:{}", self.originator.to_u64(), self.index),
        }
    }
}

impl Serde for EntityId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let tag: u8 = match self.id_type {
            EntityIdType::None => 0,
            EntityIdType::Object => 1,
            EntityIdType::Avatar => 2,
        };
        // two bits are enough for the type tag
        writer.write_bit(tag & 1 != 0);
        writer.write_bit(tag & 2 != 0);
        if self.is_none() {
            return;
        }
        self.originator.ser(writer);
        UnsignedVariableInteger::<9>::new(self.index).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mut tag: u8 = 0;
        if reader.read_bit()? {
            tag |= 1;
        }
        if reader.read_bit()? {
            tag |= 2;
        }
        let id_type = match tag {
            0 => return Ok(Self::none()),
            1 => EntityIdType::Object,
            2 => EntityIdType::Avatar,
            _ => {
                return Err(SerdeErr::InvalidTag {
                    type_name: "EntityIdType",
                    tag,
                })
            }
        };
        let originator = PeerId::de(reader)?;
        let index = UnsignedVariableInteger::<9>::de(reader)?.get();
        let index = u32::try_from(index).map_err(|_| SerdeErr::ValueOutOfRange {
            type_name: "u32",
            value: index,
        })?;
        Ok(Self {
            id_type,
            originator,
            index,
        })
    }
}
