use meadow_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{entity::entity_id::EntityId, resource::resource_id::ResourceId};

/// Declared type of a procedure parameter
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArgKind {
    Bool,
    I16,
    I32,
    U32,
    F32,
    Str,
    Resource,
    Entity,
}

impl ArgKind {
    pub fn name(&self) -> &'static str {
        match self {
            ArgKind::Bool => "bool",
            ArgKind::I16 => "i16",
            ArgKind::I32 => "i32",
            ArgKind::U32 => "u32",
            ArgKind::F32 => "f32",
            ArgKind::Str => "string",
            ArgKind::Resource => "resource",
            ArgKind::Entity => "entity",
        }
    }
}

/// A positional procedure argument
#[derive(Clone, PartialEq, Debug)]
pub enum RpcArg {
    Bool(bool),
    I16(i16),
    I32(i32),
    U32(u32),
    F32(f32),
    Str(String),
    Resource(ResourceId),
    Entity(EntityId),
}

impl RpcArg {
    pub fn kind(&self) -> ArgKind {
        match self {
            RpcArg::Bool(_) => ArgKind::Bool,
            RpcArg::I16(_) => ArgKind::I16,
            RpcArg::I32(_) => ArgKind::I32,
            RpcArg::U32(_) => ArgKind::U32,
            RpcArg::F32(_) => ArgKind::F32,
            RpcArg::Str(_) => ArgKind::Str,
            RpcArg::Resource(_) => ArgKind::Resource,
            RpcArg::Entity(_) => ArgKind::Entity,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RpcArg::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            RpcArg::I16(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            RpcArg::I32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            RpcArg::U32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            RpcArg::F32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RpcArg::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceId> {
        match self {
            RpcArg::Resource(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            RpcArg::Entity(value) => Some(*value),
            _ => None,
        }
    }
}

impl Serde for RpcArg {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let tag: u8 = match self {
            RpcArg::Bool(_) => 0,
            RpcArg::I16(_) => 1,
            RpcArg::I32(_) => 2,
            RpcArg::U32(_) => 3,
            RpcArg::F32(_) => 4,
            RpcArg::Str(_) => 5,
            RpcArg::Resource(_) => 6,
            RpcArg::Entity(_) => 7,
        };
        tag.ser(writer);
        match self {
            RpcArg::Bool(value) => value.ser(writer),
            RpcArg::I16(value) => value.ser(writer),
            RpcArg::I32(value) => value.ser(writer),
            RpcArg::U32(value) => value.ser(writer),
            RpcArg::F32(value) => value.ser(writer),
            RpcArg::Str(value) => value.ser(writer),
            RpcArg::Resource(value) => value.ser(writer),
            RpcArg::Entity(value) => value.ser(writer),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(RpcArg::Bool(bool::de(reader)?)),
            1 => Ok(RpcArg::I16(i16::de(reader)?)),
            2 => Ok(RpcArg::I32(i32::de(reader)?)),
            3 => Ok(RpcArg::U32(u32::de(reader)?)),
            4 => Ok(RpcArg::F32(f32::de(reader)?)),
            5 => Ok(RpcArg::Str(String::de(reader)?)),
            6 => Ok(RpcArg::Resource(ResourceId::de(reader)?)),
            7 => Ok(RpcArg::Entity(EntityId::de(reader)?)),
            tag => Err(SerdeErr::InvalidTag {
                type_name: "RpcArg",
                tag,
            }),
        }
    }
}

impl From<bool> for RpcArg {
    fn from(value: bool) -> Self {
        RpcArg::Bool(value)
    }
}

impl From<i16> for RpcArg {
    fn from(value: i16) -> Self {
        RpcArg::I16(value)
    }
}

impl From<i32> for RpcArg {
    fn from(value: i32) -> Self {
        RpcArg::I32(value)
    }
}

impl From<u32> for RpcArg {
    fn from(value: u32) -> Self {
        RpcArg::U32(value)
    }
}

impl From<f32> for RpcArg {
    fn from(value: f32) -> Self {
        RpcArg::F32(value)
    }
}

impl From<&str> for RpcArg {
    fn from(value: &str) -> Self {
        RpcArg::Str(value.to_string())
    }
}

impl From<String> for RpcArg {
    fn from(value: String) -> Self {
        RpcArg::Str(value)
    }
}

impl From<ResourceId> for RpcArg {
    fn from(value: ResourceId) -> Self {
        RpcArg::Resource(value)
    }
}

impl From<EntityId> for RpcArg {
    fn from(value: EntityId) -> Self {
        RpcArg::Entity(value)
    }
}
