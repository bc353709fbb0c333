use meadow_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::{
    entity::entity_id::EntityId,
    resource::resource_id::{ResourceId, ResourceKind},
    types::{PeerId, StateTick},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StateType {
    LobbyState,
    WorldState,
    RoomState,
}

impl StateType {
    pub fn of(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Lobby => StateType::LobbyState,
            ResourceKind::World => StateType::WorldState,
            ResourceKind::Room => StateType::RoomState,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EntityMembership {
    pub entity: EntityId,
    pub owner: PeerId,
}

/// Immutable snapshot of a resource, produced by its owner and read by
/// every other subscriber
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResourceState {
    resource: ResourceId,
    tick: StateTick,
    owner: Option<PeerId>,
    sub_resources: Vec<String>,
    entities: Vec<EntityMembership>,
}

impl ResourceState {
    pub fn new(
        resource: ResourceId,
        tick: StateTick,
        owner: Option<PeerId>,
        sub_resources: Vec<String>,
        entities: Vec<EntityMembership>,
    ) -> Self {
        Self {
            resource,
            tick,
            owner,
            sub_resources,
            entities,
        }
    }

    pub fn state_type(&self) -> StateType {
        StateType::of(self.resource.kind())
    }

    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    pub fn tick(&self) -> StateTick {
        self.tick
    }

    pub fn owner(&self) -> Option<PeerId> {
        self.owner
    }

    pub fn sub_resources(&self) -> &[String] {
        &self.sub_resources
    }

    pub fn entities(&self) -> &[EntityMembership] {
        &self.entities
    }
}

impl Serde for ResourceState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.resource.ser(writer);
        UnsignedVariableInteger::<15>::new(self.tick).ser(writer);
        self.owner.ser(writer);
        self.sub_resources.ser(writer);
        UnsignedVariableInteger::<7>::new(self.entities.len() as u64).ser(writer);
        for membership in &self.entities {
            membership.entity.ser(writer);
            membership.owner.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let resource = ResourceId::de(reader)?;
        let tick = UnsignedVariableInteger::<15>::de(reader)?.get();
        let owner = Option::<PeerId>::de(reader)?;
        let sub_resources = Vec::<String>::de(reader)?;
        let count = UnsignedVariableInteger::<7>::de(reader)?.get();
        if count > (reader.bytes_remaining() as u64 + 1) * 8 {
            return Err(SerdeErr::ValueOutOfRange {
                type_name: "ResourceState.entities",
                value: count,
            });
        }
        let mut entities = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let entity = EntityId::de(reader)?;
            let owner = PeerId::de(reader)?;
            entities.push(EntityMembership { entity, owner });
        }
        Ok(Self {
            resource,
            tick,
            owner,
            sub_resources,
            entities,
        })
    }
}
