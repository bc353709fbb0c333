use meadow_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    entity::{
        diff_mask::DiffMask,
        entity_id::EntityId,
        entity_state::{EntityState, FieldValue},
    },
    resource::resource_id::ResourceId,
    types::{FeedVersion, PeerId},
};

/// Complete entity state, sent when a feed has no baseline
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FullStateMessage {
    pub resource: ResourceId,
    pub entity: EntityId,
    pub version: FeedVersion,
    pub state: EntityState,
}

/// Changed fields relative to the `baseline` version the receiver is
/// expected to hold
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DeltaMessage {
    pub resource: ResourceId,
    pub entity: EntityId,
    pub baseline: FeedVersion,
    pub version: FeedVersion,
    pub changed: DiffMask,
    pub values: Vec<FieldValue>,
}

/// Asks the authority to restart one feed, or every feed of a subscription
/// when `entity` is absent
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResetRequest {
    pub sender: PeerId,
    pub resource: ResourceId,
    pub entity: Option<EntityId>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EntityLeftMessage {
    pub resource: ResourceId,
    pub entity: EntityId,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AuthorityTransferMessage {
    pub resource: ResourceId,
    pub entity: EntityId,
    pub new_owner: PeerId,
}

impl Serde for FullStateMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.resource.ser(writer);
        self.entity.ser(writer);
        self.version.ser(writer);
        self.state.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            resource: ResourceId::de(reader)?,
            entity: EntityId::de(reader)?,
            version: FeedVersion::de(reader)?,
            state: EntityState::de(reader)?,
        })
    }
}

impl Serde for DeltaMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.resource.ser(writer);
        self.entity.ser(writer);
        self.baseline.ser(writer);
        self.version.ser(writer);
        self.changed.ser(writer);
        self.values.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            resource: ResourceId::de(reader)?,
            entity: EntityId::de(reader)?,
            baseline: FeedVersion::de(reader)?,
            version: FeedVersion::de(reader)?,
            changed: DiffMask::de(reader)?,
            values: Vec::<FieldValue>::de(reader)?,
        })
    }
}

impl Serde for ResetRequest {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.sender.ser(writer);
        self.resource.ser(writer);
        self.entity.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            sender: PeerId::de(reader)?,
            resource: ResourceId::de(reader)?,
            entity: Option::<EntityId>::de(reader)?,
        })
    }
}

impl Serde for EntityLeftMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.resource.ser(writer);
        self.entity.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            resource: ResourceId::de(reader)?,
            entity: EntityId::de(reader)?,
        })
    }
}

impl Serde for AuthorityTransferMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.resource.ser(writer);
        self.entity.ser(writer);
        self.new_owner.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            resource: ResourceId::de(reader)?,
            entity: EntityId::de(reader)?,
            new_owner: PeerId::de(reader)?,
        })
    }
}
