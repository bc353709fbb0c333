use crate::{
    entity::entity_id::EntityId,
    resource::resource_id::ResourceId,
    types::{EntityTypeId, PeerId},
};

/// A replicated simulation object as seen by the replication core.
///
/// The simulation object itself lives outside the core; this record only
/// tracks who is authoritative for it and where it lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OnlineEntity {
    id: EntityId,
    owner: PeerId,
    type_id: EntityTypeId,
    resource: ResourceId,
}

impl OnlineEntity {
    pub fn new(id: EntityId, owner: PeerId, type_id: EntityTypeId, resource: ResourceId) -> Self {
        Self {
            id,
            owner,
            type_id,
            resource,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn owner(&self) -> PeerId {
        self.owner
    }

    pub fn type_id(&self) -> EntityTypeId {
        self.type_id
    }

    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    pub fn is_owned_by(&self, peer: &PeerId) -> bool {
        self.owner == *peer
    }

    pub(crate) fn set_owner(&mut self, owner: PeerId) {
        self.owner = owner;
    }
}
