use crate::{entity::entity_id::EntityId, resource::resource_id::ResourceId, types::PeerId};

/// Changes to the set of mirrored entities, reported to the integration
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum EntityEvent {
    /// A remote entity's first full state was applied
    Joined {
        resource: ResourceId,
        entity: EntityId,
        owner: PeerId,
    },
    Updated {
        resource: ResourceId,
        entity: EntityId,
    },
    Left {
        resource: ResourceId,
        entity: EntityId,
    },
    /// The local peer became authoritative for the entity
    AuthorityGained {
        resource: ResourceId,
        entity: EntityId,
    },
    /// Authority moved between two other peers
    AuthorityChanged {
        resource: ResourceId,
        entity: EntityId,
        owner: PeerId,
    },
}

/// Which feeds a reset request restarted
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResetOutcome {
    /// The one feed for this entity
    Feed(EntityId),
    /// Every feed of the requester's subscription
    Subscription { feeds: usize },
    NothingMatched,
}
