use crate::{
    resource::resource_id::ResourceId,
    types::{PeerId, StateTick},
};

/// A peer's registered interest in one resource
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Subscription {
    peer: PeerId,
    resource: ResourceId,
    since: StateTick,
}

impl Subscription {
    pub fn new(peer: PeerId, resource: ResourceId, since: StateTick) -> Self {
        Self {
            peer,
            resource,
            since,
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    /// Tick at which the subscription was created
    pub fn since(&self) -> StateTick {
        self.since
    }
}
