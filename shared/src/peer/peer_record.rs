use std::collections::HashSet;

use crate::{entity::entity_id::EntityId, types::StateTick};

/// A remote peer as tracked by the local session
#[derive(Clone, Debug)]
pub struct PeerRecord {
    name: String,
    last_heard: StateTick,
    authority: HashSet<EntityId>,
}

impl PeerRecord {
    pub fn new(name: String, now: StateTick) -> Self {
        Self {
            name,
            last_heard: now,
            authority: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last_heard(&self) -> StateTick {
        self.last_heard
    }

    /// Entities this peer is authoritative for
    pub fn authority(&self) -> &HashSet<EntityId> {
        &self.authority
    }

    pub(crate) fn mark_heard(&mut self, now: StateTick) {
        self.last_heard = self.last_heard.max(now);
    }

    pub(crate) fn authority_mut(&mut self) -> &mut HashSet<EntityId> {
        &mut self.authority
    }
}
