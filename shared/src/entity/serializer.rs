use crate::entity::{entity_id::EntityId, entity_state::EntityState};

/// Capability implemented outside the core by each simulation integration:
/// turns live simulation objects into [`EntityState`]s and back.
pub trait EntityStateSerializer {
    /// Current state of an entity this peer is authoritative for, or `None`
    /// if the simulation no longer has it
    fn capture(&self, entity: &EntityId) -> Option<EntityState>;

    /// Writes a received state into the local mirror of a remote entity
    fn apply(&mut self, entity: &EntityId, state: &EntityState);

    /// The mirrored entity left the local session
    fn remove(&mut self, entity: &EntityId);
}
