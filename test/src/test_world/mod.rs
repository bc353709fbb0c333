/// Simple simulation for end-to-end tests: loaded world and room objects,
/// creatures with a position, and an optional story game

use std::collections::{HashMap, HashSet};

use meadow_shared::{
    EntityId, EntityIdType, EntityState, EntityStateSerializer, EntityTypeId, ExternalKey,
    FieldValue, PeerId, ResourceAdapter, ResourceId, ResourceKind,
};

use crate::story::StoryGame;

pub const CREATURE_TYPE: EntityTypeId = 1;

pub fn creature(originator: PeerId, index: u32) -> EntityId {
    EntityId::new(EntityIdType::Object, originator, index)
}

#[derive(Default)]
pub struct TestWorld {
    worlds: HashMap<ExternalKey, Vec<String>>,
    rooms: HashSet<ExternalKey>,
    creatures: HashMap<EntityId, EntityState>,
    pub game: Option<StoryGame>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a world object that knows the given rooms
    pub fn load_world(&mut self, key: ExternalKey, rooms: &[&str]) {
        self.worlds
            .insert(key, rooms.iter().map(|room| room.to_string()).collect());
    }

    pub fn load_room(&mut self, key: ExternalKey) {
        self.rooms.insert(key);
    }

    pub fn unload(&mut self, key: ExternalKey) {
        self.worlds.remove(&key);
        self.rooms.remove(&key);
    }

    pub fn spawn(&mut self, entity: EntityId, owner: PeerId, x: i32, y: i32) {
        self.creatures.insert(
            entity,
            EntityState::new(owner, CREATURE_TYPE, position_fields(x, y)),
        );
    }

    /// Moves a creature, keeping whoever is recorded as its owner
    pub fn move_to(&mut self, entity: &EntityId, x: i32, y: i32) {
        if let Some(state) = self.creatures.get_mut(entity) {
            for (index, field) in position_fields(x, y).into_iter().enumerate() {
                state.set_field(index, field);
            }
        }
    }

    pub fn position(&self, entity: &EntityId) -> Option<(i32, i32)> {
        let state = self.creatures.get(entity)?;
        Some((read_i32(state, 0)?, read_i32(state, 1)?))
    }

    pub fn has_creature(&self, entity: &EntityId) -> bool {
        self.creatures.contains_key(entity)
    }

    pub fn creature_count(&self) -> usize {
        self.creatures.len()
    }
}

fn position_fields(x: i32, y: i32) -> Vec<FieldValue> {
    vec![
        FieldValue::new(x.to_le_bytes().to_vec()),
        FieldValue::new(y.to_le_bytes().to_vec()),
    ]
}

fn read_i32(state: &EntityState, index: usize) -> Option<i32> {
    let bytes: [u8; 4] = state.field(index)?.as_bytes().try_into().ok()?;
    Some(i32::from_le_bytes(bytes))
}

impl EntityStateSerializer for TestWorld {
    fn capture(&self, entity: &EntityId) -> Option<EntityState> {
        self.creatures.get(entity).cloned()
    }

    fn apply(&mut self, entity: &EntityId, state: &EntityState) {
        self.creatures.insert(*entity, state.clone());
    }

    fn remove(&mut self, entity: &EntityId) {
        self.creatures.remove(entity);
    }
}

impl ResourceAdapter for TestWorld {
    fn has_object(&self, key: ExternalKey) -> bool {
        self.worlds.contains_key(&key) || self.rooms.contains(&key)
    }

    fn children_of(&self, resource: &ResourceId, binding: Option<ExternalKey>) -> Vec<String> {
        match (resource.kind(), binding) {
            (ResourceKind::World, Some(key)) => self.worlds.get(&key).cloned().unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_survive_capture_and_apply() {
        let host = PeerId::new(1);
        let mut world = TestWorld::new();
        world.spawn(creature(host, 1), host, -3, 12);
        world.move_to(&creature(host, 1), 4, -8);

        let state = world.capture(&creature(host, 1)).unwrap();
        let mut mirror = TestWorld::new();
        mirror.apply(&creature(host, 1), &state);
        assert_eq!(mirror.position(&creature(host, 1)), Some((4, -8)));
    }

    #[test]
    fn world_reports_its_rooms() {
        let key = ExternalKey::new(5);
        let mut world = TestWorld::new();
        world.load_world(key, &["SU_A01", "SU_S01"]);
        let resource = ResourceId::lobby("main").world("SU");

        assert!(world.has_object(key));
        assert_eq!(
            world.children_of(&resource, Some(key)),
            vec!["SU_A01".to_string(), "SU_S01".to_string()]
        );
        assert!(world.children_of(&resource, None).is_empty());
    }
}
