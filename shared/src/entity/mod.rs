pub mod diff_mask;
pub mod entity_id;
pub mod entity_state;
pub mod error;
pub mod online_entity;
pub mod serializer;
