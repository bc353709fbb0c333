pub mod entity_event;
pub mod replication_manager;
