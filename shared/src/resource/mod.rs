pub mod adapter;
pub mod error;
#[allow(clippy::module_inception)]
pub mod resource;
pub mod resource_id;
pub mod resource_state;
pub mod resource_tree;
