pub mod assertions;
pub mod lobby;
pub mod test_mesh;
pub mod test_peer;

pub use lobby::{
    lobby, open_story_lobby, room, story_mesh, story_mesh_with_config, world, ROOM_KEY,
    ROOM_NAME, SHELTER_NAME, WORLD_KEY, WORLD_NAME,
};
pub use test_mesh::TestMesh;
pub use test_peer::TestPeer;
