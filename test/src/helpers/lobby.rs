use meadow_peer::{
    shared::{ExternalKey, PeerId, ResourceId},
    MeadowPeerError, SessionConfig,
};

use super::{TestMesh, TestPeer};

pub const WORLD_NAME: &str = "SU";
pub const ROOM_NAME: &str = "SU_A01";
pub const SHELTER_NAME: &str = "SU_S01";
pub const WORLD_KEY: ExternalKey = ExternalKey::new(100);
pub const ROOM_KEY: ExternalKey = ExternalKey::new(101);

pub fn lobby() -> ResourceId {
    ResourceId::lobby("story")
}

pub fn world() -> ResourceId {
    lobby().world(WORLD_NAME)
}

pub fn room() -> ResourceId {
    world().room(ROOM_NAME)
}

/// Opens the lobby owned by `owner`, loads the world and one of its rooms,
/// and subscribes the peer to all three
pub fn open_story_lobby(peer: &mut TestPeer, owner: PeerId) -> Result<(), MeadowPeerError> {
    peer.world.load_world(WORLD_KEY, &[ROOM_NAME, SHELTER_NAME]);
    peer.world.load_room(ROOM_KEY);
    peer.session.open_lobby(lobby(), owner, &peer.world)?;
    peer.session
        .on_object_loaded(&lobby(), WORLD_NAME, WORLD_KEY, &peer.world)?;
    peer.session
        .on_object_loaded(&world(), ROOM_NAME, ROOM_KEY, &peer.world)?;
    Ok(())
}

/// A connected mesh where every peer opened the story lobby owned by the
/// lowest id in `peers`
pub fn story_mesh(peers: &[(u64, &str)]) -> Result<TestMesh, MeadowPeerError> {
    story_mesh_with_config(SessionConfig::default(), peers)
}

pub fn story_mesh_with_config(
    config: SessionConfig,
    peers: &[(u64, &str)],
) -> Result<TestMesh, MeadowPeerError> {
    let mut mesh = TestMesh::with_config(config);
    for (id, name) in peers {
        mesh.add_peer(*id, name);
    }
    let Some(owner) = mesh.ids().into_iter().min() else {
        return Ok(mesh);
    };
    for peer in mesh.peers_mut() {
        open_story_lobby(peer, owner)?;
    }
    mesh.connect_all();
    mesh.tick_n(3);
    Ok(mesh)
}
