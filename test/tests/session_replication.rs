use meadow_peer::{
    shared::{EntityEvent, PeerId},
    SessionEvent,
};
use meadow_test::{
    assert_converged, assert_no_errors, creature, open_story_lobby, room, story_mesh, world,
    test_world::CREATURE_TYPE, TestMesh, ROOM_KEY, WORLD_KEY,
};

const HOST: PeerId = PeerId::new(1);
const GUEST: PeerId = PeerId::new(2);
const LATE: PeerId = PeerId::new(3);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Host and guest in the story lobby, the host owning one creature
fn mesh_with_creature() -> TestMesh {
    let mut mesh = story_mesh(&[(1, "host"), (2, "guest")]).unwrap();
    let host = mesh.peer_mut(HOST);
    host.world.spawn(creature(HOST, 1), HOST, 0, 0);
    host.session
        .register_entity(&room(), creature(HOST, 1), CREATURE_TYPE)
        .unwrap();
    mesh.tick_n(3);
    mesh
}

#[test]
fn test_mirror_joins_and_follows_moves() {
    init_logger();
    let mut mesh = mesh_with_creature();
    let e1 = creature(HOST, 1);

    assert_converged!(mesh.peer(HOST), mesh.peer(GUEST), e1);
    assert!(mesh.peer(GUEST).entity_events().contains(&&EntityEvent::Joined {
        resource: room(),
        entity: e1,
        owner: HOST,
    }));
    assert_eq!(mesh.peer(GUEST).session.directory().authority_of(&e1), Some(HOST));

    for step in 1..=10 {
        mesh.peer_mut(HOST).world.move_to(&e1, step, -step);
        mesh.tick();
    }
    mesh.tick();

    assert_eq!(mesh.peer(GUEST).world.position(&e1), Some((10, -10)));
    assert_no_errors!(mesh.peer(HOST));
    assert_no_errors!(mesh.peer(GUEST));
}

#[test]
fn test_late_joiner_receives_full_state() {
    init_logger();
    let mut mesh = mesh_with_creature();
    let e1 = creature(HOST, 1);
    mesh.peer_mut(HOST).world.move_to(&e1, 7, 3);
    mesh.tick_n(2);

    mesh.add_peer(3, "late");
    let late = mesh.peer_mut(LATE);
    open_story_lobby(late, HOST).unwrap();
    late.session.connect(HOST, "host");
    late.session.connect(GUEST, "guest");
    mesh.tick_n(3);

    let late = mesh.peer(LATE);
    assert_eq!(late.world.position(&e1), Some((7, 3)));
    assert_eq!(late.session.peers(), vec![HOST, GUEST]);
    assert!(mesh
        .peer(HOST)
        .events()
        .iter()
        .any(|event| matches!(event, SessionEvent::PeerConnected { peer, .. } if *peer == LATE)));
    assert_no_errors!(mesh.peer(LATE));
}

#[test]
fn test_removed_entity_leaves_mirrors() {
    init_logger();
    let mut mesh = mesh_with_creature();
    let e1 = creature(HOST, 1);
    assert!(mesh.peer(GUEST).world.has_creature(&e1));

    let host = mesh.peer_mut(HOST);
    host.session.remove_entity(&room(), &e1).unwrap();
    mesh.tick_n(2);

    let guest = mesh.peer(GUEST);
    assert!(!guest.world.has_creature(&e1));
    assert!(guest.entity_events().contains(&&EntityEvent::Left {
        resource: room(),
        entity: e1,
    }));
    assert_eq!(guest.session.directory().authority_of(&e1), None);
}

#[test]
fn test_authority_transfer_hands_over_the_feed() {
    init_logger();
    let mut mesh = mesh_with_creature();
    let e1 = creature(HOST, 1);

    mesh.peer_mut(HOST)
        .session
        .transfer_authority(&room(), &e1, GUEST)
        .unwrap();
    assert_eq!(mesh.peer(HOST).session.directory().authority_of(&e1), Some(GUEST));
    mesh.tick_n(2);

    assert!(mesh
        .peer(GUEST)
        .entity_events()
        .contains(&&EntityEvent::AuthorityGained {
            resource: room(),
            entity: e1,
        }));

    mesh.peer_mut(GUEST).world.move_to(&e1, 42, 24);
    mesh.tick_n(2);

    assert_converged!(mesh.peer(GUEST), mesh.peer(HOST), e1);
    assert_no_errors!(mesh.peer(HOST));
    assert_no_errors!(mesh.peer(GUEST));
}

#[test]
fn test_third_peer_follows_authority_change() {
    init_logger();
    let mut mesh = story_mesh(&[(1, "host"), (2, "guest"), (3, "third")]).unwrap();
    let e1 = creature(HOST, 1);
    let host = mesh.peer_mut(HOST);
    host.world.spawn(e1, HOST, 1, 1);
    host.session
        .register_entity(&room(), e1, CREATURE_TYPE)
        .unwrap();
    mesh.tick_n(3);
    assert_converged!(mesh.peer(HOST), mesh.peer(LATE), e1);

    mesh.peer_mut(HOST)
        .session
        .transfer_authority(&room(), &e1, GUEST)
        .unwrap();
    mesh.tick_n(2);
    assert!(mesh
        .peer(LATE)
        .entity_events()
        .contains(&&EntityEvent::AuthorityChanged {
            resource: room(),
            entity: e1,
            owner: GUEST,
        }));

    mesh.peer_mut(GUEST).world.move_to(&e1, -5, 9);
    mesh.tick_n(3);
    assert_eq!(mesh.peer(LATE).world.position(&e1), Some((-5, 9)));
    assert_eq!(mesh.peer(LATE).session.directory().authority_of(&e1), Some(GUEST));
}

#[test]
fn test_unloading_the_room_releases_it() {
    init_logger();
    let mut mesh = mesh_with_creature();
    let e1 = creature(HOST, 1);

    let guest = mesh.peer_mut(GUEST);
    guest.world.unload(ROOM_KEY);
    guest.session
        .on_object_unloaded(ROOM_KEY, &mut guest.world)
        .unwrap();
    guest.collect_events();

    assert!(!guest.world.has_creature(&e1));
    assert!(!guest.session.replication().tree().is_active(&room()));
    assert!(guest.session.replication().tree().is_active(&world()));
    assert!(guest.session.replication().find_bound(ROOM_KEY).is_none());

    mesh.tick_n(2);
    let host = mesh.peer(HOST);
    assert!(!host
        .session
        .replication()
        .subscriptions()
        .is_subscribed(&GUEST, &room()));
    assert!(host.session.replication().tree().is_active(&room()));
}

#[test]
fn test_unloading_an_owned_world_tells_subscribers() {
    init_logger();
    let mut mesh = mesh_with_creature();
    let e1 = creature(HOST, 1);

    let host = mesh.peer_mut(HOST);
    host.world.unload(WORLD_KEY);
    host.session
        .on_object_unloaded(WORLD_KEY, &mut host.world)
        .unwrap();
    assert!(!host.session.replication().tree().is_active(&world()));
    assert!(!host.session.replication().tree().contains(&room()));
    mesh.tick_n(2);

    let guest = mesh.peer(GUEST);
    assert!(!guest.world.has_creature(&e1));
    assert!(guest.entity_events().contains(&&EntityEvent::Left {
        resource: room(),
        entity: e1,
    }));
}
