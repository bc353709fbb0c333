use meadow_peer::{
    shared::{EntityEvent, PeerId},
    transport::PacketSender,
    MeadowPeerError, SessionConfig, SessionEvent,
};
use meadow_shared::{MessageError, Packet, SessionMessage};
use meadow_test::{
    creature, lobby, room, story_mesh, story_mesh_with_config, test_world::CREATURE_TYPE, world,
    TestMesh,
};

const HOST: PeerId = PeerId::new(1);
const GUEST: PeerId = PeerId::new(2);
const THIRD: PeerId = PeerId::new(3);
const STRANGER: PeerId = PeerId::new(9);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn short_timeout() -> SessionConfig {
    SessionConfig {
        peer_timeout_ticks: 30,
        heartbeat_interval_ticks: 5,
        ..SessionConfig::default()
    }
}

fn disconnected(events: &[SessionEvent], peer: PeerId) -> bool {
    events
        .iter()
        .any(|event| matches!(event, SessionEvent::PeerDisconnected(left) if *left == peer))
}

#[test]
fn test_heartbeats_keep_quiet_peers_connected() {
    init_logger();
    let mut mesh = story_mesh_with_config(short_timeout(), &[(1, "host"), (2, "guest")]).unwrap();
    mesh.tick_n(100);

    assert_eq!(mesh.peer(HOST).session.peers(), vec![GUEST]);
    assert_eq!(mesh.peer(GUEST).session.peers(), vec![HOST]);
    assert!(!disconnected(mesh.peer(HOST).events(), GUEST));
}

#[test]
fn test_silent_peer_times_out_and_its_entities_leave() {
    init_logger();
    let mut mesh = story_mesh_with_config(short_timeout(), &[(1, "host"), (2, "guest")]).unwrap();
    let g1 = creature(GUEST, 1);
    let guest = mesh.peer_mut(GUEST);
    guest.world.spawn(g1, GUEST, 3, 3);
    guest.session
        .register_entity(&room(), g1, CREATURE_TYPE)
        .unwrap();
    mesh.tick_n(3);
    assert!(mesh.peer(HOST).world.has_creature(&g1));

    mesh.remove_peer(GUEST);
    mesh.tick_n(40);

    let host = mesh.peer(HOST);
    assert!(disconnected(host.events(), GUEST));
    assert!(host.errors().iter().any(|error| matches!(
        error,
        MeadowPeerError::PeerConnectionLost { peer, silent_ticks } if *peer == GUEST && *silent_ticks > 30
    )));
    assert!(!host.world.has_creature(&g1));
    assert!(host.entity_events().contains(&&EntityEvent::Left {
        resource: room(),
        entity: g1,
    }));
    assert!(host.session.peers().is_empty());
    assert!(host
        .session
        .replication()
        .subscriptions()
        .subscriptions_of(&GUEST)
        .is_empty());
}

#[test]
fn test_departed_owner_hands_resources_to_lowest_peer() {
    init_logger();
    let mut mesh = story_mesh_with_config(
        short_timeout(),
        &[(1, "host"), (2, "guest"), (3, "third")],
    )
    .unwrap();

    mesh.remove_peer(HOST);
    mesh.tick_n(40);

    for id in [GUEST, THIRD] {
        let peer = mesh.peer(id);
        assert!(disconnected(peer.events(), HOST));
        for resource in [lobby(), world(), room()] {
            assert_eq!(
                peer.session.replication().resource(&resource).unwrap().owner(),
                Some(GUEST)
            );
        }
    }
    assert!(mesh.peer(GUEST).events().iter().any(|event| matches!(
        event,
        SessionEvent::OwnershipAssigned { resource, owner } if *resource == lobby() && *owner == GUEST
    )));
}

#[test]
fn test_explicit_disconnect_cleans_up_immediately() {
    init_logger();
    let mut mesh = story_mesh(&[(1, "host"), (2, "guest")]).unwrap();
    let e1 = creature(HOST, 1);
    let host = mesh.peer_mut(HOST);
    host.world.spawn(e1, HOST, 0, 0);
    host.session
        .register_entity(&room(), e1, CREATURE_TYPE)
        .unwrap();
    mesh.tick_n(3);

    mesh.remove_peer(HOST);
    let guest = mesh.peer_mut(GUEST);
    guest.session.peer_disconnected(HOST, &mut guest.world);
    guest.collect_events();

    assert!(!guest.world.has_creature(&e1));
    assert!(disconnected(guest.events(), HOST));
    assert_eq!(
        guest.session.replication().resource(&room()).unwrap().owner(),
        Some(GUEST)
    );

    // a second notice for the same peer is ignored
    let before = guest.events().len();
    guest.session.peer_disconnected(HOST, &mut guest.world);
    guest.collect_events();
    assert_eq!(guest.events().len(), before);
}

fn stranger_sends(mesh: &TestMesh, packet: &[u8]) {
    let (sender, _receiver) = mesh.hub().join(STRANGER);
    assert!(sender.send(&HOST, packet).is_ok());
}

#[test]
fn test_messages_from_unknown_peers_are_dropped() {
    init_logger();
    let mut mesh = story_mesh(&[(1, "host"), (2, "guest")]).unwrap();
    let packet = Packet::new(STRANGER, vec![SessionMessage::Subscribe(room())]);
    stranger_sends(&mesh, &packet.to_bytes());
    mesh.tick();

    let host = mesh.peer(HOST);
    assert!(host.errors().iter().any(|error| matches!(
        error,
        MeadowPeerError::UnknownPeer { peer, message: "Subscribe" } if *peer == STRANGER
    )));
    assert!(!host
        .session
        .replication()
        .subscriptions()
        .is_subscribed(&STRANGER, &room()));
}

#[test]
fn test_forged_sender_is_rejected() {
    init_logger();
    let mut mesh = story_mesh(&[(1, "host"), (2, "guest")]).unwrap();
    let packet = Packet::new(GUEST, vec![SessionMessage::Unsubscribe(room())]);
    stranger_sends(&mesh, &packet.to_bytes());
    mesh.tick();

    let host = mesh.peer(HOST);
    assert!(host.errors().iter().any(|error| matches!(
        error,
        MeadowPeerError::Decode {
            source: MessageError::SenderMismatch { transport: 9, claimed: 2 },
            ..
        }
    )));
    assert!(host
        .session
        .replication()
        .subscriptions()
        .is_subscribed(&GUEST, &room()));
}

#[test]
fn test_garbage_packet_does_not_stop_the_tick() {
    init_logger();
    let mut mesh = story_mesh(&[(1, "host"), (2, "guest")]).unwrap();
    stranger_sends(&mesh, &[0xff, 0xff, 0xff]);
    mesh.peer_mut(GUEST).session.unsubscribe(&room());
    mesh.tick_n(2);

    let host = mesh.peer(HOST);
    assert!(host
        .errors()
        .iter()
        .any(|error| matches!(error, MeadowPeerError::Decode { peer, .. } if *peer == STRANGER)));
    assert!(!host
        .session
        .replication()
        .subscriptions()
        .is_subscribed(&GUEST, &room()));
}
