use meadow_peer::{
    shared::{FeedError, PeerId, RpcArg, RpcTarget, SyncError},
    transport::LinkConditionerConfig,
    MeadowPeerError,
};
use meadow_test::{
    assert_converged, assert_no_errors, creature, room,
    story::{ADD_MUSHROOM_COUNTER, REINFORCE_KARMA},
    story_mesh,
    test_world::CREATURE_TYPE,
    StoryGame, TestMesh,
};

const HOST: PeerId = PeerId::new(1);
const GUEST: PeerId = PeerId::new(2);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

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

fn stale_feed_errors(errors: &[&MeadowPeerError]) -> usize {
    errors
        .iter()
        .filter(|error| {
            matches!(
                error,
                MeadowPeerError::Sync(SyncError::Feed(FeedError::StaleFeed { .. }))
            )
        })
        .count()
}

/// Deltas lost on the wire leave the mirror behind until its single reset
/// request brings a full state
#[test]
fn test_lost_deltas_recover_through_one_reset() {
    init_logger();
    let mut mesh = mesh_with_creature();
    let e1 = creature(HOST, 1);
    assert_converged!(mesh.peer(HOST), mesh.peer(GUEST), e1);

    mesh.set_conditioner(Some(LinkConditionerConfig::new(1.0, 0.0, 11)));
    for step in 1..=3 {
        mesh.peer_mut(HOST).world.move_to(&e1, step, step);
        mesh.tick();
    }
    assert_eq!(mesh.peer(GUEST).world.position(&e1), Some((0, 0)));

    mesh.set_conditioner(None);
    mesh.peer_mut(HOST).world.move_to(&e1, 50, 50);
    mesh.tick_n(3);

    assert_converged!(mesh.peer(HOST), mesh.peer(GUEST), e1);
    assert_eq!(stale_feed_errors(&mesh.peer(GUEST).errors()), 1);
    assert_no_errors!(mesh.peer(HOST));
}

/// Duplicated packets are harmless: repeated feed messages are dropped by
/// version and once-calls run once
#[test]
fn test_duplicated_packets_apply_once() {
    init_logger();
    let mut mesh = mesh_with_creature();
    let e1 = creature(HOST, 1);
    mesh.peer_mut(HOST).world.game = Some(StoryGame::new(7));
    mesh.set_conditioner(Some(LinkConditionerConfig::new(0.0, 1.0, 5)));

    for step in 1..=5 {
        mesh.peer_mut(HOST).world.move_to(&e1, step * 2, 0);
        mesh.tick();
    }

    let guest = mesh.peer_mut(GUEST);
    guest.session
        .invoke_once(RpcTarget::Peer(HOST), REINFORCE_KARMA, Vec::new())
        .unwrap();
    guest.session
        .invoke(RpcTarget::Peer(HOST), ADD_MUSHROOM_COUNTER, Vec::<RpcArg>::new())
        .unwrap();
    mesh.tick_n(2);

    assert_converged!(mesh.peer(HOST), mesh.peer(GUEST), e1);
    assert_no_errors!(mesh.peer(GUEST));
    assert_no_errors!(mesh.peer(HOST));

    let host = mesh.peer(HOST);
    assert_eq!(host.rpc_executions(REINFORCE_KARMA), 1);
    assert_eq!(host.rpc_executions(ADD_MUSHROOM_COUNTER), 2);
    let game = host.world.game.as_ref().unwrap();
    assert!(game.reinforced_karma);
    assert_eq!(game.mushroom_counter, 640);
}

/// A lost reset request is sent again once enough deltas were dropped
#[test]
fn test_lost_reset_request_is_retried() {
    init_logger();
    let mut mesh = mesh_with_creature();
    let e1 = creature(HOST, 1);

    // the host's first delta after the outage is stale; the guest's answer
    // is lost along with everything else
    mesh.set_conditioner(Some(LinkConditionerConfig::new(1.0, 0.0, 3)));
    mesh.peer_mut(HOST).world.move_to(&e1, 1, 0);
    mesh.tick();
    mesh.set_conditioner(None);
    mesh.peer_mut(HOST).world.move_to(&e1, 2, 0);
    mesh.peer_mut(HOST).tick();
    mesh.set_conditioner(Some(LinkConditionerConfig::new(1.0, 0.0, 3)));
    mesh.peer_mut(GUEST).tick();
    mesh.set_conditioner(None);
    assert_eq!(stale_feed_errors(&mesh.peer(GUEST).errors()), 1);

    for step in 3..=40 {
        mesh.peer_mut(HOST).world.move_to(&e1, step, 0);
        mesh.tick();
    }
    mesh.tick_n(2);

    assert_converged!(mesh.peer(HOST), mesh.peer(GUEST), e1);
    assert_eq!(stale_feed_errors(&mesh.peer(GUEST).errors()), 2);
}
