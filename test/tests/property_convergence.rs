/// Property: whatever a lossy, duplicating link does to a stream of moves,
/// a mirror matches the authority once the link is clean for long enough
use proptest::prelude::*;

use meadow_peer::{
    shared::{PeerId, RESET_RETRY_AFTER},
    transport::LinkConditionerConfig,
};
use meadow_test::{creature, room, story_mesh, test_world::CREATURE_TYPE};

const HOST: PeerId = PeerId::new(1);
const GUEST: PeerId = PeerId::new(2);

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn mirror_converges_after_a_lossy_stretch(
        moves in prop::collection::vec((-500i32..500, -500i32..500), 1..40),
        loss in 0.0f32..0.6,
        seed in any::<u64>(),
    ) {
        let mut mesh = story_mesh(&[(1, "host"), (2, "guest")]).unwrap();
        let e1 = creature(HOST, 1);
        let host = mesh.peer_mut(HOST);
        host.world.spawn(e1, HOST, 0, 0);
        host.session.register_entity(&room(), e1, CREATURE_TYPE).unwrap();
        mesh.tick_n(3);

        mesh.set_conditioner(Some(LinkConditionerConfig::new(loss, 0.2, seed)));
        for (x, y) in moves {
            mesh.peer_mut(HOST).world.move_to(&e1, x, y);
            mesh.tick();
        }

        // a mirror that lost its reset request asks again after enough drops
        mesh.set_conditioner(None);
        for step in 0..i32::from(RESET_RETRY_AFTER) + 4 {
            mesh.peer_mut(HOST).world.move_to(&e1, 1000 + step, step);
            mesh.tick();
        }
        mesh.tick_n(2);

        prop_assert_eq!(
            mesh.peer(GUEST).world.position(&e1),
            mesh.peer(HOST).world.position(&e1)
        );
    }
}
