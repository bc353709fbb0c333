/// Assert that a peer mirrors an entity at the authority's position
#[macro_export]
macro_rules! assert_converged {
    ($authority:expr, $mirror:expr, $entity:expr) => {
        let expected = $authority.world.position(&$entity);
        assert!(expected.is_some(), "Authority has no entity {:?}", $entity);
        assert_eq!(
            $mirror.world.position(&$entity),
            expected,
            "Peer {} did not converge on entity {:?}",
            $mirror.id,
            $entity
        );
    };
}

/// Assert that a peer raised no error events
#[macro_export]
macro_rules! assert_no_errors {
    ($peer:expr) => {
        let errors = $peer.errors();
        assert!(
            errors.is_empty(),
            "Peer {} raised errors: {:?}",
            $peer.id,
            errors
        );
    };
}
