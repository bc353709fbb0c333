use std::{thread, time::Duration};

use meadow_peer::{ModEntry, ModListDiff, SessionEvent};
use meadow_test::story_mesh;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn negotiated(events: &[SessionEvent]) -> Option<&ModListDiff> {
    events.iter().find_map(|event| match event {
        SessionEvent::ModsNegotiated(diff) => Some(diff),
        _ => None,
    })
}

#[test]
fn test_negotiation_result_arrives_through_the_tick() {
    init_logger();
    let mut mesh = story_mesh(&[(1, "host"), (2, "guest")]).unwrap();
    let guest_id = mesh.ids()[1];
    let guest = mesh.peer_mut(guest_id);

    guest
        .session
        .start_mod_negotiation(
            vec![
                ModEntry::new("rainmeadow", true),
                ModEntry::new("moreslugcats", false),
                ModEntry::new("cosmetics", true),
            ],
            vec!["rainmeadow".to_string(), "moreslugcats".to_string()],
        )
        .unwrap();
    assert!(guest.session.is_negotiating());

    for _ in 0..500 {
        guest.tick();
        if negotiated(guest.events()).is_some() {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }

    let diff = negotiated(guest.events()).cloned().unwrap();
    assert_eq!(diff.to_enable, vec!["moreslugcats".to_string()]);
    assert_eq!(diff.to_disable, vec!["cosmetics".to_string()]);
    assert!(diff.is_satisfiable());
    assert!(!guest.session.is_negotiating());
}

#[test]
fn test_missing_mods_make_the_lobby_unsatisfiable() {
    init_logger();
    let mut mesh = story_mesh(&[(1, "host")]).unwrap();
    let host_id = mesh.ids()[0];
    let host = mesh.peer_mut(host_id);

    host.session
        .start_mod_negotiation(Vec::new(), vec!["rainmeadow".to_string()])
        .unwrap();
    for _ in 0..500 {
        host.session.poll_background();
        host.collect_events();
        if negotiated(host.events()).is_some() {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }

    let diff = negotiated(host.events()).cloned().unwrap();
    assert_eq!(diff.unknown, vec!["rainmeadow".to_string()]);
    assert!(!diff.is_satisfiable());
}
