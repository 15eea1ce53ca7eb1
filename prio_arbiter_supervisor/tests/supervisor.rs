use prio_arbiter_core::{ArbiterCfg, GrantState, Rank};
use prio_arbiter_supervisor::*;

fn supervisor(shards: usize) -> ArbiterSupervisor {
    let _ = env_logger::builder().is_test(true).try_init();
    ArbiterSupervisor::new(shards, ArbiterCfg::new(3, 8).unwrap()).unwrap()
}

fn rank(r: usize) -> Option<Rank> {
    Some(Rank::new(r, 3).unwrap())
}

#[test]
fn latched_lines_are_sampled_each_tick() {
    let sup = supervisor(1);
    assert!(sup.open_channel("bus:a"));
    assert!(!sup.open_channel("bus:a"));

    let actions = sup.ingest(&[
        RequestEvent::assert("bus:a", 3, 0x33),
        RequestEvent::assert("bus:a", 2, 0x22),
    ]);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].outputs.next, rank(2));
    assert!(actions[0].changed());

    // No new events: the lines stay high and rank 2 is granted.
    let actions = sup.tick();
    assert_eq!(actions[0].outputs.grantee(), rank(2));
    assert_eq!(actions[0].outputs.routed, 0x22);
    assert!(!actions[0].changed());

    // Higher priority arrives; the incumbent keeps the channel.
    let actions = sup.ingest(&[RequestEvent::assert("bus:a", 1, 0x11)]);
    assert_eq!(actions[0].outputs.grantee(), rank(2));

    // Incumbent releases: blanked now, rank 1 next.
    let actions = sup.ingest(&[RequestEvent::release("bus:a", 2)]);
    assert_eq!(actions[0].outputs.grantee(), None);
    assert_eq!(actions[0].outputs.routed, 0);
    assert_eq!(actions[0].outputs.next, rank(1));

    let actions = sup.ingest(&[RequestEvent::data("bus:a", 1, 0x5A)]);
    assert_eq!(actions[0].outputs.grantee(), rank(1));
    assert_eq!(actions[0].outputs.routed, 0x5A);
}

#[test]
fn reset_event_clears_channel() {
    let sup = supervisor(2);
    sup.open_channel("bus:r");
    sup.ingest(&[RequestEvent::assert("bus:r", 1, 1)]);
    assert_eq!(sup.granted("bus:r"), Some(rank(1)));

    let actions = sup.ingest(&[RequestEvent::reset("bus:r", true)]);
    assert!(actions[0].reset);
    assert_eq!(actions[0].outputs.grantee(), None);
    assert_eq!(sup.granted("bus:r"), Some(None));

    sup.ingest(&[RequestEvent::reset("bus:r", false)]);
    assert_eq!(sup.granted("bus:r"), Some(rank(1)));
}

#[test]
fn bad_events_are_rejected_not_applied() {
    let sup = supervisor(1);
    sup.open_channel("bus:a");

    let stats = sup.apply(&[
        RequestEvent::assert("bus:missing", 1, 0),
        RequestEvent::assert("bus:a", 0, 0),
        RequestEvent::assert("bus:a", 4, 0),
        RequestEvent::assert("bus:a", 3, 0),
    ]);
    assert_eq!(stats, ApplyStats { applied: 1, rejected: 3 });

    sup.tick();
    assert_eq!(sup.granted("bus:a"), Some(rank(3)));
    assert_eq!(sup.granted("bus:missing"), None);
}

#[test]
fn channels_are_independent_and_sorted() {
    let sup = supervisor(4);
    for id in ["c", "a", "b"] {
        sup.open_channel(id);
    }
    assert_eq!(sup.channel_ids(), vec!["a", "b", "c"]);

    let actions = sup.ingest(&[RequestEvent::assert("b", 2, 7)]);
    let ids: Vec<&str> = actions.iter().map(|a| a.channel_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(actions[0].outputs.next, None);
    assert_eq!(actions[1].outputs.next, rank(2));
    assert_eq!(actions[2].outputs.next, None);

    assert!(sup.close_channel("b"));
    assert!(!sup.close_channel("b"));
    assert_eq!(sup.tick().len(), 2);
}

#[test]
fn cfg_override_shapes_new_channels() {
    let mut sup = supervisor(1);
    sup.set_cfg_override("wide", ArbiterCfg::new(8, 16).unwrap()).unwrap();
    assert!(sup.set_cfg_override("bad", ArbiterCfg { slots: 0, data_width: 8 }).is_err());

    sup.open_channel("wide");
    sup.open_channel("plain");
    assert_eq!(sup.channel_cfg("wide").map(|c| c.slots), Some(8));
    assert_eq!(sup.channel_cfg("plain").map(|c| c.slots), Some(3));

    let stats = sup.apply(&[RequestEvent::assert("wide", 8, 0xFFFF_FFFF)]);
    assert_eq!(stats.applied, 1);
    sup.tick();
    let actions = sup.tick();
    let wide = actions.iter().find(|a| a.channel_id == "wide").unwrap();
    assert_eq!(wide.outputs.routed, 0xFFFF);
}

#[test]
fn snapshot_restore_roundtrip() {
    let sup = supervisor(3);
    sup.open_channel("x");
    sup.open_channel("y");
    sup.ingest(&[RequestEvent::assert("x", 2, 0)]);

    let snap = sup.snapshot();
    assert_eq!(snap.states.len(), 2);
    assert_eq!(snap.states[0].0, "x");

    let other = supervisor(1);
    other.open_channel("z");
    let stats = other.restore(snap.clone());
    assert_eq!(stats, RestoreStats { applied: 2, overwritten: 0, rejected: 0 });
    assert_eq!(other.channel_ids(), vec!["x", "y"]);
    assert_eq!(other.granted("x"), Some(rank(2)));
    assert_eq!(other.snapshot(), snap);
}

#[test]
fn restore_rejects_out_of_shape_ranks() {
    let sup = supervisor(1);
    sup.open_channel("x");
    sup.ingest(&[RequestEvent::assert("x", 1, 0)]);

    let snap = SupervisorSnapshot {
        states: vec![
            ("x".to_string(), GrantState::held(Rank::new(3, 3).unwrap())),
            ("y".to_string(), GrantState::held(Rank::new(9, 9).unwrap())),
        ],
    };
    let stats = sup.restore_merge(snap);
    assert_eq!(stats, RestoreStats { applied: 1, overwritten: 1, rejected: 1 });
    assert_eq!(sup.granted("x"), Some(rank(3)));
    assert_eq!(sup.granted("y"), None);

    // Latched lines survive a merge: rank 3 is not requesting, rank 1 still is.
    sup.tick();
    assert_eq!(sup.granted("x"), Some(rank(1)));
}

#[test]
fn snapshot_filtered_selects_held_channels() {
    let sup = supervisor(2);
    sup.open_channel("busy");
    sup.open_channel("idle");
    sup.ingest(&[RequestEvent::assert("busy", 1, 0)]);

    let snap = sup.snapshot_filtered(|_, st| st.granted().is_some());
    assert_eq!(snap.states.len(), 1);
    assert_eq!(snap.states[0].0, "busy");
}
