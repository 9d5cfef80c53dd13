//! End-to-end scenarios driven through `Simulation`
//!
//! Canvas is 1000x800, so the controlled cursor starts at (485, 370) until a
//! pointer sample moves it.

use std::collections::BTreeSet;

use canvas_core::{ClassicRoster, CursorSeed, Simulation, Tuning};
use canvas_events::{Affinity, CanvasEventKind, ChatStatus, CursorId, PairKey, SimTime};

fn tuning() -> Tuning {
    let mut tuning = Tuning::default();
    tuning.canvas.width = 1000.0;
    tuning.canvas.height = 800.0;
    tuning
}

fn at(ms: u64) -> SimTime {
    SimTime::from_millis(ms)
}

/// Tick every `step` ms from `from` up to and including `to`
fn run_until(sim: &mut Simulation, from: u64, to: u64, step: u64) -> Vec<CanvasEventKind> {
    let mut kinds = Vec::new();
    let mut now = from;
    while now <= to {
        kinds.extend(sim.tick(at(now)).events.into_iter().map(|e| e.kind));
        now += step;
    }
    kinds
}

/// One stationary cursor next to where the pointer will be
fn lingering_pair() -> Simulation {
    let seeds = vec![CursorSeed::at(1, "Emma", Affinity::A, 100.0, 100.0)];
    let mut sim = Simulation::from_seeds(tuning(), seeds).unwrap();
    sim.set_pointer(120.0, 100.0);
    sim
}

#[test]
fn cross_category_pair_links_then_unlinks() {
    let seeds = vec![
        CursorSeed::at(1, "Emma", Affinity::A, 100.0, 50.0),
        CursorSeed::at(2, "Liam", Affinity::B, 110.0, 50.0),
    ];
    let mut sim = Simulation::from_seeds(tuning(), seeds).unwrap();

    let report = sim.tick(at(0));
    assert_eq!(sim.interactions().partner_of(CursorId(1)), Some(CursorId(2)));
    assert_eq!(sim.interactions().partner_of(CursorId(2)), Some(CursorId(1)));
    let pair = PairKey::new(CursorId(1), CursorId(2));
    assert!(sim.tracker().is_tracked(pair));
    assert!(report
        .events
        .iter()
        .any(|e| e.kind == CanvasEventKind::InteractionStarted { pair }));

    assert!(sim.place(CursorId(2), 310.0, 50.0));
    let report = sim.tick(at(30));
    assert_eq!(sim.interactions().partner_of(CursorId(1)), None);
    assert_eq!(sim.interactions().partner_of(CursorId(2)), None);
    assert!(!sim.tracker().is_tracked(pair));
    assert!(report.events.iter().any(|e| matches!(
        e.kind,
        CanvasEventKind::InteractionEnded { pair: ended, duration_ms: 30 } if ended == pair
    )));
}

#[test]
fn same_category_cursors_never_link() {
    let seeds = vec![
        CursorSeed::at(1, "Emma", Affinity::A, 100.0, 50.0),
        CursorSeed::at(2, "Olivia", Affinity::A, 110.0, 50.0),
    ];
    let mut sim = Simulation::from_seeds(tuning(), seeds).unwrap();
    sim.tick(at(0));
    assert!(sim.interactions().is_empty());
    assert!(sim.tracker().is_empty());
}

#[test]
fn non_finite_pointer_never_links_or_opens_chat() {
    let seeds = vec![CursorSeed::at(1, "Emma", Affinity::A, 900.0, 600.0)];
    let mut sim = Simulation::from_seeds(Tuning::default(), seeds).unwrap();
    let controlled = sim.controlled_id();
    let start = sim.position_of(controlled).unwrap();

    sim.set_pointer(f32::NAN, f32::NAN);
    let kinds = run_until(&mut sim, 0, 3100, 30);

    assert_eq!(sim.interactions().partner_of(controlled), None);
    assert_eq!(sim.chat().status(), ChatStatus::None);
    assert!(!kinds
        .iter()
        .any(|kind| matches!(kind, CanvasEventKind::ChatOpened { .. })));
    let position = sim.position_of(controlled).unwrap();
    assert!(position.x.is_finite() && position.y.is_finite());
    assert_eq!(position, start);
}

#[test]
fn first_found_wins_in_id_order() {
    // 2 is within range of both 1 and 3; 1 claims it first
    let seeds = vec![
        CursorSeed::at(1, "Emma", Affinity::A, 100.0, 50.0),
        CursorSeed::at(2, "Liam", Affinity::B, 150.0, 50.0),
        CursorSeed::at(3, "Olivia", Affinity::A, 160.0, 50.0),
    ];
    let mut sim = Simulation::from_seeds(tuning(), seeds).unwrap();
    sim.tick(at(0));
    assert_eq!(sim.interactions().partner_of(CursorId(2)), Some(CursorId(1)));
    assert_eq!(sim.interactions().partner_of(CursorId(3)), None);
}

#[test]
fn chat_opens_only_after_three_seconds() {
    let mut sim = lingering_pair();
    let controlled = sim.controlled_id();

    sim.tick(at(0));
    assert_eq!(sim.interactions().partner_of(controlled), Some(CursorId(1)));

    sim.tick(at(2999));
    assert_eq!(sim.chat().status(), ChatStatus::None);

    let report = sim.tick(at(3001));
    assert_eq!(sim.chat().status(), ChatStatus::Started);
    assert!(report.events.iter().any(|e| e.kind
        == CanvasEventKind::ChatOpened {
            partner: CursorId(1),
            replaced: None
        }));
}

#[test]
fn chat_does_not_open_at_exactly_the_threshold() {
    let mut sim = lingering_pair();
    sim.tick(at(0));
    sim.tick(at(3000));
    assert_eq!(sim.chat().status(), ChatStatus::None);
}

#[test]
fn lingering_with_any_category_opens_with_one_greeting() {
    // The controlled cursor is category B; pick a B partner to exercise the
    // any-category rule
    let seeds = vec![CursorSeed::at(1, "Liam", Affinity::B, 100.0, 100.0)];
    let mut sim = Simulation::from_seeds(tuning(), seeds).unwrap();
    sim.set_pointer(150.0, 100.0);

    run_until(&mut sim, 0, 3200, 100);

    assert_eq!(sim.chat().status(), ChatStatus::Started);
    let messages = sim.chat().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender, CursorId(1));
    assert_eq!(messages[0].content, "Hi there! I'm Liam. Nice to meet you!");

    let frame = sim.frame();
    let chat = frame.chat.as_ref().unwrap();
    assert_eq!(chat.partner_name, "Liam");
    assert_eq!(chat.user_name, "You");
    assert!(frame.cursor(CursorId(1)).unwrap().in_chat);
}

#[test]
fn partner_drifts_toward_the_controlled_cursor() {
    let seeds = vec![CursorSeed::at(1, "Liam", Affinity::B, 100.0, 100.0).with_speed(2.0, 2.0)];
    let mut sim = Simulation::from_seeds(tuning(), seeds).unwrap();
    sim.set_pointer(170.0, 100.0);

    sim.tick(at(0));
    let position = sim.position_of(CursorId(1)).unwrap();
    // 2% of the 70 unit gap; velocity ignored
    assert!((position.x - 101.4).abs() < 1e-3);
    assert!((position.y - 100.0).abs() < 1e-3);
}

#[test]
fn sending_activates_and_schedules_one_reply() {
    let mut sim = lingering_pair();
    run_until(&mut sim, 0, 3030, 30);
    assert_eq!(sim.chat().status(), ChatStatus::Started);
    let started_at = sim.chat().session().unwrap().started_at();

    assert!(sim.send_message("hello there"));
    assert!(!sim.send_message("   "));

    assert_eq!(sim.chat().status(), ChatStatus::Active);
    let messages = sim.chat().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].sender, sim.controlled_id());
    assert!(messages[1].timestamp > started_at);

    let due = sim.chat().pending_reply().unwrap().due;
    let delay = due.saturating_since(sim.now());
    assert!((1000..3000).contains(&delay));

    let kinds = run_until(&mut sim, 3060, 6060, 30);
    assert!(kinds
        .iter()
        .any(|k| matches!(k, CanvasEventKind::ReplyDelivered { .. })));
    assert_eq!(sim.chat().messages().len(), 3);
    assert_eq!(sim.chat().messages()[2].sender, CursorId(1));
    assert!(sim.chat().pending_reply().is_none());
}

#[test]
fn second_send_replaces_pending_reply() {
    let mut sim = lingering_pair();
    run_until(&mut sim, 0, 3030, 30);

    assert!(sim.send_message("one"));
    assert!(sim.send_message("two"));
    let kinds: Vec<_> = sim.take_events().into_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds
            .iter()
            .filter(|k| **k == CanvasEventKind::ReplyCancelled)
            .count(),
        1
    );

    run_until(&mut sim, 3060, 7000, 30);
    // greeting, two sends, exactly one reply
    assert_eq!(sim.chat().messages().len(), 4);
}

#[test]
fn closing_discards_history_and_cancels_reply() {
    let mut sim = lingering_pair();
    run_until(&mut sim, 0, 3030, 30);
    assert!(sim.send_message("hello"));

    assert!(sim.close_chat());
    assert_eq!(sim.chat().status(), ChatStatus::None);
    assert!(sim.chat().messages().is_empty());
    assert!(sim.chat().pending_reply().is_none());
    assert!(!sim.close_chat());

    let kinds = run_until(&mut sim, 3060, 8000, 30);
    assert!(kinds.contains(&CanvasEventKind::ReplyCancelled));
    assert!(kinds.contains(&CanvasEventKind::ChatClosed {
        partner: CursorId(1)
    }));
    assert!(!kinds
        .iter()
        .any(|k| matches!(k, CanvasEventKind::ReplyDelivered { .. })));
    // Same interaction is still running but the dismissed session stays closed
    assert_eq!(sim.chat().status(), ChatStatus::None);
    assert!(sim.chat().messages().is_empty());
}

#[test]
fn leaving_and_returning_reopens_a_closed_chat() {
    let mut sim = lingering_pair();
    run_until(&mut sim, 0, 3030, 30);
    assert!(sim.close_chat());

    sim.set_pointer(600.0, 600.0);
    sim.tick(at(3060));
    assert!(sim.interactions().is_empty());

    sim.set_pointer(120.0, 100.0);
    run_until(&mut sim, 3090, 6000, 30);
    assert_eq!(sim.chat().status(), ChatStatus::None);
    run_until(&mut sim, 6030, 6120, 30);
    assert_eq!(sim.chat().status(), ChatStatus::Started);
    assert_eq!(sim.chat().messages().len(), 1);
}

#[test]
fn open_session_pins_the_controlled_cursor() {
    let seeds = vec![
        CursorSeed::at(1, "Emma", Affinity::A, 100.0, 100.0),
        CursorSeed::at(2, "Olivia", Affinity::A, 400.0, 100.0),
    ];
    let mut sim = Simulation::from_seeds(tuning(), seeds).unwrap();
    sim.set_pointer(120.0, 100.0);
    run_until(&mut sim, 0, 3030, 30);
    assert_eq!(sim.chat().partner(), Some(CursorId(1)));

    // Next to 2 now, but the session with 1 is still open
    sim.set_pointer(420.0, 100.0);
    run_until(&mut sim, 3060, 7000, 30);
    let controlled = sim.controlled_id();
    assert_eq!(sim.interactions().partner_of(controlled), None);
    assert_eq!(sim.chat().partner(), Some(CursorId(1)));
}

#[test]
fn classic_roster_keeps_invariants_every_tick() {
    let mut sim = Simulation::new(tuning(), &mut ClassicRoster::default()).unwrap();
    let controlled = sim.controlled_id();
    let (max_x, max_y) = (970.0, 740.0);

    for tick in 0..2000u64 {
        // Sweep the pointer across the canvas
        let x = (tick as f32 * 3.0) % 1000.0;
        let y = (tick as f32 * 2.0) % 800.0;
        sim.set_pointer(x, y);
        if tick % 400 == 399 {
            sim.close_chat();
        }
        if tick % 150 == 0 {
            sim.send_message("hi");
        }
        sim.tick(at(tick * 30));

        assert!(sim.interactions().is_symmetric(), "asymmetric at tick {}", tick);

        let mapped: BTreeSet<PairKey> = sim.interactions().pairs().collect();
        let tracked: BTreeSet<PairKey> = sim.tracker().pairs().collect();
        assert_eq!(mapped, tracked, "tracker out of sync at tick {}", tick);

        let frame = sim.frame();
        for cursor in &frame.cursors {
            assert!(
                (0.0..=max_x).contains(&cursor.x) && (0.0..=max_y).contains(&cursor.y),
                "cursor {} out of bounds at tick {}",
                cursor.id,
                tick
            );
        }

        if let Some(partner) = sim.chat().partner() {
            let pinned = sim.interactions().partner_of(controlled);
            assert!(pinned.is_none() || pinned == Some(partner));
        }
    }
}

#[test]
fn teardown_cancels_pending_reply() {
    let mut sim = lingering_pair();
    run_until(&mut sim, 0, 3030, 30);
    assert!(sim.send_message("bye"));

    sim.teardown();
    assert!(sim.chat().pending_reply().is_none());
    let kinds = run_until(&mut sim, 3060, 8000, 30);
    assert!(kinds.is_empty());
    assert_eq!(sim.chat().messages().len(), 2);
    assert!(!sim.send_message("anyone?"));
}
