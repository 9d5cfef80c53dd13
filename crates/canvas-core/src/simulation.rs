//! Simulation Session
//!
//! Owns the ECS world and the tick schedule. Hosts feed it pointer samples,
//! chat commands and wall-clock times; it hands back the events of each tick
//! and frames for rendering.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use canvas_events::{CanvasEvent, CanvasEventKind, CanvasFrame, CursorId, SimTime};

use crate::components::canvas::{CanvasBounds, PointerInput, SimClock};
use crate::components::cursor::{Identity, Position};
use crate::config::Tuning;
use crate::error::CanvasError;
use crate::events::PendingEvents;
use crate::output::generate_frame;
use crate::setup::{get_spawn_summary, spawn_roster, CursorSeed, RosterSource};
use crate::systems::{tick_schedule, ChatState, InteractionMap, InteractionTracker};
use crate::SimRng;

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    pub time: SimTime,
    pub events: Vec<CanvasEvent>,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.events.is_empty()
    }
}

pub struct Simulation {
    world: World,
    schedule: Schedule,
    controlled: CursorId,
    torn_down: bool,
}

impl Simulation {
    /// Seed the canvas from `roster` and spawn the controlled cursor
    pub fn new(tuning: Tuning, roster: &mut impl RosterSource) -> Result<Self, CanvasError> {
        tuning.validate()?;
        let bounds = tuning.canvas.bounds();
        let mut rng = SmallRng::seed_from_u64(tuning.simulation.seed);
        let seeds = roster.generate(&bounds, &mut rng);
        Self::assemble(tuning, &seeds, rng)
    }

    /// Start from an explicit seed list
    pub fn from_seeds(tuning: Tuning, seeds: Vec<CursorSeed>) -> Result<Self, CanvasError> {
        tuning.validate()?;
        let rng = SmallRng::seed_from_u64(tuning.simulation.seed);
        Self::assemble(tuning, &seeds, rng)
    }

    fn assemble(tuning: Tuning, seeds: &[CursorSeed], rng: SmallRng) -> Result<Self, CanvasError> {
        let bounds = tuning.canvas.bounds();
        let mut world = World::new();

        let controlled = spawn_roster(&mut world, seeds, &tuning.controlled, &bounds)?;

        world.insert_resource(bounds);
        world.insert_resource(SimClock::default());
        world.insert_resource(PointerInput::default());
        world.insert_resource(InteractionMap::new());
        world.insert_resource(InteractionTracker::new());
        world.insert_resource(ChatState::default());
        world.insert_resource(PendingEvents::new());
        world.insert_resource(SimRng(rng));
        world.insert_resource(tuning);

        let summary = get_spawn_summary(&mut world);
        tracing::info!(
            "Spawned {} cursors ({} A, {} B, {} premium), controlled cursor {}",
            summary.total,
            summary.category_a,
            summary.category_b,
            summary.premium,
            controlled
        );

        Ok(Self {
            world,
            schedule: tick_schedule(),
            controlled,
            torn_down: false,
        })
    }

    /// Run one tick at wall-clock time `now`. A no-op after teardown.
    pub fn tick(&mut self, now: SimTime) -> TickReport {
        if self.torn_down {
            let clock = self.clock();
            return TickReport {
                tick: clock.tick,
                time: clock.now,
                events: Vec::new(),
            };
        }

        self.world.resource_mut::<SimClock>().advance_to(now);
        self.schedule.run(&mut self.world);
        self.pending_report()
    }

    /// Record a pointer sample; only the latest one before a tick is used
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        if !self.world.resource_mut::<PointerInput>().record(x, y) {
            tracing::debug!("Ignoring pointer sample ({}, {})", x, y);
        }
    }

    /// Change the canvas size. Cursors outside the new extents are pulled back in.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        let current = *self.world.resource::<CanvasBounds>();
        let fits = width.is_finite()
            && height.is_finite()
            && width > current.footprint_width
            && height > current.footprint_height;
        if !fits {
            tracing::warn!("Ignoring resize to {}x{}", width, height);
            return false;
        }

        let bounds = CanvasBounds::new(width, height, current.footprint_width, current.footprint_height);
        self.world.insert_resource(bounds);
        {
            let mut tuning = self.world.resource_mut::<Tuning>();
            tuning.canvas.width = width;
            tuning.canvas.height = height;
        }

        let mut positions = self.world.query::<&mut Position>();
        for mut position in positions.iter_mut(&mut self.world) {
            if !bounds.contains(&position) {
                *position = bounds.clamp(*position);
            }
        }
        tracing::debug!("Canvas resized to {}x{}", width, height);
        true
    }

    /// Move cursor `id` directly, clamped to the canvas. False if no such cursor
    /// or the coordinates are not finite.
    pub fn place(&mut self, id: CursorId, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        let bounds = *self.world.resource::<CanvasBounds>();
        let mut query = self.world.query::<(&Identity, &mut Position)>();
        for (identity, mut position) in query.iter_mut(&mut self.world) {
            if identity.id == id {
                *position = bounds.clamp(Position::new(x, y));
                return true;
            }
        }
        false
    }

    /// Send a message from the controlled cursor. False when nothing was sent.
    pub fn send_message(&mut self, text: &str) -> bool {
        if self.torn_down {
            return false;
        }
        let clock = self.clock();
        let config = self.world.resource::<Tuning>().chat.clone();

        let sent = self
            .world
            .resource_scope(|world, mut chat: Mut<ChatState>| {
                let mut rng = world.resource_mut::<SimRng>();
                chat.send(text, clock.now, &config, &mut rng.0)
            });
        let Some(sent) = sent else {
            return false;
        };

        tracing::trace!("Reply scheduled for {}", sent.reply_due);
        let mut events = self.world.resource_mut::<PendingEvents>();
        if sent.cancelled_reply {
            events.record(&clock, CanvasEventKind::ReplyCancelled);
        }
        events.record(
            &clock,
            CanvasEventKind::MessageSent {
                message_id: sent.message_id,
            },
        );
        events.record(&clock, CanvasEventKind::ReplyScheduled { due: sent.reply_due });
        true
    }

    /// Close the open chat session. False when none was open.
    pub fn close_chat(&mut self) -> bool {
        let clock = self.clock();
        let Some(closed) = self.world.resource_mut::<ChatState>().close() else {
            return false;
        };

        tracing::info!("Chat with {} closed at {}", closed.partner, clock.now);
        let mut events = self.world.resource_mut::<PendingEvents>();
        if closed.cancelled_reply {
            events.record(&clock, CanvasEventKind::ReplyCancelled);
        }
        events.record(
            &clock,
            CanvasEventKind::ChatClosed {
                partner: closed.partner,
            },
        );
        true
    }

    /// Cancel any pending reply and stop ticking
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let clock = self.clock();
        if self.world.resource_mut::<ChatState>().teardown() {
            tracing::trace!("Pending reply cancelled at teardown");
            self.world
                .resource_mut::<PendingEvents>()
                .record(&clock, CanvasEventKind::ReplyCancelled);
        }
        tracing::info!("Simulation stopped after {} ticks", clock.tick);
    }

    /// Events recorded outside a tick (sends, closes, teardown) not yet reported
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        self.world.resource_mut::<PendingEvents>().drain()
    }

    /// Unreported events, stamped with the current tick
    pub fn pending_report(&mut self) -> TickReport {
        let clock = self.clock();
        TickReport {
            tick: clock.tick,
            time: clock.now,
            events: self.take_events(),
        }
    }

    pub fn frame(&mut self) -> CanvasFrame {
        generate_frame(&mut self.world)
    }

    pub fn interactions(&self) -> &InteractionMap {
        self.world.resource::<InteractionMap>()
    }

    pub fn tracker(&self) -> &InteractionTracker {
        self.world.resource::<InteractionTracker>()
    }

    pub fn chat(&self) -> &ChatState {
        self.world.resource::<ChatState>()
    }

    pub fn tuning(&self) -> &Tuning {
        self.world.resource::<Tuning>()
    }

    pub fn controlled_id(&self) -> CursorId {
        self.controlled
    }

    pub fn clock(&self) -> SimClock {
        *self.world.resource::<SimClock>()
    }

    pub fn now(&self) -> SimTime {
        self.clock().now
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Position of cursor `id`, if it exists
    pub fn position_of(&mut self, id: CursorId) -> Option<Position> {
        let mut query = self.world.query::<(&Identity, &Position)>();
        query
            .iter(&self.world)
            .find(|(identity, _)| identity.id == id)
            .map(|(_, position)| *position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::FixedRoster;
    use canvas_events::{Affinity, ChatStatus};

    fn tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.canvas.width = 1000.0;
        tuning.canvas.height = 800.0;
        tuning
    }

    #[test]
    fn test_new_appends_controlled_cursor() {
        let mut roster = FixedRoster::new(vec![
            CursorSeed::at(1, "Emma", Affinity::A, 10.0, 10.0),
            CursorSeed::at(2, "Liam", Affinity::B, 500.0, 10.0),
        ]);
        let mut sim = Simulation::new(tuning(), &mut roster).unwrap();

        assert_eq!(sim.controlled_id(), CursorId(3));
        assert_eq!(sim.frame().cursors.len(), 3);
        assert_eq!(sim.clock().tick, 0);
    }

    #[test]
    fn test_duplicate_seed_ids_fail() {
        let seeds = vec![
            CursorSeed::at(1, "Emma", Affinity::A, 10.0, 10.0),
            CursorSeed::at(1, "Liam", Affinity::B, 500.0, 10.0),
        ];
        assert!(matches!(
            Simulation::from_seeds(tuning(), seeds),
            Err(CanvasError::Roster(_))
        ));
    }

    #[test]
    fn test_invalid_tuning_fails() {
        let mut bad = tuning();
        bad.chat.replies.clear();
        assert!(matches!(
            Simulation::from_seeds(bad, Vec::new()),
            Err(CanvasError::Config(_))
        ));
    }

    #[test]
    fn test_send_and_close_without_session_are_noops() {
        let mut sim = Simulation::from_seeds(tuning(), Vec::new()).unwrap();
        sim.tick(SimTime::from_millis(0));

        assert!(!sim.send_message("hello"));
        assert!(!sim.close_chat());
        assert!(sim.take_events().is_empty());
        assert_eq!(sim.chat().status(), ChatStatus::None);
    }

    #[test]
    fn test_place_and_resize_clamp() {
        let seeds = vec![CursorSeed::at(1, "Emma", Affinity::A, 900.0, 700.0)];
        let mut sim = Simulation::from_seeds(tuning(), seeds).unwrap();

        assert!(sim.place(CursorId(1), 5000.0, -20.0));
        assert_eq!(sim.position_of(CursorId(1)), Some(Position::new(970.0, 0.0)));
        assert!(!sim.place(CursorId(42), 0.0, 0.0));

        assert!(sim.resize(500.0, 400.0));
        assert_eq!(sim.position_of(CursorId(1)), Some(Position::new(470.0, 0.0)));
        assert!(!sim.resize(10.0, 400.0));
    }

    #[test]
    fn test_non_finite_coordinates_are_rejected() {
        let seeds = vec![CursorSeed::at(1, "Emma", Affinity::A, 300.0, 200.0)];
        let mut sim = Simulation::from_seeds(tuning(), seeds).unwrap();

        assert!(!sim.place(CursorId(1), f32::NAN, 10.0));
        assert!(!sim.place(CursorId(1), 10.0, f32::INFINITY));
        assert_eq!(sim.position_of(CursorId(1)), Some(Position::new(300.0, 200.0)));

        assert!(!sim.resize(f32::NAN, 400.0));
        assert!(!sim.resize(800.0, f32::INFINITY));
        assert_eq!(sim.tuning().canvas.width, tuning().canvas.width);

        let controlled = sim.controlled_id();
        let centre = sim.position_of(controlled);
        sim.set_pointer(f32::NAN, f32::NAN);
        sim.tick(SimTime::from_millis(0));
        assert_eq!(sim.position_of(controlled), centre);
    }

    #[test]
    fn test_teardown_events_land_in_pending_report() {
        let mut sim = Simulation::from_seeds(tuning(), Vec::new()).unwrap();
        sim.tick(SimTime::from_millis(30));
        sim.teardown();

        let report = sim.pending_report();
        assert_eq!(report.tick, 1);
        assert_eq!(report.time, SimTime::from_millis(30));
        assert!(report.is_quiet());
    }

    #[test]
    fn test_tick_after_teardown_is_inert() {
        let seeds = vec![CursorSeed::at(1, "Emma", Affinity::A, 100.0, 100.0).with_speed(2.0, 0.0)];
        let mut sim = Simulation::from_seeds(tuning(), seeds).unwrap();
        sim.tick(SimTime::from_millis(0));
        sim.teardown();

        let report = sim.tick(SimTime::from_millis(30));
        assert_eq!(report.tick, 1);
        assert!(report.is_quiet());
        assert_eq!(sim.position_of(CursorId(1)), Some(Position::new(102.0, 100.0)));
        assert!(sim.is_torn_down());
    }
}
