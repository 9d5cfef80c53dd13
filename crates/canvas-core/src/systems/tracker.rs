//! Interaction Tracking System
//!
//! Remembers when each live pair started interacting. A record lives exactly
//! as long as the pair stays in the interaction map; dropping out for a
//! single tick resets its duration.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use canvas_events::{CanvasEventKind, PairKey, SimTime};

use crate::components::canvas::SimClock;
use crate::events::PendingEvents;

use super::proximity::InteractionMap;

/// Resource mapping each live pair to the time it first came within range
#[derive(Resource, Debug, Default)]
pub struct InteractionTracker {
    started: HashMap<PairKey, SimTime>,
}

/// Pairs that appeared and disappeared during one sync
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TrackerChanges {
    pub started: Vec<PairKey>,
    /// Ended pairs with how long they lasted
    pub ended: Vec<(PairKey, u64)>,
}

impl InteractionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the records in line with `interactions` at time `now`
    pub fn sync(&mut self, interactions: &InteractionMap, now: SimTime) -> TrackerChanges {
        let mut changes = TrackerChanges::default();

        let mut ended: Vec<(PairKey, u64)> = self
            .started
            .iter()
            .filter(|(pair, _)| !interactions.contains_pair(**pair))
            .map(|(pair, since)| (*pair, now.saturating_since(*since)))
            .collect();
        ended.sort();
        for (pair, _) in &ended {
            self.started.remove(pair);
        }
        changes.ended = ended;

        for pair in interactions.pairs() {
            if !self.started.contains_key(&pair) {
                self.started.insert(pair, now);
                changes.started.push(pair);
            }
        }

        changes
    }

    pub fn started_at(&self, pair: PairKey) -> Option<SimTime> {
        self.started.get(&pair).copied()
    }

    /// How long `pair` has been interacting, 0 if it is not tracked
    pub fn duration(&self, pair: PairKey, now: SimTime) -> u64 {
        self.started_at(pair)
            .map(|since| now.saturating_since(since))
            .unwrap_or(0)
    }

    pub fn is_tracked(&self, pair: PairKey) -> bool {
        self.started.contains_key(&pair)
    }

    pub fn len(&self) -> usize {
        self.started.len()
    }

    pub fn is_empty(&self) -> bool {
        self.started.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = PairKey> + '_ {
        self.started.keys().copied()
    }
}

/// System to update interaction records after detection
pub fn track_interactions(
    clock: Res<SimClock>,
    interactions: Res<InteractionMap>,
    mut tracker: ResMut<InteractionTracker>,
    mut events: ResMut<PendingEvents>,
) {
    let changes = tracker.sync(&interactions, clock.now);

    for (pair, duration_ms) in changes.ended {
        tracing::debug!("Interaction {} ended after {}ms", pair, duration_ms);
        events.record(&clock, CanvasEventKind::InteractionEnded { pair, duration_ms });
    }
    for pair in changes.started {
        tracing::debug!("Interaction {} started at {}", pair, clock.now);
        events.record(&clock, CanvasEventKind::InteractionStarted { pair });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_events::CursorId;

    fn pair(a: u32, b: u32) -> PairKey {
        PairKey::new(CursorId(a), CursorId(b))
    }

    #[test]
    fn test_records_follow_the_map() {
        let mut tracker = InteractionTracker::new();
        let mut map = InteractionMap::new();
        map.link(CursorId(1), CursorId(2));

        let changes = tracker.sync(&map, SimTime::from_millis(100));
        assert_eq!(changes.started, vec![pair(1, 2)]);
        assert_eq!(tracker.started_at(pair(2, 1)), Some(SimTime::from_millis(100)));

        // Still interacting: start time is kept
        let changes = tracker.sync(&map, SimTime::from_millis(400));
        assert!(changes.started.is_empty());
        assert_eq!(tracker.duration(pair(1, 2), SimTime::from_millis(400)), 300);

        // Gone: record dropped with its final duration
        let changes = tracker.sync(&InteractionMap::new(), SimTime::from_millis(500));
        assert_eq!(changes.ended, vec![(pair(1, 2), 400)]);
        assert!(tracker.is_empty());
        assert_eq!(tracker.duration(pair(1, 2), SimTime::from_millis(500)), 0);
    }

    #[test]
    fn test_requalifying_resets_duration() {
        let mut tracker = InteractionTracker::new();
        let mut map = InteractionMap::new();
        map.link(CursorId(3), CursorId(4));

        tracker.sync(&map, SimTime::from_millis(0));
        tracker.sync(&InteractionMap::new(), SimTime::from_millis(30));
        tracker.sync(&map, SimTime::from_millis(60));

        assert_eq!(tracker.started_at(pair(3, 4)), Some(SimTime::from_millis(60)));
        assert_eq!(tracker.duration(pair(3, 4), SimTime::from_millis(60)), 0);
    }

    #[test]
    fn test_partner_swap_replaces_record() {
        let mut tracker = InteractionTracker::new();
        let mut first = InteractionMap::new();
        first.link(CursorId(1), CursorId(2));
        tracker.sync(&first, SimTime::ZERO);

        let mut second = InteractionMap::new();
        second.link(CursorId(1), CursorId(3));
        let changes = tracker.sync(&second, SimTime::from_millis(30));

        assert_eq!(changes.ended, vec![(pair(1, 2), 30)]);
        assert_eq!(changes.started, vec![pair(1, 3)]);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.is_tracked(pair(1, 3)));
    }
}
