//! Proximity System
//!
//! Works out which cursors interact this tick. Every unordered pair is
//! examined in ascending id order and the first qualifying pair claims both
//! sides; later pairs touching either side are skipped for the tick.

use bevy_ecs::prelude::*;
use bevy_ecs::query::Has;
use std::collections::BTreeMap;

use canvas_events::{Affinity, ChatStatus, CursorId, PairKey};

use crate::components::cursor::{Controlled, Engagement, Identity, Position, Profile};
use crate::config::Tuning;

use super::chat::ChatState;

/// Symmetric map from cursor to its current partner
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionMap {
    partners: BTreeMap<CursorId, CursorId>,
}

impl InteractionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `a` and `b` as partners of each other
    pub fn link(&mut self, a: CursorId, b: CursorId) {
        self.partners.insert(a, b);
        self.partners.insert(b, a);
    }

    pub fn partner_of(&self, id: CursorId) -> Option<CursorId> {
        self.partners.get(&id).copied()
    }

    pub fn is_engaged(&self, id: CursorId) -> bool {
        self.partners.contains_key(&id)
    }

    /// True if both directions of the pair are present
    pub fn contains_pair(&self, pair: PairKey) -> bool {
        self.partner_of(pair.low()) == Some(pair.high())
            && self.partner_of(pair.high()) == Some(pair.low())
    }

    /// Each linked pair once, in ascending order
    pub fn pairs(&self) -> impl Iterator<Item = PairKey> + '_ {
        self.partners
            .iter()
            .filter(|(a, b)| a < b)
            .map(|(a, b)| PairKey::new(*a, *b))
    }

    pub fn len(&self) -> usize {
        self.partners.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    /// `map[i] == j` implies `map[j] == i` for every entry
    pub fn is_symmetric(&self) -> bool {
        self.partners
            .iter()
            .all(|(a, b)| self.partners.get(b) == Some(a))
    }
}

/// What the detector needs to know about one cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorSample {
    pub id: CursorId,
    pub affinity: Affinity,
    pub controlled: bool,
    pub position: Position,
}

/// Chat state as seen by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChatGate {
    pub status: ChatStatus,
    /// Partner of the open session, if any
    pub partner: Option<CursorId>,
}

impl ChatGate {
    fn session_open(&self) -> bool {
        self.partner.is_some()
    }
}

/// Decide whether two in-range cursors may interact this tick.
fn pair_qualifies(a: &CursorSample, b: &CursorSample, gate: ChatGate) -> bool {
    let cross_category = a.affinity != b.affinity;

    let other = match (a.controlled, b.controlled) {
        (true, _) => b,
        (_, true) => a,
        _ => return cross_category,
    };

    if let Some(partner) = gate.partner {
        // An open session pins the controlled cursor to its partner
        return other.id == partner;
    }

    cross_category || (!gate.session_open() && gate.status == ChatStatus::None)
}

/// Build the interaction map for one tick.
///
/// `samples` may arrive in any order; pairs are resolved in ascending id order.
pub fn resolve_interactions(samples: &[CursorSample], range: f32, gate: ChatGate) -> InteractionMap {
    let mut ordered: Vec<&CursorSample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.id);

    let mut map = InteractionMap::new();

    for (i, a) in ordered.iter().enumerate() {
        for b in ordered.iter().skip(i + 1) {
            // A NaN distance is never in range
            let in_range = a.position.distance_to(&b.position) < range;
            if !in_range {
                continue;
            }
            if !pair_qualifies(a, b, gate) {
                continue;
            }
            // First found wins
            if map.is_engaged(a.id) || map.is_engaged(b.id) {
                continue;
            }
            map.link(a.id, b.id);
        }
    }

    map
}

/// System to rebuild the interaction map from tick-start positions
pub fn detect_interactions(
    tuning: Res<Tuning>,
    chat: Res<ChatState>,
    mut interactions: ResMut<InteractionMap>,
    query: Query<(&Identity, &Profile, &Position, Has<Controlled>)>,
) {
    let samples: Vec<CursorSample> = query
        .iter()
        .map(|(identity, profile, position, controlled)| CursorSample {
            id: identity.id,
            affinity: profile.affinity,
            controlled,
            position: *position,
        })
        .collect();

    let gate = ChatGate {
        status: chat.status(),
        partner: chat.partner(),
    };

    // Written once per tick
    *interactions = resolve_interactions(&samples, tuning.interaction.range, gate);
}

/// System to mirror the interaction map onto each cursor
pub fn apply_engagements(
    interactions: Res<InteractionMap>,
    mut query: Query<(&Identity, &mut Engagement)>,
) {
    for (identity, mut engagement) in query.iter_mut() {
        let partner = interactions.partner_of(identity.id);
        if engagement.partner != partner {
            engagement.partner = partner;
        }
    }
}
