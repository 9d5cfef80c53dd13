//! Motion System
//!
//! Moves every simulated cursor once per tick and bounces it off the canvas
//! edges. Engaged cursors slow down; a cursor engaged with the controlled
//! cursor drifts toward it instead of following its velocity.

use bevy_ecs::prelude::*;
use std::collections::HashSet;

use canvas_events::CursorId;

use crate::components::canvas::CanvasBounds;
use crate::components::cursor::{Controlled, Engagement, Identity, Position, Velocity};
use crate::config::{InteractionConfig, Tuning};

/// Reflect one axis: returns the clamped coordinate and the possibly flipped speed.
///
/// A coordinate at or beyond either edge bounces.
pub fn reflect_axis(coordinate: f32, speed: f32, max: f32) -> (f32, f32) {
    if coordinate <= 0.0 || coordinate >= max {
        (coordinate.clamp(0.0, max), -speed)
    } else {
        (coordinate, speed)
    }
}

/// Step taken toward the controlled cursor, or `None` once close enough to hold
pub fn attraction_step(
    from: Position,
    target: Position,
    config: &InteractionConfig,
) -> Option<(f32, f32)> {
    let dx = target.x - from.x;
    let dy = target.y - from.y;
    if dx.hypot(dy) > config.hold_distance {
        Some((dx * config.attraction_rate, dy * config.attraction_rate))
    } else {
        None
    }
}

/// Candidate position before reflection
fn candidate_position(
    position: Position,
    velocity: Velocity,
    partner: Option<CursorId>,
    controlled: Option<(CursorId, Position)>,
    config: &InteractionConfig,
) -> Position {
    if let (Some(partner), Some((controlled_id, target))) = (partner, controlled) {
        if partner == controlled_id {
            return match attraction_step(position, target, config) {
                Some((dx, dy)) => Position::new(position.x + dx, position.y + dy),
                None => position,
            };
        }
    }

    let factor = if partner.is_some() {
        config.engaged_speed_factor
    } else {
        1.0
    };
    Position::new(
        position.x + velocity.dx * factor,
        position.y + velocity.dy * factor,
    )
}

/// Advance one simulated cursor and apply edge reflection
pub fn step_cursor(
    position: &mut Position,
    velocity: &mut Velocity,
    partner: Option<CursorId>,
    controlled: Option<(CursorId, Position)>,
    bounds: &CanvasBounds,
    config: &InteractionConfig,
) {
    let candidate = candidate_position(*position, *velocity, partner, controlled, config);

    let (x, dx) = reflect_axis(candidate.x, velocity.dx, bounds.max_x());
    let (y, dy) = reflect_axis(candidate.y, velocity.dy, bounds.max_y());

    *position = Position::new(x, y);
    *velocity = Velocity::new(dx, dy);
}

/// System to integrate motion for every cursor except the controlled one
pub fn integrate_motion(
    tuning: Res<Tuning>,
    bounds: Res<CanvasBounds>,
    identities: Query<&Identity>,
    controlled: Query<(&Identity, &Position), With<Controlled>>,
    mut cursors: Query<(&mut Position, &mut Velocity, &Engagement), Without<Controlled>>,
) {
    let known: HashSet<CursorId> = identities.iter().map(|identity| identity.id).collect();
    let target = controlled
        .iter()
        .next()
        .map(|(identity, position)| (identity.id, *position));

    for (mut position, mut velocity, engagement) in cursors.iter_mut() {
        // A partner that no longer resolves counts as no interaction
        let partner = engagement.partner.filter(|id| known.contains(id));
        step_cursor(
            &mut position,
            &mut velocity,
            partner,
            target,
            &bounds,
            &tuning.interaction,
        );
    }
}
