//! Frame Generation
//!
//! Collects cursors, live interactions and the chat session into a
//! `CanvasFrame` after each tick.

use bevy_ecs::prelude::*;
use bevy_ecs::query::Has;
use std::collections::HashMap;

use canvas_events::{CanvasFrame, CursorId, CursorSnapshot, InteractionSnapshot, Tint};

use crate::components::canvas::SimClock;
use crate::components::cursor::{Controlled, Identity, Position, Profile, Velocity};
use crate::systems::chat::ChatState;
use crate::systems::proximity::InteractionMap;
use crate::systems::tracker::InteractionTracker;

/// Build a frame from the current world state
pub fn generate_frame(world: &mut World) -> CanvasFrame {
    let mut query =
        world.query::<(&Identity, &Profile, &Position, &Velocity, Has<Controlled>)>();
    let rows: Vec<_> = query
        .iter(world)
        .map(|(identity, profile, position, velocity, controlled)| {
            (identity.clone(), *profile, *position, *velocity, controlled)
        })
        .collect();

    let clock = *world.resource::<SimClock>();
    let interactions = world.resource::<InteractionMap>();
    let tracker = world.resource::<InteractionTracker>();
    let chat = world.resource::<ChatState>();
    let chat_partner = chat.partner();
    let chat_open = chat.is_open();

    let mut cursors: Vec<CursorSnapshot> = rows
        .into_iter()
        .map(|(identity, profile, position, velocity, controlled)| {
            let in_chat = (controlled && chat_open) || chat_partner == Some(identity.id);
            CursorSnapshot {
                interacting_with: interactions.partner_of(identity.id),
                tint: Tint::for_cursor(profile.affinity, profile.premium, controlled && chat_open),
                id: identity.id,
                name: identity.name,
                handle: identity.handle,
                affinity: profile.affinity,
                premium: profile.premium,
                controlled,
                x: position.x,
                y: position.y,
                speed_x: velocity.dx,
                speed_y: velocity.dy,
                in_chat,
            }
        })
        .collect();
    cursors.sort_by_key(|cursor| cursor.id);

    let premium: HashMap<CursorId, bool> =
        cursors.iter().map(|cursor| (cursor.id, cursor.premium)).collect();
    let is_premium = |id: CursorId| premium.get(&id).copied().unwrap_or(false);

    let interactions = interactions
        .pairs()
        .map(|pair| InteractionSnapshot {
            pair,
            since: tracker.started_at(pair).unwrap_or(clock.now),
            duration_ms: tracker.duration(pair, clock.now),
            premium: is_premium(pair.low()) || is_premium(pair.high()),
        })
        .collect();

    CanvasFrame {
        tick: clock.tick,
        time: clock.now,
        cursors,
        interactions,
        chat: chat.session().map(|session| session.snapshot()),
    }
}
