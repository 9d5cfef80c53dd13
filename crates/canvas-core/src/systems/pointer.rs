//! Pointer System
//!
//! Places the controlled cursor at the latest pointer sample.

use bevy_ecs::prelude::*;

use crate::components::canvas::{CanvasBounds, PointerInput};
use crate::components::cursor::{Controlled, Position, Velocity};

/// System to move the controlled cursor to the pointer. Runs first in the tick.
pub fn apply_pointer_input(
    pointer: Res<PointerInput>,
    bounds: Res<CanvasBounds>,
    mut query: Query<(&mut Position, &mut Velocity), With<Controlled>>,
) {
    for (mut position, mut velocity) in query.iter_mut() {
        if let Some(sample) = pointer.latest {
            *position = bounds.clamp(sample);
        }
        // Velocity is inert for the controlled cursor
        if *velocity != Velocity::default() {
            *velocity = Velocity::default();
        }
    }
}
