//! Cursor Components
//!
//! Components for individual cursors: identity, category, kinematics and the
//! transient interaction partner.

use bevy_ecs::prelude::*;
use canvas_events::{Affinity, CursorId};

/// Marker for the single cursor driven by the pointer instead of its velocity
#[derive(Component, Debug, Clone, Default)]
pub struct Controlled;

/// Stable identity of a cursor
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: CursorId,
    pub name: String,
    pub handle: String,
}

/// Category attributes
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    pub affinity: Affinity,
    /// Visual priority only; does not change simulation rules
    pub premium: bool,
}

/// Canvas-space position of the cursor's top-left corner
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Per-tick displacement. Always zero for the controlled cursor.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

impl Velocity {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// Partner the cursor is interacting with this tick, mirrored from the
/// interaction map
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Engagement {
    pub partner: Option<CursorId>,
}

impl Engagement {
    pub fn is_engaged(&self) -> bool {
        self.partner.is_some()
    }
}
