//! Canvas Resources
//!
//! Canvas extents, the simulation clock and the latest pointer sample.

use bevy_ecs::prelude::*;
use canvas_events::SimTime;

use super::cursor::Position;

/// Canvas size and the cursor footprint subtracted from it
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CanvasBounds {
    pub width: f32,
    pub height: f32,
    pub footprint_width: f32,
    pub footprint_height: f32,
}

impl CanvasBounds {
    pub fn new(width: f32, height: f32, footprint_width: f32, footprint_height: f32) -> Self {
        Self {
            width,
            height,
            footprint_width,
            footprint_height,
        }
    }

    /// Largest x a cursor may occupy
    pub fn max_x(&self) -> f32 {
        (self.width - self.footprint_width).max(0.0)
    }

    /// Largest y a cursor may occupy
    pub fn max_y(&self) -> f32 {
        (self.height - self.footprint_height).max(0.0)
    }

    pub fn center(&self) -> Position {
        Position::new(self.max_x() / 2.0, self.max_y() / 2.0)
    }

    pub fn contains(&self, position: &Position) -> bool {
        (0.0..=self.max_x()).contains(&position.x) && (0.0..=self.max_y()).contains(&position.y)
    }

    pub fn clamp(&self, position: Position) -> Position {
        Position::new(
            position.x.clamp(0.0, self.max_x()),
            position.y.clamp(0.0, self.max_y()),
        )
    }
}

/// Simulation clock, advanced once per tick
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimClock {
    pub tick: u64,
    pub now: SimTime,
}

impl SimClock {
    pub fn advance_to(&mut self, now: SimTime) {
        self.tick += 1;
        // The timeline never runs backwards
        self.now = self.now.max(now);
    }
}

/// Most recent pointer sample; intermediate samples between ticks are dropped
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PointerInput {
    pub latest: Option<Position>,
}

impl PointerInput {
    /// Keep the sample unless a coordinate is NaN or infinite. Returns whether it was kept.
    pub fn record(&mut self, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        self.latest = Some(Position::new(x, y));
        true
    }
}
