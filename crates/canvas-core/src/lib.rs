//! Cursor Canvas Simulation Library
//!
//! Simulated cursors drifting over a canvas, proximity interactions between
//! them, and a scripted chat that opens when the pointer-driven cursor lingers
//! next to one of them.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod output;
pub mod runner;
pub mod setup;
pub mod simulation;
pub mod systems;

pub use components::*;
pub use config::{ConfigError, Tuning};
pub use error::CanvasError;
pub use runner::{RunnerError, RunnerHandle};
pub use setup::{ClassicRoster, CursorSeed, FixedRoster, RosterError, RosterSource};
pub use simulation::{Simulation, TickReport};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
