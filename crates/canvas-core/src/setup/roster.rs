//! Cursor Spawning
//!
//! The roster source that seeds the canvas once at startup, the default
//! generator with fixed name pools, and the functions that turn seeds into
//! ECS entities.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use canvas_events::{Affinity, CursorId};

use crate::components::canvas::CanvasBounds;
use crate::components::cursor::{Controlled, Engagement, Identity, Position, Profile, Velocity};
use crate::config::ControlledConfig;

/// Name pools for each category
const A_NAMES: &[&str] = &[
    "Emma", "Olivia", "Ava", "Sophia", "Isabella", "Charlotte", "Amelia", "Mia", "Harper",
    "Evelyn", "Luna", "Camila", "Sofia", "Aria", "Scarlett",
];

const B_NAMES: &[&str] = &[
    "Liam", "Noah", "Oliver", "Elijah", "William", "James", "Benjamin", "Lucas", "Henry",
    "Alexander", "Thomas", "Florian", "Ethan", "Daniel", "Michael",
];

/// Handle given to the premium cursor of the classic roster
const PREMIUM_HANDLE: &str = "Digidop";

/// Everything needed to spawn one simulated cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorSeed {
    pub id: CursorId,
    pub name: String,
    pub handle: String,
    pub affinity: Affinity,
    pub premium: bool,
    pub x: f32,
    pub y: f32,
    pub speed_x: f32,
    pub speed_y: f32,
}

impl CursorSeed {
    /// A stationary seed, mostly for tests and scripted scenes
    pub fn at(id: u32, name: &str, affinity: Affinity, x: f32, y: f32) -> Self {
        Self {
            id: CursorId(id),
            name: name.to_string(),
            handle: name.to_lowercase(),
            affinity,
            premium: false,
            x,
            y,
            speed_x: 0.0,
            speed_y: 0.0,
        }
    }

    pub fn with_speed(mut self, speed_x: f32, speed_y: f32) -> Self {
        self.speed_x = speed_x;
        self.speed_y = speed_y;
        self
    }

    pub fn premium(mut self) -> Self {
        self.premium = true;
        self
    }
}

/// Roster seeding errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("cursor id {0} appears more than once in the roster")]
    DuplicateId(CursorId),
}

/// Produces the initial cursors. Called exactly once per run.
pub trait RosterSource {
    fn generate(&mut self, bounds: &CanvasBounds, rng: &mut SmallRng) -> Vec<CursorSeed>;
}

/// Hands back a fixed list of seeds
#[derive(Debug, Clone, Default)]
pub struct FixedRoster {
    seeds: Vec<CursorSeed>,
}

impl FixedRoster {
    pub fn new(seeds: Vec<CursorSeed>) -> Self {
        Self { seeds }
    }
}

impl RosterSource for FixedRoster {
    fn generate(&mut self, _bounds: &CanvasBounds, _rng: &mut SmallRng) -> Vec<CursorSeed> {
        std::mem::take(&mut self.seeds)
    }
}

/// Default generator: seven category A cursors, three category B and one
/// premium category B, each with a unique name from its pool
#[derive(Debug, Clone)]
pub struct ClassicRoster {
    pub a_count: usize,
    pub b_count: usize,
    pub premium_count: usize,
}

impl Default for ClassicRoster {
    fn default() -> Self {
        Self {
            a_count: 7,
            b_count: 3,
            premium_count: 1,
        }
    }
}

/// Remove and return a random name from `pool`
fn take_name(pool: &mut Vec<&'static str>, rng: &mut SmallRng) -> String {
    if pool.is_empty() {
        return "Anonymous".to_string();
    }
    let index = rng.gen_range(0..pool.len());
    pool.swap_remove(index).to_string()
}

fn generate_handle(name: &str, rng: &mut SmallRng) -> String {
    format!("{}{}", name.to_lowercase(), rng.gen_range(0..1000))
}

/// Random spot away from the far edges
fn random_position(bounds: &CanvasBounds, rng: &mut SmallRng) -> (f32, f32) {
    let max_x = (bounds.width - 100.0).max(1.0);
    let max_y = (bounds.height - 100.0).max(1.0);
    (rng.gen_range(0.0..max_x), rng.gen_range(0.0..max_y))
}

/// Speed in `±[0.5, 2.0)` per axis
fn random_speed(rng: &mut SmallRng) -> f32 {
    let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    sign * (rng.gen::<f32>() * 1.5 + 0.5)
}

impl ClassicRoster {
    fn seed(
        id: u32,
        name: String,
        handle: String,
        affinity: Affinity,
        premium: bool,
        bounds: &CanvasBounds,
        rng: &mut SmallRng,
    ) -> CursorSeed {
        let (x, y) = random_position(bounds, rng);
        CursorSeed {
            id: CursorId(id),
            name,
            handle,
            affinity,
            premium,
            x,
            y,
            speed_x: random_speed(rng),
            speed_y: random_speed(rng),
        }
    }
}

impl RosterSource for ClassicRoster {
    fn generate(&mut self, bounds: &CanvasBounds, rng: &mut SmallRng) -> Vec<CursorSeed> {
        let mut a_pool: Vec<&'static str> = A_NAMES.to_vec();
        let mut b_pool: Vec<&'static str> = B_NAMES.to_vec();
        let mut seeds = Vec::with_capacity(self.a_count + self.b_count + self.premium_count);
        let mut next_id = 1;

        for _ in 0..self.a_count {
            let name = take_name(&mut a_pool, rng);
            let handle = generate_handle(&name, rng);
            seeds.push(Self::seed(next_id, name, handle, Affinity::A, false, bounds, rng));
            next_id += 1;
        }

        for _ in 0..self.b_count {
            let name = take_name(&mut b_pool, rng);
            let handle = generate_handle(&name, rng);
            seeds.push(Self::seed(next_id, name, handle, Affinity::B, false, bounds, rng));
            next_id += 1;
        }

        for _ in 0..self.premium_count {
            let name = take_name(&mut b_pool, rng);
            seeds.push(Self::seed(
                next_id,
                name,
                PREMIUM_HANDLE.to_string(),
                Affinity::B,
                true,
                bounds,
                rng,
            ));
            next_id += 1;
        }

        seeds
    }
}

/// Reject rosters that reuse an id
pub fn validate_seeds(seeds: &[CursorSeed]) -> Result<(), RosterError> {
    let mut seen = HashSet::new();
    for seed in seeds {
        if !seen.insert(seed.id) {
            return Err(RosterError::DuplicateId(seed.id));
        }
    }
    Ok(())
}

/// Spawn one simulated cursor
pub fn spawn_cursor(world: &mut World, seed: &CursorSeed, bounds: &CanvasBounds) -> Entity {
    world
        .spawn((
            Identity {
                id: seed.id,
                name: seed.name.clone(),
                handle: seed.handle.clone(),
            },
            Profile {
                affinity: seed.affinity,
                premium: seed.premium,
            },
            bounds.clamp(Position::new(seed.x, seed.y)),
            Velocity::new(seed.speed_x, seed.speed_y),
            Engagement::default(),
        ))
        .id()
}

/// Spawn the pointer-driven cursor with the next free id, at the canvas centre
pub fn spawn_controlled(
    world: &mut World,
    seeds: &[CursorSeed],
    profile: &ControlledConfig,
    bounds: &CanvasBounds,
) -> CursorId {
    let id = CursorId(seeds.iter().map(|s| s.id.0).max().unwrap_or(0) + 1);
    world.spawn((
        Controlled,
        Identity {
            id,
            name: profile.name.clone(),
            handle: profile.handle.clone(),
        },
        Profile {
            affinity: profile.affinity,
            premium: profile.premium,
        },
        bounds.center(),
        Velocity::default(),
        Engagement::default(),
    ));
    id
}

/// Validate and spawn the whole roster plus the controlled cursor
pub fn spawn_roster(
    world: &mut World,
    seeds: &[CursorSeed],
    controlled: &ControlledConfig,
    bounds: &CanvasBounds,
) -> Result<CursorId, RosterError> {
    validate_seeds(seeds)?;
    for seed in seeds {
        spawn_cursor(world, seed, bounds);
    }
    Ok(spawn_controlled(world, seeds, controlled, bounds))
}

/// Summary of spawned cursors
#[derive(Debug, Default)]
pub struct SpawnSummary {
    pub total: usize,
    pub category_a: usize,
    pub category_b: usize,
    pub premium: usize,
}

/// Count the cursors in the world by category
pub fn get_spawn_summary(world: &mut World) -> SpawnSummary {
    let mut summary = SpawnSummary::default();
    let mut query = world.query::<&Profile>();
    for profile in query.iter(world) {
        summary.total += 1;
        match profile.affinity {
            Affinity::A => summary.category_a += 1,
            Affinity::B => summary.category_b += 1,
        }
        if profile.premium {
            summary.premium += 1;
        }
    }
    summary
}
