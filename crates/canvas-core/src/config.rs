//! Configuration System
//!
//! Loads tuning parameters from tuning.toml for easy adjustment without recompiling.
//! Every field has a default, so a partial file only overrides what it names.

use bevy_ecs::prelude::*;
use canvas_events::Affinity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::components::CanvasBounds;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Top-level configuration structure
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub canvas: CanvasConfig,
    pub simulation: SimulationConfig,
    pub interaction: InteractionConfig,
    pub chat: ChatConfig,
    pub controlled: ControlledConfig,
}

/// Canvas extents and cursor footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
    pub footprint_width: f32,
    pub footprint_height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            footprint_width: 30.0,
            footprint_height: 60.0,
        }
    }
}

impl CanvasConfig {
    pub fn bounds(&self) -> CanvasBounds {
        CanvasBounds::new(
            self.width,
            self.height,
            self.footprint_width,
            self.footprint_height,
        )
    }
}

/// Tick driver parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval_ms: u64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 30,
            seed: 42,
        }
    }
}

/// Proximity and motion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pairs closer than this (strictly) are in range
    pub range: f32,
    /// Velocity multiplier while a cursor has a partner
    pub engaged_speed_factor: f32,
    /// Fraction of the gap closed per tick when drifting toward the controlled cursor
    pub attraction_rate: f32,
    /// Drift stops once within this distance of the controlled cursor
    pub hold_distance: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            range: 80.0,
            engaged_speed_factor: 0.3,
            attraction_rate: 0.02,
            hold_distance: 40.0,
        }
    }
}

/// Chat escalation and scripted replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// A controlled pair must interact for longer than this to open a session
    pub trigger_after_ms: u64,
    pub reply_delay_min_ms: u64,
    /// Exclusive upper bound
    pub reply_delay_max_ms: u64,
    /// `{name}` is replaced with the partner's name
    pub greeting: String,
    pub replies: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            trigger_after_ms: 3000,
            reply_delay_min_ms: 1000,
            reply_delay_max_ms: 3000,
            greeting: "Hi there! I'm {name}. Nice to meet you!".to_string(),
            replies: default_replies(),
        }
    }
}

impl ChatConfig {
    pub fn greeting_for(&self, partner_name: &str) -> String {
        self.greeting.replace("{name}", partner_name)
    }
}

fn default_replies() -> Vec<String> {
    [
        "That's interesting! Tell me more.",
        "Haha, I totally get what you mean.",
        "I've been drifting around here all day.",
        "What brings you to this corner of the canvas?",
        "Do you come here often?",
        "I love meeting new people like this!",
        "Really? I had no idea.",
        "That sounds like fun!",
        "Sorry, I got distracted by a passing cursor.",
        "We should do this again sometime.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Profile of the pointer-driven cursor appended to the roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlledConfig {
    pub name: String,
    pub handle: String,
    pub affinity: Affinity,
    pub premium: bool,
}

impl Default for ControlledConfig {
    fn default() -> Self {
        Self {
            name: "You".to_string(),
            handle: "you".to_string(),
            affinity: Affinity::B,
            premium: true,
        }
    }
}

impl Tuning {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = toml::from_str(content)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", DEFAULT_TUNING_PATH, e);
            Self::default()
        })
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let canvas = &self.canvas;
        if canvas.width <= canvas.footprint_width || canvas.height <= canvas.footprint_height {
            return Err(ConfigError::Invalid(format!(
                "canvas {}x{} is smaller than the cursor footprint {}x{}",
                canvas.width, canvas.height, canvas.footprint_width, canvas.footprint_height
            )));
        }
        if self.interaction.range <= 0.0 {
            return Err(ConfigError::Invalid("interaction range must be positive".into()));
        }
        if self.chat.reply_delay_min_ms >= self.chat.reply_delay_max_ms {
            return Err(ConfigError::Invalid(format!(
                "reply delay range [{}, {}) is empty",
                self.chat.reply_delay_min_ms, self.chat.reply_delay_max_ms
            )));
        }
        if self.chat.replies.is_empty() {
            return Err(ConfigError::Invalid("reply pool is empty".into()));
        }
        if self.simulation.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick interval must be non-zero".into()));
        }
        Ok(())
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
