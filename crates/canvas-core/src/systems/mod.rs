//! ECS Systems
//!
//! All simulation systems for pointer input, proximity, interaction tracking,
//! chat escalation and motion, plus the tick schedule that chains them.

pub mod chat;
pub mod motion;
pub mod pointer;
pub mod proximity;
pub mod tracker;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;

// Re-export commonly used systems
pub use chat::{
    deliver_scripted_replies, trigger_chat, ChatSession, ChatState, Closed, Opened, Participant,
    PendingReply, Sent,
};
pub use motion::{attraction_step, integrate_motion, reflect_axis, step_cursor};
pub use pointer::apply_pointer_input;
pub use proximity::{
    apply_engagements, detect_interactions, resolve_interactions, ChatGate, CursorSample,
    InteractionMap,
};
pub use tracker::{track_interactions, InteractionTracker, TrackerChanges};

/// Build the per-tick schedule.
///
/// Detection reads tick-start positions; motion then uses the fresh map.
pub fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    // Ticks are strictly sequential
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            apply_pointer_input,
            detect_interactions,
            apply_engagements,
            track_interactions,
            trigger_chat,
            integrate_motion,
            deliver_scripted_replies,
        )
            .chain(),
    );
    schedule
}
