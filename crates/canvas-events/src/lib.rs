//! Shared data types for the cursor canvas.
//!
//! This crate contains pure data structures with no simulation logic.
//! The engine produces them every tick and presenters consume them.

pub mod event;
pub mod ids;
pub mod snapshot;
pub mod timestamp;

pub use event::{CanvasEvent, CanvasEventKind};
pub use ids::{Affinity, CursorId, PairKey};
pub use snapshot::{
    group_messages, CanvasFrame, ChatMessage, ChatSnapshot, ChatStatus, CursorSnapshot,
    InteractionSnapshot, MessageGroup, Tint,
};
pub use timestamp::SimTime;
