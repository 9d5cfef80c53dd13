//! Event Types
//!
//! Everything the engine reports about a tick: interactions starting and
//! ending, chat sessions opening and closing, and message traffic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{CursorId, PairKey};
use crate::timestamp::SimTime;

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasEventKind {
    /// A pair came within range and qualified
    InteractionStarted { pair: PairKey },
    /// A pair stopped qualifying
    InteractionEnded { pair: PairKey, duration_ms: u64 },
    /// A chat session opened with `partner`, possibly replacing one with `replaced`
    ChatOpened {
        partner: CursorId,
        replaced: Option<CursorId>,
    },
    /// The user closed the session
    ChatClosed { partner: CursorId },
    /// The controlled cursor sent a message
    MessageSent { message_id: Uuid },
    /// A scripted reply was queued
    ReplyScheduled { due: SimTime },
    /// A queued reply was dropped before delivery
    ReplyCancelled,
    /// A scripted reply was appended to the session
    ReplyDelivered { message_id: Uuid },
}

/// A single event record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasEvent {
    /// Tick during which the event was recorded
    pub tick: u64,
    /// Simulation time of the event
    pub time: SimTime,
    #[serde(flatten)]
    pub kind: CanvasEventKind,
}

impl CanvasEvent {
    pub fn new(tick: u64, time: SimTime, kind: CanvasEventKind) -> Self {
        Self { tick, time, kind }
    }

    /// Serializes the event to a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// True for events that change the chat session lifecycle.
    pub fn is_chat_lifecycle(&self) -> bool {
        matches!(
            self.kind,
            CanvasEventKind::ChatOpened { .. } | CanvasEventKind::ChatClosed { .. }
        )
    }
}
