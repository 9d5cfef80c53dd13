//! Frame Types
//!
//! Per-tick output handed to the presentation layer: every cursor, every live
//! interaction and the chat session if one is open.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{Affinity, CursorId, PairKey};
use crate::timestamp::SimTime;

/// Colour family a presenter should use for a cursor and its name tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tint {
    /// Category A
    Pink,
    /// Category B
    LightBlue,
    /// Premium cursors, whatever their category
    Purple,
    /// Controlled cursor while a chat session is open
    Chatting,
}

impl Tint {
    pub fn for_cursor(affinity: Affinity, premium: bool, controlled_in_chat: bool) -> Self {
        if controlled_in_chat {
            Tint::Chatting
        } else if premium {
            Tint::Purple
        } else {
            match affinity {
                Affinity::A => Tint::Pink,
                Affinity::B => Tint::LightBlue,
            }
        }
    }
}

/// Cursor state at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub id: CursorId,
    pub name: String,
    pub handle: String,
    pub affinity: Affinity,
    pub premium: bool,
    pub controlled: bool,
    pub x: f32,
    pub y: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interacting_with: Option<CursorId>,
    /// True for both participants of the open chat session
    #[serde(default)]
    pub in_chat: bool,
    pub tint: Tint,
}

/// A live interaction and how long it has lasted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionSnapshot {
    pub pair: PairKey,
    pub since: SimTime,
    pub duration_ms: u64,
    /// Either side is premium; presenters draw these lines heavier
    pub premium: bool,
}

/// Chat session status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    /// No session
    #[default]
    None,
    /// Session open, user has not written yet
    Started,
    /// User has sent at least one message
    Active,
}

impl ChatStatus {
    pub fn is_open(self) -> bool {
        !matches!(self, ChatStatus::None)
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: CursorId,
    pub content: String,
    pub timestamp: SimTime,
}

impl ChatMessage {
    pub fn new(sender: CursorId, content: impl Into<String>, timestamp: SimTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            content: content.into(),
            timestamp,
        }
    }
}

/// The open chat session as a presenter sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSnapshot {
    pub status: ChatStatus,
    pub user_id: CursorId,
    pub partner_id: CursorId,
    pub user_name: String,
    pub partner_name: String,
    pub user_premium: bool,
    pub partner_premium: bool,
    pub started_at: SimTime,
    pub messages: Vec<ChatMessage>,
}

impl ChatSnapshot {
    /// Messages grouped into runs from the same sender.
    pub fn grouped(&self) -> Vec<MessageGroup<'_>> {
        group_messages(&self.messages, self.user_id)
    }
}

/// Consecutive messages from one sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageGroup<'a> {
    pub sender: CursorId,
    /// Sent by the controlled cursor
    pub from_user: bool,
    pub messages: Vec<&'a ChatMessage>,
}

impl MessageGroup<'_> {
    /// Timestamp shown under the group, taken from its last message.
    pub fn last_timestamp(&self) -> Option<SimTime> {
        self.messages.last().map(|m| m.timestamp)
    }
}

/// Splits `messages` into runs of consecutive messages with the same sender.
pub fn group_messages(messages: &[ChatMessage], user_id: CursorId) -> Vec<MessageGroup<'_>> {
    let mut groups: Vec<MessageGroup<'_>> = Vec::new();

    for message in messages {
        if let Some(group) = groups.last_mut().filter(|g| g.sender == message.sender) {
            group.messages.push(message);
            continue;
        }
        groups.push(MessageGroup {
            sender: message.sender,
            from_user: message.sender == user_id,
            messages: vec![message],
        });
    }

    groups
}

/// Everything a presenter needs to draw one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasFrame {
    pub tick: u64,
    pub time: SimTime,
    pub cursors: Vec<CursorSnapshot>,
    pub interactions: Vec<InteractionSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatSnapshot>,
}

impl CanvasFrame {
    pub fn cursor(&self, id: CursorId) -> Option<&CursorSnapshot> {
        self.cursors.iter().find(|c| c.id == id)
    }

    pub fn chat_status(&self) -> ChatStatus {
        self.chat.as_ref().map(|c| c.status).unwrap_or_default()
    }
}
