//! Chat System
//!
//! Escalates a long interaction with the controlled cursor into a chat session
//! and runs the session state machine:
//!
//! ```text
//! none ──(interaction > trigger_after_ms)──▶ started ──(user sends)──▶ active
//!   ▲                                           │                         │
//!   └───────────────────(close)─────────────────┴─────────────────────────┘
//! ```
//!
//! Scripted replies are deferred entries on the simulation timeline. At most
//! one is pending; opening, closing or sending cancels the stale one.

use bevy_ecs::prelude::*;
use bevy_ecs::query::Has;
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use canvas_events::{CanvasEventKind, ChatMessage, ChatSnapshot, ChatStatus, CursorId, PairKey, SimTime};

use crate::components::canvas::SimClock;
use crate::components::cursor::{Controlled, Identity, Profile};
use crate::config::{ChatConfig, Tuning};
use crate::events::PendingEvents;
use crate::SimRng;

use super::proximity::InteractionMap;
use super::tracker::InteractionTracker;

/// One side of a chat session, cached when the session opens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: CursorId,
    pub name: String,
    pub premium: bool,
}

impl Participant {
    pub fn from_cursor(identity: &Identity, profile: &Profile) -> Self {
        Self {
            id: identity.id,
            name: identity.name.clone(),
            premium: profile.premium,
        }
    }
}

/// An open chat session between the controlled cursor and its partner
#[derive(Debug, Clone)]
pub struct ChatSession {
    user: Participant,
    partner: Participant,
    started_at: SimTime,
    /// Tracker start time of the interaction that opened the session
    interaction_since: SimTime,
    status: ChatStatus,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn user(&self) -> &Participant {
        &self.user
    }

    pub fn partner(&self) -> &Participant {
        &self.partner
    }

    pub fn started_at(&self) -> SimTime {
        self.started_at
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages are stamped strictly after the previous one
    fn next_stamp(&self, now: SimTime) -> SimTime {
        match self.messages.last() {
            Some(last) => now.max(last.timestamp.plus_millis(1)),
            None => now,
        }
    }

    fn append(&mut self, sender: CursorId, content: String, now: SimTime) -> Uuid {
        let message = ChatMessage::new(sender, content, self.next_stamp(now));
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            status: self.status,
            user_id: self.user.id,
            partner_id: self.partner.id,
            user_name: self.user.name.clone(),
            partner_name: self.partner.name.clone(),
            user_premium: self.user.premium,
            partner_premium: self.partner.premium,
            started_at: self.started_at,
            messages: self.messages.clone(),
        }
    }
}

/// A scripted reply waiting for its delay to elapse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReply {
    pub due: SimTime,
}

/// A closed interaction that must not reopen a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dismissal {
    pair: PairKey,
    since: SimTime,
}

/// Result of opening a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opened {
    pub replaced: Option<CursorId>,
    pub cancelled_reply: bool,
}

/// Result of an accepted user message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sent {
    pub message_id: Uuid,
    pub reply_due: SimTime,
    pub cancelled_reply: bool,
}

/// Result of closing a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed {
    pub partner: CursorId,
    pub cancelled_reply: bool,
}

/// Resource holding the chat session, its pending reply and the last dismissal
#[derive(Resource, Debug, Default)]
pub struct ChatState {
    session: Option<ChatSession>,
    pending_reply: Option<PendingReply>,
    dismissed: Option<Dismissal>,
}

impl ChatState {
    pub fn status(&self) -> ChatStatus {
        self.session
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(ChatStatus::None)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    /// Partner of the open session
    pub fn partner(&self) -> Option<CursorId> {
        self.session.as_ref().map(|s| s.partner.id)
    }

    pub fn pending_reply(&self) -> Option<PendingReply> {
        self.pending_reply
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.session
            .as_ref()
            .map(|s| s.messages.as_slice())
            .unwrap_or(&[])
    }

    /// True if the interaction that started at `since` was closed by the user
    pub fn is_dismissed(&self, pair: PairKey, since: SimTime) -> bool {
        self.dismissed == Some(Dismissal { pair, since })
    }

    fn cancel_reply(&mut self) -> bool {
        self.pending_reply.take().is_some()
    }

    /// Open a session with `partner`, replacing any session already open.
    ///
    /// The new session starts with the partner's greeting.
    pub fn open(
        &mut self,
        user: Participant,
        partner: Participant,
        interaction_since: SimTime,
        now: SimTime,
        greeting: String,
    ) -> Opened {
        let cancelled_reply = self.cancel_reply();
        let replaced = self.session.take().map(|old| old.partner.id);

        let mut session = ChatSession {
            user,
            partner,
            started_at: now,
            interaction_since,
            status: ChatStatus::Started,
            messages: Vec::new(),
        };
        let partner_id = session.partner.id;
        session.append(partner_id, greeting, now);
        self.session = Some(session);
        self.dismissed = None;

        Opened {
            replaced,
            cancelled_reply,
        }
    }

    /// Send a message from the controlled cursor and schedule the partner's reply.
    ///
    /// Whitespace-only text, or no open session, is a silent no-op.
    pub fn send(
        &mut self,
        text: &str,
        now: SimTime,
        config: &ChatConfig,
        rng: &mut impl Rng,
    ) -> Option<Sent> {
        if text.trim().is_empty() {
            return None;
        }
        let session = self.session.as_mut()?;

        let user_id = session.user.id;
        let message_id = session.append(user_id, text.to_string(), now);
        if session.status == ChatStatus::Started {
            session.status = ChatStatus::Active;
        }

        let cancelled_reply = self.cancel_reply();
        let delay = rng.gen_range(config.reply_delay_min_ms..config.reply_delay_max_ms);
        let reply_due = now.plus_millis(delay);
        self.pending_reply = Some(PendingReply { due: reply_due });

        Some(Sent {
            message_id,
            reply_due,
            cancelled_reply,
        })
    }

    /// Close the open session, discarding its history and any pending reply
    pub fn close(&mut self) -> Option<Closed> {
        let session = self.session.take()?;
        let cancelled_reply = self.cancel_reply();
        self.dismissed = Some(Dismissal {
            pair: PairKey::new(session.user.id, session.partner.id),
            since: session.interaction_since,
        });
        Some(Closed {
            partner: session.partner.id,
            cancelled_reply,
        })
    }

    /// Append the pending reply if it is due. Returns the new message id.
    pub fn deliver_due(
        &mut self,
        now: SimTime,
        replies: &[String],
        rng: &mut impl Rng,
    ) -> Option<Uuid> {
        let pending = self.pending_reply?;
        if now < pending.due {
            return None;
        }
        self.pending_reply = None;

        let session = self.session.as_mut()?;
        let line = replies.choose(rng)?.clone();
        let partner_id = session.partner.id;
        Some(session.append(partner_id, line, now))
    }

    /// Drop any pending reply. Used when the simulation shuts down.
    pub fn teardown(&mut self) -> bool {
        self.cancel_reply()
    }
}

/// System to open a session once the controlled cursor's interaction lasts long enough
pub fn trigger_chat(
    clock: Res<SimClock>,
    tuning: Res<Tuning>,
    interactions: Res<InteractionMap>,
    tracker: Res<InteractionTracker>,
    mut chat: ResMut<ChatState>,
    mut events: ResMut<PendingEvents>,
    query: Query<(&Identity, &Profile, Has<Controlled>)>,
) {
    let Some((user_identity, user_profile, _)) = query.iter().find(|(_, _, controlled)| *controlled)
    else {
        return;
    };
    let Some(partner_id) = interactions.partner_of(user_identity.id) else {
        return;
    };
    if chat.partner() == Some(partner_id) {
        return;
    }

    let pair = PairKey::new(user_identity.id, partner_id);
    let Some(since) = tracker.started_at(pair) else {
        return;
    };
    if tracker.duration(pair, clock.now) <= tuning.chat.trigger_after_ms {
        return;
    }
    if chat.is_dismissed(pair, since) {
        return;
    }

    // A partner that no longer resolves counts as no interaction
    let Some((partner_identity, partner_profile, _)) =
        query.iter().find(|(identity, _, _)| identity.id == partner_id)
    else {
        return;
    };

    let user = Participant::from_cursor(user_identity, user_profile);
    let partner = Participant::from_cursor(partner_identity, partner_profile);
    let greeting = tuning.chat.greeting_for(&partner.name);
    let opened = chat.open(user, partner, since, clock.now, greeting);

    match opened.replaced {
        Some(previous) => tracing::info!(
            "Chat with {} replaced by chat with {} at {}",
            previous,
            partner_id,
            clock.now
        ),
        None => tracing::info!("Chat opened with {} at {}", partner_id, clock.now),
    }
    if opened.cancelled_reply {
        events.record(&clock, CanvasEventKind::ReplyCancelled);
    }
    events.record(
        &clock,
        CanvasEventKind::ChatOpened {
            partner: partner_id,
            replaced: opened.replaced,
        },
    );
}

/// System to append scripted replies whose delay has elapsed
pub fn deliver_scripted_replies(
    clock: Res<SimClock>,
    tuning: Res<Tuning>,
    mut rng: ResMut<SimRng>,
    mut chat: ResMut<ChatState>,
    mut events: ResMut<PendingEvents>,
) {
    if chat.pending_reply().is_none() {
        return;
    }
    if let Some(message_id) = chat.deliver_due(clock.now, &tuning.chat.replies, &mut rng.0) {
        tracing::trace!("Scripted reply {} delivered at {}", message_id, clock.now);
        events.record(&clock, CanvasEventKind::ReplyDelivered { message_id });
    }
}
