//! Typed message model exchanged over a room connection.
//!
//! Wire envelopes are decoded into these types at the protocol boundary
//! (`infrastructure::dto::conversion`); nothing past that point touches
//! untyped JSON except the pass-through `RoomUpdate::Custom` payload.

use serde_json::{Map, Value};

use super::value_object::{Difficulty, ParticipantId, ProblemId, RoomId, Timestamp};

/// Chat line relayed verbatim between participants. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: String,
    pub content: String,
    pub timestamp: Timestamp,
}

/// Lobby setting changes that are persisted on the room record.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingChange {
    Difficulty(Difficulty),
    TimeLimit(u32),
    Problem(ProblemId),
    RandomProblem(bool),
}

/// Client-originated room update.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomUpdate {
    Setting(SettingChange),
    /// Any other client update type: relayed to the room, not persisted.
    Custom {
        kind: String,
        data: Map<String, Value>,
    },
}

/// Decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Authorization { token: String },
    Chat(ChatMessage),
    Room {
        timestamp: Timestamp,
        update: RoomUpdate,
    },
}

/// Server-originated notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    UserJoin {
        participant: ParticipantId,
        display_name: String,
    },
    UserLeave {
        participant: ParticipantId,
        display_name: String,
    },
    LaunchGame {
        problem: ProblemId,
        time_limit_minutes: u32,
        total_cases: u32,
    },
    CodeSubmitResult {
        participant: ParticipantId,
        score: u32,
        leader: Option<ParticipantId>,
        leader_score: u32,
    },
    GameOver {
        winner: Option<ParticipantId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundPayload {
    Chat(ChatMessage),
    RoomUpdate(RoomUpdate),
    Event(RoomEvent),
}

/// Message fanned out to a room's connections.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub room: RoomId,
    pub timestamp: Timestamp,
    pub payload: OutboundPayload,
}

impl OutboundMessage {
    pub fn event(room: RoomId, timestamp: Timestamp, event: RoomEvent) -> Self {
        Self {
            room,
            timestamp,
            payload: OutboundPayload::Event(event),
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.payload, OutboundPayload::Event(RoomEvent::GameOver { .. }))
    }
}
