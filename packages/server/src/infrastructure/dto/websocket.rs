//! WebSocket wire envelope.
//!
//! Every frame, inbound or outbound, is one JSON object of this shape:
//!
//! ```json
//! { "type": "room_message", "room": "abc", "timestamp": 1700000000000,
//!   "content": "", "sender": "",
//!   "roomupdate": { "type": "CHANGE_DIFFICULTY", "data": { "value": 2 } } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Authorization,
    ChatMessage,
    RoomMessage,
    GameMessage,
    #[serde(other)]
    Unknown,
}

/// `roomupdate.type` values.
pub mod update_type {
    pub const CHANGE_DIFFICULTY: &str = "CHANGE_DIFFICULTY";
    pub const CHANGE_TIME_LIMIT: &str = "CHANGE_TIME_LIMIT";
    pub const CHANGE_PROBLEM: &str = "CHANGE_PROBLEM";
    pub const RANDOM_PROBLEM: &str = "RANDOM_PROBLEM";

    pub const USER_JOIN: &str = "USER_JOIN";
    pub const USER_LEAVE: &str = "USER_LEAVE";
    pub const LAUNCH_GAME: &str = "LAUNCH_GAME";
    pub const CODE_SUBMIT_RESULT: &str = "CODE_SUBMIT_RESULT";
    pub const GAME_OVER: &str = "GAME_OVER";

    /// Update types only the server may originate.
    pub const SERVER_ONLY: [&str; 5] =
        [USER_JOIN, USER_LEAVE, LAUNCH_GAME, CODE_SUBMIT_RESULT, GAME_OVER];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomUpdateDto {
    pub r#type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub r#type: MessageType,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roomupdate: Option<RoomUpdateDto>,
}
