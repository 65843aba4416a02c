//! Conversion logic between DTOs and domain types.
//!
//! Inbound frames are decoded exhaustively here; anything that does not fit
//! the typed model is rejected with a [`ProtocolError`].

use serde_json::{Map, Value, json};

use codeduel_shared::time::timestamp_to_rfc3339;

use crate::domain::{
    ChatMessage, Difficulty, InboundMessage, OutboundMessage, OutboundPayload, ProblemId,
    ProtocolError, Room, RoomEvent, RoomStatus, RoomUpdate, SettingChange, Timestamp,
};
use crate::infrastructure::dto::{
    http::{RoomDetailDto, RoomSummaryDto},
    websocket::{MessageType, RoomUpdateDto, WireMessage, update_type},
};

// ========================================
// Wire → Domain
// ========================================

/// Parse and decode one inbound text frame.
pub fn decode_inbound(text: &str) -> Result<InboundMessage, ProtocolError> {
    let wire: WireMessage =
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    InboundMessage::try_from(wire)
}

impl TryFrom<WireMessage> for InboundMessage {
    type Error = ProtocolError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let timestamp = Timestamp::new(wire.timestamp);
        match wire.r#type {
            MessageType::Authorization => Ok(InboundMessage::Authorization {
                token: wire.content,
            }),
            MessageType::ChatMessage => Ok(InboundMessage::Chat(ChatMessage {
                sender: wire.sender,
                content: wire.content,
                timestamp,
            })),
            MessageType::RoomMessage => {
                let update = wire.roomupdate.ok_or_else(|| {
                    ProtocolError::Malformed("room_message without roomupdate".to_string())
                })?;
                Ok(InboundMessage::Room {
                    timestamp,
                    update: RoomUpdate::try_from(update)?,
                })
            }
            MessageType::GameMessage => Err(ProtocolError::ServerOnlyUpdate(
                "game_message".to_string(),
            )),
            MessageType::Unknown => Err(ProtocolError::UnknownType),
        }
    }
}

impl TryFrom<RoomUpdateDto> for RoomUpdate {
    type Error = ProtocolError;

    fn try_from(dto: RoomUpdateDto) -> Result<Self, Self::Error> {
        let RoomUpdateDto { r#type: kind, data } = dto;
        if update_type::SERVER_ONLY.contains(&kind.as_str()) {
            return Err(ProtocolError::ServerOnlyUpdate(kind));
        }
        let value = data.get("value");
        let invalid = |reason: &str| ProtocolError::InvalidUpdateData {
            kind: kind.clone(),
            reason: reason.to_string(),
        };

        let change = match kind.as_str() {
            update_type::CHANGE_DIFFICULTY => {
                let level = value
                    .and_then(Value::as_u64)
                    .and_then(|v| u8::try_from(v).ok())
                    .ok_or_else(|| invalid("value must be a small integer"))?;
                SettingChange::Difficulty(
                    Difficulty::new(level).map_err(|e| invalid(&e.to_string()))?,
                )
            }
            update_type::CHANGE_TIME_LIMIT => {
                let minutes = value
                    .and_then(Value::as_u64)
                    .and_then(|v| u32::try_from(v).ok())
                    .filter(|m| *m > 0)
                    .ok_or_else(|| invalid("value must be a positive number of minutes"))?;
                SettingChange::TimeLimit(minutes)
            }
            update_type::CHANGE_PROBLEM => {
                let id = value
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid("value must be a problem id"))?;
                SettingChange::Problem(
                    ProblemId::new(id.to_string()).map_err(|e| invalid(&e.to_string()))?,
                )
            }
            update_type::RANDOM_PROBLEM => {
                let random = value
                    .and_then(Value::as_bool)
                    .ok_or_else(|| invalid("value must be a boolean"))?;
                SettingChange::RandomProblem(random)
            }
            _ => return Ok(RoomUpdate::Custom { kind, data }),
        };
        Ok(RoomUpdate::Setting(change))
    }
}

// ========================================
// Domain → Wire
// ========================================

fn into_data_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl From<&RoomUpdate> for RoomUpdateDto {
    fn from(update: &RoomUpdate) -> Self {
        let (kind, value) = match update {
            RoomUpdate::Setting(SettingChange::Difficulty(d)) => {
                (update_type::CHANGE_DIFFICULTY, json!(d.level()))
            }
            RoomUpdate::Setting(SettingChange::TimeLimit(m)) => {
                (update_type::CHANGE_TIME_LIMIT, json!(m))
            }
            RoomUpdate::Setting(SettingChange::Problem(p)) => {
                (update_type::CHANGE_PROBLEM, json!(p.as_str()))
            }
            RoomUpdate::Setting(SettingChange::RandomProblem(r)) => {
                (update_type::RANDOM_PROBLEM, json!(r))
            }
            RoomUpdate::Custom { kind, data } => {
                return Self {
                    r#type: kind.clone(),
                    data: data.clone(),
                };
            }
        };
        Self {
            r#type: kind.to_string(),
            data: into_data_map(json!({ "value": value })),
        }
    }
}

fn event_to_dto(event: &RoomEvent) -> (MessageType, RoomUpdateDto) {
    let (message_type, kind, body) = match event {
        RoomEvent::UserJoin {
            participant,
            display_name,
        } => (
            MessageType::RoomMessage,
            update_type::USER_JOIN,
            json!({ "value": display_name, "participant": participant.as_str() }),
        ),
        RoomEvent::UserLeave {
            participant,
            display_name,
        } => (
            MessageType::RoomMessage,
            update_type::USER_LEAVE,
            json!({ "value": display_name, "participant": participant.as_str() }),
        ),
        RoomEvent::LaunchGame {
            problem,
            time_limit_minutes,
            total_cases,
        } => (
            MessageType::RoomMessage,
            update_type::LAUNCH_GAME,
            json!({
                "value": problem.as_str(),
                "timeLimit": time_limit_minutes,
                "totalCases": total_cases,
            }),
        ),
        RoomEvent::CodeSubmitResult {
            participant,
            score,
            leader,
            leader_score,
        } => (
            MessageType::GameMessage,
            update_type::CODE_SUBMIT_RESULT,
            json!({
                "value": score,
                "user": participant.as_str(),
                "leader": leader.as_ref().map(|l| l.as_str()),
                "leaderScore": leader_score,
            }),
        ),
        RoomEvent::GameOver { winner } => (
            MessageType::GameMessage,
            update_type::GAME_OVER,
            json!({ "value": winner.as_ref().map(|w| w.as_str()).unwrap_or_default() }),
        ),
    };
    (
        message_type,
        RoomUpdateDto {
            r#type: kind.to_string(),
            data: into_data_map(body),
        },
    )
}

impl From<&OutboundMessage> for WireMessage {
    fn from(message: &OutboundMessage) -> Self {
        let mut wire = WireMessage {
            r#type: MessageType::RoomMessage,
            room: message.room.as_str().to_string(),
            timestamp: message.timestamp.value(),
            content: String::new(),
            sender: String::new(),
            roomupdate: None,
        };
        match &message.payload {
            OutboundPayload::Chat(chat) => {
                wire.r#type = MessageType::ChatMessage;
                wire.content = chat.content.clone();
                wire.sender = chat.sender.clone();
            }
            OutboundPayload::RoomUpdate(update) => {
                wire.roomupdate = Some(update.into());
            }
            OutboundPayload::Event(event) => {
                let (message_type, update) = event_to_dto(event);
                wire.r#type = message_type;
                wire.roomupdate = Some(update);
            }
        }
        wire
    }
}

/// Encode an outbound message as a JSON text frame.
pub fn encode_outbound(message: &OutboundMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&WireMessage::from(message))
}

// ========================================
// Domain Entity → HTTP DTO
// ========================================

fn status_label(status: RoomStatus) -> String {
    match status {
        RoomStatus::Waiting => "waiting",
        RoomStatus::InGame => "in_game",
    }
    .to_string()
}

impl From<&Room> for RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            title: room.title.clone(),
            owner: room.owner.as_str().to_string(),
            capacity: room.capacity,
            participants: room
                .participants
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            status: status_label(room.status),
            requires_password: room.requires_password(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl RoomDetailDto {
    pub fn from_room(room: &Room, live_connections: usize) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            title: room.title.clone(),
            owner: room.owner.as_str().to_string(),
            capacity: room.capacity,
            participants: room
                .participants
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            status: status_label(room.status),
            in_game: room.in_game,
            requires_password: room.requires_password(),
            difficulty: room.settings.difficulty.level(),
            time_limit_minutes: room.settings.time_limit_minutes,
            problem: room
                .settings
                .problem
                .as_ref()
                .map(|p| p.as_str().to_string()),
            random_problem: room.settings.random_problem,
            live_connections,
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParticipantId, RoomId};

    fn room_id() -> RoomId {
        RoomId::new("r1".to_string()).unwrap()
    }

    #[test]
    fn test_decode_authorization() {
        // テスト項目: authorization メッセージからトークンが取り出される
        // given (前提条件):
        let text = r#"{"type":"authorization","room":"r1","timestamp":1,"content":"tok"}"#;

        // when (操作):
        let message = decode_inbound(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            message,
            InboundMessage::Authorization {
                token: "tok".to_string()
            }
        );
    }

    #[test]
    fn test_decode_malformed_json() {
        // テスト項目: JSON として不正なフレームは Malformed エラーになる
        // given (前提条件):
        let text = "hello there";

        // when (操作):
        let result = decode_inbound(text);

        // then (期待する結果):
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_decode_change_difficulty() {
        // テスト項目: CHANGE_DIFFICULTY は型付きの設定変更に変換される
        // given (前提条件):
        let text = r#"{"type":"room_message","room":"r1","timestamp":7,
            "roomupdate":{"type":"CHANGE_DIFFICULTY","data":{"value":3}}}"#;

        // when (操作):
        let message = decode_inbound(text).unwrap();

        // then (期待する結果):
        assert_eq!(
            message,
            InboundMessage::Room {
                timestamp: Timestamp::new(7),
                update: RoomUpdate::Setting(SettingChange::Difficulty(Difficulty::HARD)),
            }
        );
    }

    #[test]
    fn test_decode_rejects_out_of_range_difficulty() {
        // テスト項目: 範囲外の難易度は InvalidUpdateData エラーになる
        // given (前提条件):
        let text = r#"{"type":"room_message","roomupdate":{"type":"CHANGE_DIFFICULTY","data":{"value":9}}}"#;

        // when (操作):
        let result = decode_inbound(text);

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidUpdateData { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_zero_time_limit() {
        // テスト項目: 0 分の制限時間は拒否される
        // given (前提条件):
        let text = r#"{"type":"room_message","roomupdate":{"type":"CHANGE_TIME_LIMIT","data":{"value":0}}}"#;

        // when (操作):
        let result = decode_inbound(text);

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidUpdateData { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_client_sent_server_update() {
        // テスト項目: クライアントからの GAME_OVER などサーバー専用の更新は拒否される
        // given (前提条件):
        let text = r#"{"type":"room_message","roomupdate":{"type":"GAME_OVER","data":{"value":"me"}}}"#;

        // when (操作):
        let result = decode_inbound(text);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ProtocolError::ServerOnlyUpdate("GAME_OVER".to_string()))
        );
    }

    #[test]
    fn test_decode_unrecognized_update_is_custom() {
        // テスト項目: 未知の更新種別は Custom として中継対象になる
        // given (前提条件):
        let text = r#"{"type":"room_message","roomupdate":{"type":"CHANGE_ROOM_NAME","data":{"value":"x"}}}"#;

        // when (操作):
        let message = decode_inbound(text).unwrap();

        // then (期待する結果):
        match message {
            InboundMessage::Room {
                update: RoomUpdate::Custom { kind, data },
                ..
            } => {
                assert_eq!(kind, "CHANGE_ROOM_NAME");
                assert_eq!(data.get("value"), Some(&json!("x")));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_encode_game_over_without_winner() {
        // テスト項目: 勝者なしの GAME_OVER は空文字の value で送られる
        // given (前提条件):
        let message = OutboundMessage::event(
            room_id(),
            Timestamp::new(10),
            RoomEvent::GameOver { winner: None },
        );

        // when (操作):
        let json: Value = serde_json::from_str(&encode_outbound(&message).unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(json["type"], "game_message");
        assert_eq!(json["room"], "r1");
        assert_eq!(json["roomupdate"]["type"], "GAME_OVER");
        assert_eq!(json["roomupdate"]["data"]["value"], "");
    }

    #[test]
    fn test_encode_user_join() {
        // テスト項目: USER_JOIN は room_message として表示名付きで送られる
        // given (前提条件):
        let message = OutboundMessage::event(
            room_id(),
            Timestamp::new(10),
            RoomEvent::UserJoin {
                participant: ParticipantId::new("uid-1".to_string()).unwrap(),
                display_name: "alice".to_string(),
            },
        );

        // when (操作):
        let json: Value = serde_json::from_str(&encode_outbound(&message).unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(json["type"], "room_message");
        assert_eq!(json["roomupdate"]["type"], "USER_JOIN");
        assert_eq!(json["roomupdate"]["data"]["value"], "alice");
        assert_eq!(json["roomupdate"]["data"]["participant"], "uid-1");
    }

    #[test]
    fn test_encode_chat_keeps_sender_and_content() {
        // テスト項目: チャットは送信者・本文・タイムスタンプをそのまま保持する
        // given (前提条件):
        let message = OutboundMessage {
            room: room_id(),
            timestamp: Timestamp::new(42),
            payload: OutboundPayload::Chat(ChatMessage {
                sender: "bob".to_string(),
                content: "gl hf".to_string(),
                timestamp: Timestamp::new(42),
            }),
        };

        // when (操作):
        let wire = WireMessage::from(&message);

        // then (期待する結果):
        assert_eq!(wire.r#type, MessageType::ChatMessage);
        assert_eq!(wire.sender, "bob");
        assert_eq!(wire.content, "gl hf");
        assert_eq!(wire.timestamp, 42);
        assert!(wire.roomupdate.is_none());
    }
}
