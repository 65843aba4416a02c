//! Entities persisted in (or verified by) external collaborators.

use serde::{Deserialize, Serialize};

use super::value_object::{Difficulty, ParticipantId, ProblemId, RoomId, Timestamp};

/// Largest capacity a room may be created with.
pub const MAX_ROOM_CAPACITY: usize = 5;
/// Time limit assigned to new rooms, in minutes.
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 30;

/// Lifecycle status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InGame,
}

/// Competition settings chosen in the room lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    pub difficulty: Difficulty,
    pub time_limit_minutes: u32,
    pub problem: Option<ProblemId>,
    pub random_problem: bool,
}

impl GameSettings {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            time_limit_minutes: DEFAULT_TIME_LIMIT_MINUTES,
            problem: None,
            random_problem: false,
        }
    }
}

/// Persisted multiplayer session container.
///
/// `participants` keeps join order and never holds duplicates; the
/// membership use case is the only writer of that field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub title: String,
    pub owner: ParticipantId,
    pub capacity: usize,
    pub participants: Vec<ParticipantId>,
    pub status: RoomStatus,
    pub in_game: bool,
    pub password: Option<String>,
    pub settings: GameSettings,
    pub created_at: Timestamp,
}

impl Room {
    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.capacity
    }

    pub fn is_owner(&self, participant: &ParticipantId) -> bool {
        &self.owner == participant
    }

    pub fn requires_password(&self) -> bool {
        self.password.is_some()
    }
}

/// Room document before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub title: String,
    pub owner: ParticipantId,
    pub capacity: usize,
    pub participants: Vec<ParticipantId>,
    pub password: Option<String>,
    pub settings: GameSettings,
    pub created_at: Timestamp,
}

impl NewRoom {
    pub fn into_room(self, id: RoomId) -> Room {
        Room {
            id,
            title: self.title,
            owner: self.owner,
            capacity: self.capacity,
            participants: self.participants,
            status: RoomStatus::Waiting,
            in_game: false,
            password: self.password,
            settings: self.settings,
            created_at: self.created_at,
        }
    }
}

/// Problem metadata the game clock needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub difficulty: Difficulty,
    /// Example cases plus full submission cases.
    pub required_case_count: u32,
}

/// Identity returned by a successful credential verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(name: &str) -> ParticipantId {
        ParticipantId::new(name.to_string()).unwrap()
    }

    fn create_test_room(capacity: usize, members: &[&str]) -> Room {
        NewRoom {
            title: "duel".to_string(),
            owner: participant("alice"),
            capacity,
            participants: members.iter().map(|m| participant(m)).collect(),
            password: None,
            settings: GameSettings::new(Difficulty::EASY),
            created_at: Timestamp::new(1000),
        }
        .into_room(RoomId::new("room-1".to_string()).unwrap())
    }

    #[test]
    fn test_new_room_starts_waiting() {
        // テスト項目: 作成直後の Room は待機状態でゲーム外
        // given (前提条件):

        // when (操作):
        let room = create_test_room(2, &["alice"]);

        // then (期待する結果):
        assert_eq!(room.status, RoomStatus::Waiting);
        assert!(!room.in_game);
        assert_eq!(room.settings.time_limit_minutes, DEFAULT_TIME_LIMIT_MINUTES);
    }

    #[test]
    fn test_is_full_at_capacity() {
        // テスト項目: 参加者数が定員に達すると満員と判定される
        // given (前提条件):
        let room = create_test_room(2, &["alice", "bob"]);

        // when (操作):
        let full = room.is_full();

        // then (期待する結果):
        assert!(full);
        assert!(room.contains(&participant("bob")));
        assert!(room.is_owner(&participant("alice")));
        assert!(!room.is_owner(&participant("bob")));
    }

    #[test]
    fn test_room_status_serializes_snake_case() {
        // テスト項目: RoomStatus は snake_case でシリアライズされる
        // given (前提条件):
        let status = RoomStatus::InGame;

        // when (操作):
        let json = serde_json::to_string(&status).unwrap();

        // then (期待する結果):
        assert_eq!(json, "\"in_game\"");
    }
}
