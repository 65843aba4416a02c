//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

/// Room list item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub title: String,
    pub owner: String,
    pub capacity: usize,
    pub participants: Vec<String>,
    pub status: String,
    pub requires_password: bool,
    pub created_at: String,
}

/// Room detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub title: String,
    pub owner: String,
    pub capacity: usize,
    pub participants: Vec<String>,
    pub status: String,
    pub in_game: bool,
    pub requires_password: bool,
    pub difficulty: u8,
    pub time_limit_minutes: u32,
    pub problem: Option<String>,
    pub random_problem: bool,
    pub live_connections: usize,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub title: String,
    pub capacity: usize,
    pub difficulty: u8,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    #[serde(default)]
    pub password: Option<String>,
}

/// `problem_id` を省略すると Room の設定から出題する
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchGameRequest {
    #[serde(default)]
    pub problem_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitProgressRequest {
    pub score: u32,
}
