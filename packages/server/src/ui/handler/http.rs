//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::{
    domain::{AuthError, Difficulty, ProblemId, RepositoryError, RoomId, VerifiedIdentity},
    infrastructure::dto::http::{
        CreateRoomRequest, JoinRoomRequest, LaunchGameRequest, RoomDetailDto, RoomSummaryDto,
        SubmitProgressRequest,
    },
    ui::state::AppState,
    usecase::{
        CreateRoomError, CreateRoomInput, GetRoomDetailError, JoinRoomError, LaunchGameError,
        MembershipChange, MembershipError, ProgressReport,
    },
};

/// Error response: `{"success": false, "error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        }
        (
            self.status,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RoomNotFound(_) => Self::new(StatusCode::NOT_FOUND, error.to_string()),
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
        }
    }
}

impl From<MembershipError> for ApiError {
    fn from(error: MembershipError) -> Self {
        let status = match error {
            MembershipError::CapacityExceeded { .. } => StatusCode::CONFLICT,
            MembershipError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            MembershipError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.to_string())
    }
}

impl From<JoinRoomError> for ApiError {
    fn from(error: JoinRoomError) -> Self {
        match error {
            JoinRoomError::WrongPassword => Self::new(StatusCode::FORBIDDEN, error.to_string()),
            JoinRoomError::Membership(e) => e.into(),
        }
    }
}

impl From<LaunchGameError> for ApiError {
    fn from(error: LaunchGameError) -> Self {
        let status = match error {
            LaunchGameError::RoomNotFound(_) | LaunchGameError::ProblemNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LaunchGameError::NotOwner => StatusCode::FORBIDDEN,
            LaunchGameError::NoProblemSelected | LaunchGameError::NoRequiredCases(_) => {
                StatusCode::BAD_REQUEST
            }
            LaunchGameError::AlreadyRunning(_) => StatusCode::CONFLICT,
            LaunchGameError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.to_string())
    }
}

impl From<CreateRoomError> for ApiError {
    fn from(error: CreateRoomError) -> Self {
        match error {
            CreateRoomError::EmptyTitle => Self::bad_request(error.to_string()),
            CreateRoomError::Store(e) => e.into(),
        }
    }
}

impl From<GetRoomDetailError> for ApiError {
    fn from(error: GetRoomDetailError) -> Self {
        let status = match error {
            GetRoomDetailError::InvalidRoomId => StatusCode::BAD_REQUEST,
            GetRoomDetailError::RoomNotFound => StatusCode::NOT_FOUND,
            GetRoomDetailError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.to_string())
    }
}

/// `Authorization: Bearer <token>` を検証する
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<VerifiedIdentity, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::InvalidToken)?;
    Ok(state.verifier.verify(token.trim()).await?)
}

fn parse_room_id(room_id: String) -> Result<RoomId, ApiError> {
    RoomId::try_from(room_id).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// 空のボディは既定値として扱う
fn parse_optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummaryDto>>, ApiError> {
    let rooms = state.get_rooms_usecase.execute().await?;
    Ok(Json(rooms.iter().map(RoomSummaryDto::from).collect()))
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, ApiError> {
    let detail = state.get_room_detail_usecase.execute(room_id).await?;
    Ok(Json(RoomDetailDto::from_room(
        &detail.room,
        detail.live_connections,
    )))
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let difficulty =
        Difficulty::new(request.difficulty).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let room = state
        .create_room_usecase
        .execute(
            identity.participant_id,
            CreateRoomInput {
                title: request.title,
                capacity: request.capacity,
                difficulty,
                password: request.password,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "room": RoomDetailDto::from_room(&room, 0) })),
    ))
}

pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let room_id = parse_room_id(room_id)?;
    let request: JoinRoomRequest = parse_optional_body(&body)?;
    let change = state
        .join_room_usecase
        .join(&room_id, &identity.participant_id, request.password.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "joined": change == MembershipChange::Joined,
    })))
}

pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let room_id = parse_room_id(room_id)?;
    let change = state
        .join_room_usecase
        .leave(&room_id, &identity.participant_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "room_deleted": change == MembershipChange::RoomDeleted,
    })))
}

pub async fn launch_game(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let room_id = parse_room_id(room_id)?;
    let request: LaunchGameRequest = parse_optional_body(&body)?;
    let problem_id = request
        .problem_id
        .map(ProblemId::try_from)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let room = state
        .launch_game_usecase
        .execute(&room_id, &identity.participant_id, problem_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "room": RoomDetailDto::from_room(&room, 0),
    })))
}

pub async fn submit_progress(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SubmitProgressRequest>,
) -> Result<Json<Value>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let room_id = parse_room_id(room_id)?;
    let report = state
        .game_clock
        .update_progress(&room_id, &identity.participant_id, request.score)
        .await;
    Ok(Json(json!({
        "success": true,
        "accepted": report != ProgressReport::Ignored,
        "won": matches!(report, ProgressReport::Won { .. }),
    })))
}
