//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::CredentialVerifier,
    usecase::{
        CreateRoomUseCase, GameClock, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
        LaunchGameUseCase, SessionProtocol,
    },
};

pub struct AppState {
    /// SessionProtocol（WebSocket 接続ごとの処理）
    pub session_protocol: Arc<SessionProtocol>,
    /// GameClock（進捗報告の受け付け）
    pub game_clock: Arc<GameClock>,
    /// CredentialVerifier（HTTP の Bearer トークン検証）
    pub verifier: Arc<dyn CredentialVerifier>,
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub launch_game_usecase: Arc<LaunchGameUseCase>,
}
