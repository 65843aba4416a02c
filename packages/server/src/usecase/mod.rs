//! UseCase 層
//!
//! ドメインの trait（Repository, ConnectionRegistry, CredentialVerifier, ProblemCatalog）
//! に依存し、具体的な実装には依存しません。

pub mod cleanup_rooms;
pub mod create_room;
pub mod error;
pub mod game_clock;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;
pub mod launch_game;
pub mod membership;
pub mod session_protocol;

pub use cleanup_rooms::{CleanupSweep, DEFAULT_CLEANUP_INTERVAL};
pub use create_room::{CreateRoomInput, CreateRoomUseCase};
pub use error::{
    CreateRoomError, GetRoomDetailError, LaunchGameError, MembershipError, StartGameError,
};
pub use game_clock::{DEFAULT_TICK_PERIOD, GameClock, ProgressReport, TickReport};
pub use get_room_detail::{GetRoomDetailUseCase, RoomDetail};
pub use get_rooms::GetRoomsUseCase;
pub use join_room::{JoinRoomError, JoinRoomUseCase};
pub use launch_game::LaunchGameUseCase;
pub use membership::{MembershipChange, MembershipCoordinator};
pub use session_protocol::{FrameOutcome, SessionProtocol};
