//! Domain layer: value objects, entities, state machines and the traits
//! the outer layers implement.

pub mod collaborator;
pub mod connection_registry;
pub mod entity;
pub mod error;
pub mod game;
pub mod message;
pub mod repository;
pub mod session;
pub mod value_object;

pub use collaborator::{CredentialVerifier, ProblemCatalog};
pub use connection_registry::{ConnectionRegistry, PusherChannel};
pub use entity::{
    DEFAULT_TIME_LIMIT_MINUTES, GameSettings, MAX_ROOM_CAPACITY, NewRoom, Problem, Room,
    RoomStatus, VerifiedIdentity,
};
pub use error::{AuthError, ProtocolError, RepositoryError, TransactionAbort, ValueObjectError};
pub use game::{GameState, ProgressOutcome, TickOutcome};
pub use message::{
    ChatMessage, InboundMessage, OutboundMessage, OutboundPayload, RoomEvent, RoomUpdate,
    SettingChange,
};
pub use repository::{RoomField, RoomRepository, RoomTransaction, RoomWrite};
pub use session::{Dispatch, DropReason, Session, SessionState};
pub use value_object::{
    ConnectionId, Difficulty, ParticipantId, ProblemId, RoomId, RoomIdFactory, Timestamp,
};

#[cfg(test)]
pub use collaborator::{MockCredentialVerifier, MockProblemCatalog};
