//! Per-connection handshake state machine.
//!
//! ```text
//! Connected --authorization ok--> Authorized --close--> Closed
//!     |                                                   ^
//!     +-----------------------close-----------------------+
//! ```
//!
//! Only the transition rules live here; verification, fan-out and
//! membership cleanup are performed by `usecase::SessionProtocol`.

use super::{
    entity::VerifiedIdentity,
    message::{ChatMessage, InboundMessage, RoomUpdate},
    value_object::{ConnectionId, RoomId, Timestamp},
};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Connected,
    Authorized(VerifiedIdentity),
    Closed,
}

/// Why an inbound frame was not acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Non-handshake frame before authorization.
    NotAuthorized,
    /// Handshake frame after the identity was already bound.
    AlreadyAuthorized,
    Closed,
}

/// What the protocol must do with one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Authorize {
        token: String,
    },
    RelayChat(ChatMessage),
    RelayRoomUpdate {
        timestamp: Timestamp,
        update: RoomUpdate,
    },
    Drop(DropReason),
}

#[derive(Debug)]
pub struct Session {
    connection: ConnectionId,
    room: RoomId,
    state: SessionState,
}

impl Session {
    pub fn new(connection: ConnectionId, room: RoomId) -> Self {
        Self {
            connection,
            room,
            state: SessionState::Connected,
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&VerifiedIdentity> {
        match &self.state {
            SessionState::Authorized(identity) => Some(identity),
            _ => None,
        }
    }

    /// Decide how to handle `message` in the current state.
    pub fn dispatch(&self, message: InboundMessage) -> Dispatch {
        match (&self.state, message) {
            (SessionState::Closed, _) => Dispatch::Drop(DropReason::Closed),
            (SessionState::Connected, InboundMessage::Authorization { token }) => {
                Dispatch::Authorize { token }
            }
            (SessionState::Connected, _) => Dispatch::Drop(DropReason::NotAuthorized),
            (SessionState::Authorized(_), InboundMessage::Authorization { .. }) => {
                Dispatch::Drop(DropReason::AlreadyAuthorized)
            }
            (SessionState::Authorized(_), InboundMessage::Chat(chat)) => Dispatch::RelayChat(chat),
            (SessionState::Authorized(_), InboundMessage::Room { timestamp, update }) => {
                Dispatch::RelayRoomUpdate { timestamp, update }
            }
        }
    }

    /// Bind `identity` to this connection.
    ///
    /// Returns `false` without changing anything unless the session is still
    /// `Connected`; a bound identity never changes.
    pub fn authorize(&mut self, identity: VerifiedIdentity) -> bool {
        if self.state != SessionState::Connected {
            return false;
        }
        self.state = SessionState::Authorized(identity);
        true
    }

    /// Move to `Closed`, yielding the bound identity if there was one.
    pub fn close(&mut self) -> Option<VerifiedIdentity> {
        match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Authorized(identity) => Some(identity),
            _ => None,
        }
    }
}
