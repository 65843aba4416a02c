//! Real-time room server for Code Duel.
//!
//! Participants join a room, chat and tweak the lobby settings over a
//! WebSocket, then race to pass every test case of a problem before the
//! room's time limit runs out.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
