//! Utilities shared by the Code Duel packages.

pub mod logger;
pub mod time;
