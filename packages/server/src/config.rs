//! Server configuration.

use std::{path::PathBuf, time::Duration};

use crate::usecase::{DEFAULT_CLEANUP_INTERVAL, DEFAULT_TICK_PERIOD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// One game minute.
    pub game_tick: Duration,
    pub cleanup_interval: Duration,
    /// Token table for the static credential verifier.
    pub credentials: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            game_tick: DEFAULT_TICK_PERIOD,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            credentials: None,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
