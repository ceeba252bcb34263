// src/models/server.rs
use serde::Serialize;
use std::net::SocketAddr;

/// Name shown for a server until its first status query succeeds.
pub const PLACEHOLDER_NAME: &str = "Scanning...";

/// Descriptive fields decoded from an A2S_INFO reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub name: String,
    pub map: String,
    pub players: u8,
    pub max_players: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRecord {
    pub address: SocketAddr,
    /// Unix time in milliseconds of the last heartbeat.
    pub last_seen: u64,
    pub name: String,
    pub map: String,
    pub players: u8,
    pub max_players: u8,
}

impl ServerRecord {
    pub fn new(address: SocketAddr, last_seen: u64) -> Self {
        Self {
            address,
            last_seen,
            name: PLACEHOLDER_NAME.to_string(),
            map: String::new(),
            players: 0,
            max_players: 0,
        }
    }

    pub fn apply(&mut self, status: ServerStatus) {
        self.name = status.name;
        self.map = status.map;
        self.players = status.players;
        self.max_players = status.max_players;
    }
}
