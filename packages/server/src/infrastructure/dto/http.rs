//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthDto {
    pub status: String,
}

/// `GET /api/stats`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsDto {
    /// Open WebSocket connections
    pub connections: usize,
    /// Connections waiting for a random match
    pub waiting: usize,
    /// Rooms with at least one member
    pub rooms: usize,
    /// Connections present in some room
    pub members: usize,
    /// Live sessions in the session store
    pub sessions: usize,
    /// Server start time (JST, RFC 3339)
    pub started_at: Option<String>,
}
