//! Kakurega chat server library.
//!
//! Admits WebSocket connections into token-gated rooms, pairs privileged
//! connections through random matchmaking and relays room-scoped events
//! between the members of each room.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
