//! Events delivered to connections.
//!
//! These are protocol independent; the infrastructure layer converts them to
//! wire DTOs before pushing.

use serde_json::Value;

use super::value_object::{DisplayName, RoomId, SessionToken};

/// Notice sent to a room when one of its members leaves
pub const LEAVE_NOTICE: &str = "A user left the room.";

/// Room-scoped events relayed verbatim from one member to the others
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    NewMessage(Value),
    Typing(Value),
    StoppedTyping(Value),
}

/// Event pushed from the server to a connection
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Another member joined the room
    Joined { name: DisplayName },
    /// Greeting for the joining connection itself
    Name {
        name: DisplayName,
        room_name: String,
        image: String,
        identifier: String,
    },
    /// Current number of members in the room
    UpdateUserCount(usize),
    Relay(RoomEvent),
    /// Random match succeeded
    Found {
        user_name: DisplayName,
        room_id: RoomId,
        token: SessionToken,
    },
    /// Random match abandoned (cancelled, timed out or failed)
    SearchError,
    /// A member left the room
    Leave,
    MessageError { message: String },
}
