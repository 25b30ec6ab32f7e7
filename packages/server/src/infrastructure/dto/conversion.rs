//! Conversion logic between DTOs and domain events.

use crate::domain::{RoomEvent, ServerEvent, event::LEAVE_NOTICE};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain
// ========================================

impl TryFrom<dto::ClientMessage> for RoomEvent {
    type Error = dto::ClientMessage;

    /// Room-scoped client events become relayable `RoomEvent`s; every other
    /// event is handed back unchanged.
    fn try_from(message: dto::ClientMessage) -> Result<Self, Self::Error> {
        match message {
            dto::ClientMessage::NewMessage(data) => Ok(RoomEvent::NewMessage(data)),
            dto::ClientMessage::Typing(data) => Ok(RoomEvent::Typing(data)),
            dto::ClientMessage::StoppedTyping(data) => Ok(RoomEvent::StoppedTyping(data)),
            other => Err(other),
        }
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&RoomEvent> for dto::ServerMessage {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::NewMessage(data) => Self::NewMessage(data.clone()),
            RoomEvent::Typing(data) => Self::Typing(data.clone()),
            RoomEvent::StoppedTyping(data) => Self::StoppedTyping(data.clone()),
        }
    }
}

impl From<&ServerEvent> for dto::ServerMessage {
    fn from(event: &ServerEvent) -> Self {
        match event {
            ServerEvent::Joined { name } => Self::Joined(dto::JoinedPayload {
                name: name.as_str().to_string(),
            }),
            ServerEvent::Name {
                name,
                room_name,
                image,
                identifier,
            } => Self::Name(dto::NamePayload {
                name: name.as_str().to_string(),
                room: room_name.clone(),
                image: image.clone(),
                identifier: identifier.clone(),
            }),
            ServerEvent::UpdateUserCount(count) => Self::UpdateUserCount(*count),
            ServerEvent::Relay(room_event) => room_event.into(),
            ServerEvent::Found {
                user_name,
                room_id,
                token,
            } => Self::Found(dto::FoundPayload {
                user_name: user_name.as_str().to_string(),
                room: room_id.as_str().to_string(),
                key: token.as_str().to_string(),
            }),
            ServerEvent::SearchError => Self::SearchError,
            ServerEvent::Leave => Self::Leave(dto::LeavePayload {
                message: LEAVE_NOTICE.to_string(),
            }),
            ServerEvent::MessageError { message } => {
                Self::MessageError(dto::MessageErrorPayload {
                    message: message.clone(),
                })
            }
        }
    }
}
