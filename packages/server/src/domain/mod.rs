//! Domain layer for the anonymous chat server.
//!
//! Entities, value objects and the in-memory aggregates (`Lobby`,
//! `RoomMembership`) live here together with the traits the use case layer
//! depends on. Concrete implementations of the traits are provided by the
//! infrastructure layer.

pub mod entity;
pub mod error;
pub mod event;
pub mod lobby;
pub mod membership;
pub mod message_pusher;
pub mod notifier;
pub mod registry;
pub mod repository;
pub mod value_object;
pub mod wait_queue;

pub use entity::{Admission, ConnectionContext, ConnectionEntry, Session};
pub use error::{DeliveryError, LobbyError, RepositoryError, ValueObjectError};
pub use event::{RoomEvent, ServerEvent};
pub use lobby::{Lobby, Pairing};
pub use membership::RoomMembership;
pub use message_pusher::{MessagePusher, PusherChannel};
pub use notifier::{PushNotification, PushNotifier};
pub use registry::ConnectionRegistry;
pub use repository::{NameRepository, SessionRepository};
pub use value_object::{
    ConnectionId, DisplayName, RoomId, RoomIdFactory, SessionToken, SessionTokenFactory, Timestamp,
};
pub use wait_queue::{Ticket, WaitQueue};
