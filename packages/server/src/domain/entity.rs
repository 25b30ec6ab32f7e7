//! Domain entities.

use super::value_object::{ConnectionId, DisplayName, RoomId, SessionToken, Timestamp};

/// Name given to sessions provisioned by random matchmaking
pub const RANDOM_SESSION_NAME: &str = "Random Meetup";

/// Room name that admits a connection as privileged (eligible for matchmaking)
pub const PRIVILEGED_ROOM: &str = "family";

/// A chat room gated by an admission token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub room_id: RoomId,
    pub token: SessionToken,
    pub name: String,
    pub random: bool,
    pub created_at: Timestamp,
}

impl Session {
    pub fn new(
        room_id: RoomId,
        token: SessionToken,
        name: String,
        random: bool,
        created_at: Timestamp,
    ) -> Self {
        Self {
            room_id,
            token,
            name,
            random,
            created_at,
        }
    }

    /// Session provisioned for a random pair
    pub fn random_meetup(room_id: RoomId, token: SessionToken, created_at: Timestamp) -> Self {
        Self::new(
            room_id,
            token,
            RANDOM_SESSION_NAME.to_string(),
            true,
            created_at,
        )
    }

    /// `ttl_millis == None` means the session never expires.
    pub fn is_expired(&self, now: Timestamp, ttl_millis: Option<i64>) -> bool {
        match ttl_millis {
            Some(ttl) => now.value().saturating_sub(self.created_at.value()) >= ttl,
            None => false,
        }
    }

    pub fn admits(&self, token: &SessionToken) -> bool {
        &self.token == token
    }
}

/// A privileged connection tracked by the connection registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEntry {
    pub connection_id: ConnectionId,
    pub display_name: DisplayName,
    pub idle: bool,
    pub connected_at: Timestamp,
}

impl ConnectionEntry {
    /// New entries start non-idle.
    pub fn new(
        connection_id: ConnectionId,
        display_name: DisplayName,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            connection_id,
            display_name,
            idle: false,
            connected_at,
        }
    }
}

/// How a connection was admitted by the authentication gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Admitted under the `family` room without a token check
    Privileged,
    /// Admitted into a session room
    Room { room_id: RoomId, room_name: String },
}

/// Per-connection context populated once at admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    pub connection_id: ConnectionId,
    pub admission: Admission,
}

impl ConnectionContext {
    pub fn privileged(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            admission: Admission::Privileged,
        }
    }

    pub fn room(connection_id: ConnectionId, room_id: RoomId, room_name: String) -> Self {
        Self {
            connection_id,
            admission: Admission::Room { room_id, room_name },
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self.admission, Admission::Privileged)
    }

    /// Room the connection was admitted into (`decodedRoom`)
    pub fn decoded_room(&self) -> Option<&RoomId> {
        match &self.admission {
            Admission::Room { room_id, .. } => Some(room_id),
            Admission::Privileged => None,
        }
    }

    /// Display name of the admitted room (`decodedRoomName`)
    pub fn decoded_room_name(&self) -> Option<&str> {
        match &self.admission {
            Admission::Room { room_name, .. } => Some(room_name),
            Admission::Privileged => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_created_at(created_at: i64) -> Session {
        Session::random_meetup(
            RoomId::new("abc123".to_string()).unwrap(),
            SessionToken::new("tok12".to_string()).unwrap(),
            Timestamp::new(created_at),
        )
    }

    #[test]
    fn test_random_meetup_session_fields() {
        // テスト項目: ランダムマッチ用セッションの name と random フラグ
        // given (前提条件):

        // when (操作):
        let session = session_created_at(1_000);

        // then (期待する結果):
        assert_eq!(session.name, "Random Meetup");
        assert!(session.random);
    }

    #[test]
    fn test_session_expiry() {
        // テスト項目: TTL を過ぎたセッションのみ期限切れと判定される
        // given (前提条件):
        let session = session_created_at(1_000);

        // when (操作) / then (期待する結果):
        assert!(!session.is_expired(Timestamp::new(1_999), Some(1_000)));
        assert!(session.is_expired(Timestamp::new(2_000), Some(1_000)));
        assert!(!session.is_expired(Timestamp::new(i64::MAX), None));
    }

    #[test]
    fn test_connection_context_accessors() {
        // テスト項目: Admission に応じて decoded_room が返される
        // given (前提条件):
        let id = ConnectionId::from("conn-1");
        let room_id = RoomId::new("R1".to_string()).unwrap();

        // when (操作):
        let privileged = ConnectionContext::privileged(id.clone());
        let in_room = ConnectionContext::room(id, room_id.clone(), "Lounge".to_string());

        // then (期待する結果):
        assert!(privileged.is_privileged());
        assert_eq!(privileged.decoded_room(), None);
        assert!(!in_room.is_privileged());
        assert_eq!(in_room.decoded_room(), Some(&room_id));
        assert_eq!(in_room.decoded_room_name(), Some("Lounge"));
    }
}
