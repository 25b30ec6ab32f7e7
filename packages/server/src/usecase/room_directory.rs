//! Room directory: room-scoped presence and fan-out.
//!
//! Membership changes and the count broadcasts they trigger happen under the
//! same lock, so the count each member receives always equals the size of
//! the room at that moment.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, DisplayName, MessagePusher, RoomId, RoomMembership, ServerEvent,
};

/// Payload of the `name` event sent to a joining connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub display_name: DisplayName,
    pub room_name: String,
    pub image: String,
    pub identifier: String,
}

/// Room and member totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub rooms: usize,
    pub members: usize,
}

pub struct RoomDirectory {
    membership: Mutex<RoomMembership>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RoomDirectory {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            membership: Mutex::new(RoomMembership::new()),
            message_pusher,
        }
    }

    /// Add `connection_id` to `room_id` and announce it.
    ///
    /// Returns the member count after joining.
    pub async fn join(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        greeting: Greeting,
    ) -> usize {
        let mut membership = self.membership.lock().await;

        if let Some(previous) = membership.join(room_id, connection_id) {
            tracing::debug!(
                "Connection '{}' moved from room '{}' to '{}'",
                connection_id,
                previous,
                room_id
            );
            self.announce_departure(&membership, &previous).await;
        }

        let peers = membership.members_except(room_id, Some(connection_id));
        self.message_pusher
            .broadcast(
                &peers,
                &ServerEvent::Joined {
                    name: greeting.display_name.clone(),
                },
            )
            .await;

        let name = ServerEvent::Name {
            name: greeting.display_name,
            room_name: greeting.room_name,
            image: greeting.image,
            identifier: greeting.identifier,
        };
        if let Err(e) = self.message_pusher.push_to(connection_id, &name).await {
            tracing::warn!("Failed to greet '{}' in room '{}': {}", connection_id, room_id, e);
        }

        let count = membership.count(room_id);
        self.message_pusher
            .broadcast(
                &membership.members(room_id),
                &ServerEvent::UpdateUserCount(count),
            )
            .await;

        tracing::info!(
            "Connection '{}' joined room '{}' ({} present)",
            connection_id,
            room_id,
            count
        );
        count
    }

    /// Remove `connection_id` from `room_id` and tell the remaining members.
    ///
    /// Unknown rooms and non-members are a no-op. Returns the remaining count
    /// when the connection was removed.
    pub async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<usize> {
        let mut membership = self.membership.lock().await;
        if !membership.contains_room(room_id) || !membership.leave(room_id, connection_id) {
            return None;
        }
        tracing::info!("Connection '{}' left room '{}'", connection_id, room_id);
        Some(self.announce_departure(&membership, room_id).await)
    }

    /// Deliver `event` to every member of `room_id` except `excluding`.
    ///
    /// Returns the number of members the event was delivered to.
    pub async fn broadcast(
        &self,
        room_id: &RoomId,
        event: &ServerEvent,
        excluding: &ConnectionId,
    ) -> usize {
        let membership = self.membership.lock().await;
        let targets = membership.members_except(room_id, Some(excluding));
        self.message_pusher.broadcast(&targets, event).await
    }

    /// Remove a disconnected connection from every room it belongs to.
    ///
    /// Returns the affected rooms.
    pub async fn disconnect_cleanup(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let mut membership = self.membership.lock().await;
        let affected = membership.remove_everywhere(connection_id);
        for room_id in &affected {
            self.announce_departure(&membership, room_id).await;
        }
        affected
    }

    pub async fn member_count(&self, room_id: &RoomId) -> usize {
        self.membership.lock().await.count(room_id)
    }

    pub async fn snapshot(&self) -> DirectorySnapshot {
        let membership = self.membership.lock().await;
        DirectorySnapshot {
            rooms: membership.room_count(),
            members: membership.member_count(),
        }
    }

    /// Broadcast the new count and a leave notice to the remaining members.
    async fn announce_departure(&self, membership: &RoomMembership, room_id: &RoomId) -> usize {
        let remaining = membership.members(room_id);
        let count = remaining.len();
        self.message_pusher
            .broadcast(&remaining, &ServerEvent::UpdateUserCount(count))
            .await;
        self.message_pusher
            .broadcast(&remaining, &ServerEvent::Leave)
            .await;
        count
    }
}
