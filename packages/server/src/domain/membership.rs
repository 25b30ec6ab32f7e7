//! Room membership: which connections are present in which room.
//!
//! A connection is a member of at most one room. Joining another room moves
//! it. Rooms with no members are dropped.

use std::collections::{BTreeSet, HashMap};

use super::{ConnectionId, RoomId};

#[derive(Debug, Default)]
pub struct RoomMembership {
    rooms: HashMap<RoomId, BTreeSet<ConnectionId>>,
}

impl RoomMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection_id` to `room_id`.
    ///
    /// Returns the room the connection was moved out of, if any.
    pub fn join(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<RoomId> {
        let previous = self
            .room_of(connection_id)
            .filter(|current| *current != room_id)
            .cloned();
        if let Some(previous) = &previous {
            self.leave(previous, connection_id);
        }
        self.rooms
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id.clone());
        previous
    }

    /// Remove `connection_id` from `room_id`. Returns `true` if it was a member.
    pub fn leave(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let Some(members) = self.rooms.get_mut(room_id) else {
            return false;
        };
        let removed = members.remove(connection_id);
        if members.is_empty() {
            self.rooms.remove(room_id);
        }
        removed
    }

    /// Remove `connection_id` from every room it appears in.
    ///
    /// Returns the affected rooms.
    pub fn remove_everywhere(&mut self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let mut affected = Vec::new();
        self.rooms.retain(|room_id, members| {
            if members.remove(connection_id) {
                affected.push(room_id.clone());
            }
            !members.is_empty()
        });
        affected
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<&RoomId> {
        self.rooms
            .iter()
            .find(|(_, members)| members.contains(connection_id))
            .map(|(room_id, _)| room_id)
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, BTreeSet::len)
    }

    /// All members of `room_id`, sorted
    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.members_except(room_id, None)
    }

    /// Members of `room_id` other than `excluding`
    pub fn members_except(
        &self,
        room_id: &RoomId,
        excluding: Option<&ConnectionId>,
    ) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|id| Some(*id) != excluding)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn member_count(&self) -> usize {
        self.rooms.values().map(BTreeSet::len).sum()
    }
}
