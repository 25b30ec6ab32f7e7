//! Queue of connections seeking a random match.

use std::collections::VecDeque;

use super::ConnectionId;

/// Identifies one search. A connection that searches again gets a new ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct WaitQueue {
    entries: VecDeque<(ConnectionId, Ticket)>,
    next_ticket: u64,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a connection. Returns `None` if it is already queued.
    pub fn enqueue(&mut self, connection_id: ConnectionId) -> Option<Ticket> {
        if self.contains(&connection_id) {
            return None;
        }
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.entries.push_back((connection_id, ticket));
        Some(ticket)
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<Ticket> {
        let index = self.entries.iter().position(|(id, _)| id == connection_id)?;
        self.entries.remove(index).map(|(_, ticket)| ticket)
    }

    /// Remove the entry only if it still carries `ticket`.
    pub fn remove_ticket(&mut self, connection_id: &ConnectionId, ticket: Ticket) -> bool {
        match self.ticket_of(connection_id) {
            Some(current) if current == ticket => self.remove(connection_id).is_some(),
            _ => false,
        }
    }

    pub fn ticket_of(&self, connection_id: &ConnectionId) -> Option<Ticket> {
        self.entries
            .iter()
            .find(|(id, _)| id == connection_id)
            .map(|(_, ticket)| *ticket)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.ticket_of(connection_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued connection ids, oldest first
    pub fn connection_ids(&self) -> impl Iterator<Item = &ConnectionId> {
        self.entries.iter().map(|(id, _)| id)
    }
}
