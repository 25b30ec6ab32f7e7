//! Lobby aggregate: connection registry + wait queue.
//!
//! Both live behind one lock so that picking a partner and taking both
//! parties out of the queue is a single state transition. Invariant: an
//! entry is idle iff its id is in the wait queue.
//!
//! Paired connections stay in the pairing set until their session is settled
//! ([`Lobby::finish_pairing`] or [`Lobby::requeue`]) and cannot start another
//! search meanwhile.

use std::collections::HashSet;

use rand::Rng;

use super::{ConnectionEntry, ConnectionId, ConnectionRegistry, LobbyError, Ticket, WaitQueue};

/// Two connections taken out of the queue together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub seeker: ConnectionEntry,
    pub partner: ConnectionEntry,
}

#[derive(Debug, Default)]
pub struct Lobby {
    registry: ConnectionRegistry,
    queue: WaitQueue,
    /// Connections taken out of the queue whose session is being created
    pairing: HashSet<ConnectionId>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: ConnectionEntry) {
        self.registry.register(entry);
    }

    /// Drop a connection from both the registry and the queue.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ConnectionEntry> {
        self.queue.remove(connection_id);
        self.pairing.remove(connection_id);
        self.registry.remove(connection_id)
    }

    pub fn entry(&self, connection_id: &ConnectionId) -> Option<&ConnectionEntry> {
        self.registry.get(connection_id)
    }

    pub fn is_waiting(&self, connection_id: &ConnectionId) -> bool {
        self.queue.contains(connection_id)
    }

    pub fn is_pairing(&self, connection_id: &ConnectionId) -> bool {
        self.pairing.contains(connection_id)
    }

    pub fn registered_count(&self) -> usize {
        self.registry.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.queue.len()
    }

    /// Start a search: queue the connection and mark it idle.
    pub fn enter_queue(&mut self, connection_id: &ConnectionId) -> Result<Ticket, LobbyError> {
        if !self.registry.contains(connection_id) {
            return Err(LobbyError::NotRegistered(connection_id.to_string()));
        }
        if self.pairing.contains(connection_id) {
            return Err(LobbyError::PairingInProgress(connection_id.to_string()));
        }
        let ticket = self
            .queue
            .enqueue(connection_id.clone())
            .ok_or_else(|| LobbyError::AlreadyWaiting(connection_id.to_string()))?;
        self.registry.set_idle(connection_id, true);
        Ok(ticket)
    }

    /// Stop a search. Returns `true` if the connection was waiting.
    pub fn leave_queue(&mut self, connection_id: &ConnectionId) -> bool {
        let was_waiting = self.queue.remove(connection_id).is_some();
        self.registry.set_idle(connection_id, false);
        was_waiting
    }

    /// Stop the search identified by `ticket`, leaving newer searches alone.
    pub fn expire_ticket(&mut self, connection_id: &ConnectionId, ticket: Ticket) -> bool {
        if self.queue.remove_ticket(connection_id, ticket) {
            self.registry.set_idle(connection_id, false);
            true
        } else {
            false
        }
    }

    /// Try to pair `seeker` with a random idle partner.
    pub fn try_pair(&mut self, seeker: &ConnectionId) -> Option<Pairing> {
        self.try_pair_with(seeker, &mut rand::thread_rng())
    }

    /// Pick a partner for `seeker` and move both from the queue to the pairing
    /// set.
    ///
    /// Returns `None` without touching any state if `seeker` is not waiting or
    /// no partner is idle.
    pub fn try_pair_with<R: Rng + ?Sized>(
        &mut self,
        seeker: &ConnectionId,
        rng: &mut R,
    ) -> Option<Pairing> {
        if !self.queue.contains(seeker) {
            return None;
        }
        let seeker_entry = self.registry.get(seeker)?.clone();
        let partner_entry = self.registry.pick_idle_peer(seeker, rng)?.clone();

        for entry in [&seeker_entry, &partner_entry] {
            self.queue.remove(&entry.connection_id);
            self.registry.set_idle(&entry.connection_id, false);
            self.pairing.insert(entry.connection_id.clone());
        }

        Some(Pairing {
            seeker: ConnectionEntry {
                idle: false,
                ..seeker_entry
            },
            partner: ConnectionEntry {
                idle: false,
                ..partner_entry
            },
        })
    }

    /// Release a connection from the pairing set once its session is settled.
    pub fn finish_pairing(&mut self, connection_id: &ConnectionId) -> bool {
        self.pairing.remove(connection_id)
    }

    /// Put a partner back into the queue after a failed provisioning.
    ///
    /// Returns the new ticket, or `None` if the partner has disconnected or is
    /// already waiting again.
    pub fn requeue(&mut self, connection_id: &ConnectionId) -> Option<Ticket> {
        self.pairing.remove(connection_id);
        self.enter_queue(connection_id).ok()
    }
}
