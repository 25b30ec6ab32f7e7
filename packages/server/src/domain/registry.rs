//! Connection registry.
//!
//! Tracks privileged connections only: their display name and whether they
//! are currently idle (eligible to be matched).

use std::collections::HashMap;

use rand::{Rng, seq::SliceRandom};

use super::{ConnectionEntry, ConnectionId};

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry, replacing any previous entry with the same id.
    pub fn register(&mut self, entry: ConnectionEntry) {
        self.entries.insert(entry.connection_id.clone(), entry);
    }

    /// Unknown ids are ignored; disconnect races are expected.
    pub fn set_idle(&mut self, connection_id: &ConnectionId, idle: bool) {
        if let Some(entry) = self.entries.get_mut(connection_id) {
            entry.idle = idle;
        }
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ConnectionEntry> {
        self.entries.remove(connection_id)
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&ConnectionEntry> {
        self.entries.get(connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.entries.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick an idle entry other than `excluding`, uniformly at random.
    ///
    /// Selection does not change any state.
    pub fn pick_idle_peer<R: Rng + ?Sized>(
        &self,
        excluding: &ConnectionId,
        rng: &mut R,
    ) -> Option<&ConnectionEntry> {
        let candidates: Vec<&ConnectionEntry> = self
            .entries
            .values()
            .filter(|entry| entry.idle && &entry.connection_id != excluding)
            .collect();
        candidates.choose(rng).copied()
    }
}
