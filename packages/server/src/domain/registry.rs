//! Registry of live connections.

use std::collections::BTreeMap;

use super::{entity::Connection, value_object::ConnectionId};

/// Tracks every live connection.
///
/// Keyed by [`ConnectionId`], so iteration follows accept order.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: BTreeMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns false if the id was already present.
    pub fn add(&mut self, connection: Connection) -> bool {
        if self.connections.contains_key(&connection.id) {
            return false;
        }
        self.connections.insert(connection.id, connection);
        true
    }

    /// Unregister a connection, returning it if it was live.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// All live connections in accept order.
    pub fn all(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Ids of all live connections in accept order.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }
}
