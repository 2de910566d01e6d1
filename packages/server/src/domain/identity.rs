//! Display names bound to connections.

use std::collections::HashMap;

use super::value_object::{ConnectionId, Username};

#[derive(Debug, Default)]
pub struct IdentityStore {
    names: HashMap<ConnectionId, Username>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a display name. Empty names are rejected and nothing changes.
    pub fn set_name(&mut self, conn: ConnectionId, name: &str) -> bool {
        match Username::new(name.to_string()) {
            Ok(username) => {
                self.names.insert(conn, username);
                true
            }
            Err(_) => false,
        }
    }

    /// The stored name, or `"User <id>"` if none was set.
    pub fn name_of(&self, conn: ConnectionId) -> Username {
        self.names
            .get(&conn)
            .cloned()
            .unwrap_or_else(|| Username::default_for(conn))
    }

    pub fn remove(&mut self, conn: ConnectionId) -> Option<Username> {
        self.names.remove(&conn)
    }

    /// Resolve every given connection to `(id, name)`, preserving input order.
    pub fn all_names<I>(&self, connections: I) -> Vec<(ConnectionId, Username)>
    where
        I: IntoIterator<Item = ConnectionId>,
    {
        connections
            .into_iter()
            .map(|conn| (conn, self.name_of(conn)))
            .collect()
    }
}
