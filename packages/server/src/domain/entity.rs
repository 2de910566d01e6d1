//! Core domain models for the chat relay.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{
    error::SinkError,
    value_object::{ConnectionId, RoomName, Timestamp, Username},
};

/// Fire-and-forget send capability of a live connection.
///
/// Implementations must not block: a send either enqueues the payload or
/// reports that the connection is gone.
#[cfg_attr(test, mockall::automock)]
pub trait MessageSink: Send + Sync {
    /// Enqueue one encoded payload for delivery.
    fn send(&self, payload: String) -> Result<(), SinkError>;
}

/// A live transport session.
#[derive(Clone)]
pub struct Connection {
    /// Process-unique identifier
    pub id: ConnectionId,
    /// Send capability (shared with the transport writer task)
    pub sink: Arc<dyn MessageSink>,
    /// Timestamp when the connection was accepted
    pub connected_at: Timestamp,
}

impl Connection {
    /// Create a new connection
    pub fn new(id: ConnectionId, sink: Arc<dyn MessageSink>, connected_at: Timestamp) -> Self {
        Self {
            id,
            sink,
            connected_at,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}

/// One row of the identity list: who is connected and where they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Connection identifier
    pub id: ConnectionId,
    /// Resolved display name
    pub username: Username,
    /// The connection's own current room
    pub room: RoomName,
}
