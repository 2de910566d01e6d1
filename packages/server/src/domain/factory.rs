//! Domain factories for creating identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

use super::value_object::{ConnectionId, MessageId};

/// Factory for allocating ConnectionId instances.
///
/// Ids start at 1 and increase monotonically; they are never reused for the
/// lifetime of the factory.
#[derive(Debug)]
pub struct ConnectionIdFactory {
    next: AtomicU64,
}

impl ConnectionIdFactory {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next id.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionIdFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory for generating MessageId instances.
///
/// Used when a client omits the correlation id of a message.
pub struct MessageIdFactory;

impl MessageIdFactory {
    /// Generate a new MessageId with a random UUID v4.
    pub fn generate() -> MessageId {
        MessageId::from_uuid(uuid::Uuid::new_v4())
    }

    /// Use the client-supplied id when present, otherwise generate one.
    pub fn or_generate(id: Option<MessageId>) -> MessageId {
        id.unwrap_or_else(Self::generate)
    }
}
