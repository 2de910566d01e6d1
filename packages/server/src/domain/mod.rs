//! Domain layer for the chat relay.
//!
//! This module contains the relay's state and invariants, independent of
//! the wire format and the transport.

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod identity;
pub mod registry;
pub mod repository;
pub mod room;
pub mod state;
pub mod value_object;

#[cfg(test)]
pub use entity::MockMessageSink;
pub use entity::{Connection, MessageSink, UserEntry};
pub use error::{SinkError, ValueObjectError};
pub use event::{
    ChatPayload, Delivery, DeliveryStatus, FanoutPlan, InboundEvent, OutboundEvent, SystemNotice,
};
pub use factory::{ConnectionIdFactory, MessageIdFactory};
pub use identity::IdentityStore;
pub use registry::ConnectionRegistry;
pub use repository::{ChatStateGuard, ChatStateRepository};
pub use room::RoomDirectory;
pub use state::ChatState;
pub use value_object::{ConnectionId, DEFAULT_ROOM, MessageId, RoomName, Timestamp, Username};
