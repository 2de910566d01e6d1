//! Inbound and outbound relay events, and the fan-out plan that ties them to
//! recipients.

use serde_json::{Map, Value};

use super::{
    entity::UserEntry,
    value_object::{ConnectionId, MessageId, RoomName, Username},
};

/// Chat content plus whatever extra fields the client attached.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatPayload {
    pub content: String,
    pub message_id: Option<MessageId>,
    /// Client fields echoed back verbatim to recipients
    pub extra: Map<String, Value>,
}

/// An event received from a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Room-scoped chat. Unknown kinds and unparseable frames land here too.
    Chat(ChatPayload),
    JoinRoom { room: Option<String> },
    LeaveRoom { room: Option<String> },
    PrivateMessage {
        to: Option<String>,
        content: String,
        message_id: Option<MessageId>,
    },
    SetIdentity { username: String },
    ListIdentities,
    Ping,
}

impl InboundEvent {
    /// Wrap arbitrary text as chat content.
    pub fn raw_chat(text: impl Into<String>) -> Self {
        Self::Chat(ChatPayload {
            content: text.into(),
            ..ChatPayload::default()
        })
    }
}

/// Server-wide announcements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemNotice {
    Connected { total: usize },
    Disconnected { username: Username, total: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The relay processed the message. No failure status is ever computed.
    Delivered,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
        }
    }
}

/// An event addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    Welcome {
        client_id: ConnectionId,
    },
    System(SystemNotice),
    Chat {
        from: ConnectionId,
        username: Username,
        room: RoomName,
        payload: ChatPayload,
    },
    DeliveryStatus {
        message_id: MessageId,
        status: DeliveryStatus,
    },
    RoomJoined {
        room: RoomName,
    },
    RoomLeft {
        room: RoomName,
    },
    UserJoinedRoom {
        room: RoomName,
        user: ConnectionId,
        username: Username,
    },
    PrivateMessage {
        from: Username,
        content: String,
    },
    UsernameSet {
        username: Username,
    },
    UsersList {
        users: Vec<UserEntry>,
    },
    Pong,
}

/// One planned send.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub target: ConnectionId,
    pub event: OutboundEvent,
}

/// Ordered list of sends computed from state at the moment of processing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FanoutPlan {
    pub deliveries: Vec<Delivery>,
    /// Broadcast a fresh users list after executing the deliveries
    pub refresh_users_list: bool,
}

impl FanoutPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: ConnectionId, event: OutboundEvent) {
        self.deliveries.push(Delivery { target, event });
    }

    /// Address a copy of `event` to every target.
    pub fn push_all<I>(&mut self, targets: I, event: &OutboundEvent)
    where
        I: IntoIterator<Item = ConnectionId>,
    {
        for target in targets {
            self.push(target, event.clone());
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    /// Events addressed to `target`, in plan order.
    #[cfg(test)]
    pub fn events_for(&self, target: ConnectionId) -> Vec<&OutboundEvent> {
        self.deliveries
            .iter()
            .filter(|d| d.target == target)
            .map(|d| &d.event)
            .collect()
    }
}
