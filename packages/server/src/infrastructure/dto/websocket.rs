//! WebSocket message DTOs for the chat relay.
//!
//! Inbound frames are JSON objects discriminated by `type`; anything that
//! cannot be read as one of the known shapes is relayed as chat content.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{
    ChatPayload, InboundEvent, MessageId, OutboundEvent, SystemNotice, Timestamp, UserEntry,
};

/// Text of the welcome message sent on connect
pub const WELCOME_MESSAGE: &str = "Welcome to the Hiroba chat relay!";

/// Fields the server sets on a chat echo; client values for these are dropped
const SERVER_CHAT_FIELDS: [&str; 7] = [
    "type",
    "content",
    "messageId",
    "username",
    "room",
    "from",
    "timestamp",
];

/// Message type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    // client -> server (Message is also the chat echo)
    Message,
    JoinRoom,
    LeaveRoom,
    PrivateMessage,
    SetUsername,
    GetUsers,
    Ping,
    // server -> client
    Welcome,
    System,
    DeliveryStatus,
    RoomJoined,
    RoomLeft,
    UserJoinedRoom,
    UsernameSet,
    UsersList,
    Pong,
}

/// Errors while reading an inbound frame
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("frame is an empty JSON object")]
    EmptyObject,
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    content: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    message_id: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RoomRequest {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    room: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrivateMessageRequest {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    to: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    content: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SetUsernameRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    username: String,
}

/// Decode one inbound frame. Never fails: unreadable input becomes chat.
pub fn decode_inbound(raw: &str) -> InboundEvent {
    match parse_inbound(raw) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Failed to parse message ({}); relaying as chat", e);
            InboundEvent::raw_chat(raw)
        }
    }
}

/// Strict decoding of one inbound frame.
pub fn parse_inbound(raw: &str) -> Result<InboundEvent, DecodeError> {
    let Value::Object(mut fields) = serde_json::from_str::<Value>(raw)? else {
        return Err(DecodeError::NotAnObject);
    };
    if fields.is_empty() {
        return Err(DecodeError::EmptyObject);
    }

    // Unknown or missing types are chat.
    let kind = fields
        .remove("type")
        .and_then(|t| serde_json::from_value::<MessageType>(t).ok())
        .unwrap_or(MessageType::Message);
    let body = Value::Object(fields);

    let event = match kind {
        MessageType::JoinRoom => {
            let req: RoomRequest = serde_json::from_value(body)?;
            InboundEvent::JoinRoom { room: req.room }
        }
        MessageType::LeaveRoom => {
            let req: RoomRequest = serde_json::from_value(body)?;
            InboundEvent::LeaveRoom { room: req.room }
        }
        MessageType::PrivateMessage => {
            let req: PrivateMessageRequest = serde_json::from_value(body)?;
            InboundEvent::PrivateMessage {
                to: req.to,
                content: req.content,
                message_id: message_id(req.message_id),
            }
        }
        MessageType::SetUsername => {
            let req: SetUsernameRequest = serde_json::from_value(body)?;
            InboundEvent::SetIdentity {
                username: req.username,
            }
        }
        MessageType::GetUsers => InboundEvent::ListIdentities,
        MessageType::Ping => InboundEvent::Ping,
        _ => {
            let req: ChatRequest = serde_json::from_value(body)?;
            let mut extra = req.extra;
            for key in SERVER_CHAT_FIELDS {
                extra.remove(key);
            }
            InboundEvent::Chat(ChatPayload {
                content: req.content,
                message_id: message_id(req.message_id),
                extra,
            })
        }
    };
    Ok(event)
}

fn message_id(raw: Option<String>) -> Option<MessageId> {
    raw.and_then(|id| MessageId::new(id).ok())
}

/// Accept any JSON scalar where a string is expected.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Welcome message sent to a newly connected client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMessage {
    pub r#type: MessageType,
    pub message: String,
    pub client_id: u64,
    pub timestamp: String,
}

/// Server-wide notice (connect / disconnect)
#[derive(Debug, Clone, Serialize)]
pub struct SystemMessage {
    pub r#type: MessageType,
    pub message: String,
    pub timestamp: String,
}

/// Chat echo delivered to the other members of the sender's room
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub r#type: MessageType,
    /// Client fields, echoed verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub username: String,
    pub room: String,
    pub from: u64,
    pub timestamp: String,
}

/// Delivery receipt returned to a message's sender
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStatusMessage {
    pub r#type: MessageType,
    pub message_id: String,
    pub status: String,
    pub timestamp: String,
}

/// Room joined / left confirmation
#[derive(Debug, Clone, Serialize)]
pub struct RoomMessage {
    pub r#type: MessageType,
    pub room: String,
    pub message: String,
    pub timestamp: String,
}

/// Notice to existing members that someone joined their room
#[derive(Debug, Clone, Serialize)]
pub struct UserJoinedRoomMessage {
    pub r#type: MessageType,
    pub room: String,
    pub user: u64,
    pub username: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrivateMessage {
    pub r#type: MessageType,
    pub from: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsernameSetMessage {
    pub r#type: MessageType,
    pub username: String,
    pub message: String,
    pub timestamp: String,
}

/// One entry of a users list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub username: String,
    pub room: String,
}

impl From<&UserEntry> for UserInfo {
    fn from(entry: &UserEntry) -> Self {
        Self {
            id: entry.id.value(),
            username: entry.username.as_str().to_string(),
            room: entry.room.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsersListMessage {
    pub r#type: MessageType,
    pub users: Vec<UserInfo>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub r#type: MessageType,
    pub timestamp: String,
}

/// Any frame the server sends
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Welcome(WelcomeMessage),
    System(SystemMessage),
    Chat(ChatMessage),
    DeliveryStatus(DeliveryStatusMessage),
    Room(RoomMessage),
    UserJoinedRoom(UserJoinedRoomMessage),
    Private(PrivateMessage),
    UsernameSet(UsernameSetMessage),
    UsersList(UsersListMessage),
    Pong(PongMessage),
}

impl OutboundMessage {
    /// Render a domain event as a wire message stamped with `at`.
    pub fn from_event(event: &OutboundEvent, at: Timestamp) -> Self {
        let timestamp = at.to_string();
        match event {
            OutboundEvent::Welcome { client_id } => Self::Welcome(WelcomeMessage {
                r#type: MessageType::Welcome,
                message: WELCOME_MESSAGE.to_string(),
                client_id: client_id.value(),
                timestamp,
            }),
            OutboundEvent::System(notice) => Self::System(SystemMessage {
                r#type: MessageType::System,
                message: system_text(notice),
                timestamp,
            }),
            OutboundEvent::Chat {
                from,
                username,
                room,
                payload,
            } => Self::Chat(ChatMessage {
                r#type: MessageType::Message,
                extra: payload.extra.clone(),
                content: payload.content.clone(),
                message_id: payload.message_id.as_ref().map(|id| id.as_str().to_string()),
                username: username.as_str().to_string(),
                room: room.as_str().to_string(),
                from: from.value(),
                timestamp,
            }),
            OutboundEvent::DeliveryStatus { message_id, status } => {
                Self::DeliveryStatus(DeliveryStatusMessage {
                    r#type: MessageType::DeliveryStatus,
                    message_id: message_id.as_str().to_string(),
                    status: status.as_str().to_string(),
                    timestamp,
                })
            }
            OutboundEvent::RoomJoined { room } => Self::Room(RoomMessage {
                r#type: MessageType::RoomJoined,
                room: room.as_str().to_string(),
                message: format!("You joined room: {room}"),
                timestamp,
            }),
            OutboundEvent::RoomLeft { room } => Self::Room(RoomMessage {
                r#type: MessageType::RoomLeft,
                room: room.as_str().to_string(),
                message: format!("You left room: {room}"),
                timestamp,
            }),
            OutboundEvent::UserJoinedRoom {
                room,
                user,
                username,
            } => Self::UserJoinedRoom(UserJoinedRoomMessage {
                r#type: MessageType::UserJoinedRoom,
                room: room.as_str().to_string(),
                user: user.value(),
                username: username.as_str().to_string(),
                message: format!("{username} joined the room"),
                timestamp,
            }),
            OutboundEvent::PrivateMessage { from, content } => Self::Private(PrivateMessage {
                r#type: MessageType::PrivateMessage,
                from: from.as_str().to_string(),
                content: content.clone(),
                timestamp,
            }),
            OutboundEvent::UsernameSet { username } => Self::UsernameSet(UsernameSetMessage {
                r#type: MessageType::UsernameSet,
                username: username.as_str().to_string(),
                message: format!("Username set: {username}"),
                timestamp,
            }),
            OutboundEvent::UsersList { users } => Self::UsersList(UsersListMessage {
                r#type: MessageType::UsersList,
                users: users.iter().map(UserInfo::from).collect(),
                timestamp,
            }),
            OutboundEvent::Pong => Self::Pong(PongMessage {
                r#type: MessageType::Pong,
                timestamp,
            }),
        }
    }
}

fn system_text(notice: &SystemNotice) -> String {
    match notice {
        SystemNotice::Connected { total } => {
            format!("A new user connected. Total clients: {total}")
        }
        SystemNotice::Disconnected { username, total } => {
            format!("{username} disconnected. Total clients: {total}")
        }
    }
}

/// Encode a domain event as one JSON text frame.
pub fn encode_outbound(event: &OutboundEvent, at: Timestamp) -> Result<String, serde_json::Error> {
    serde_json::to_string(&OutboundMessage::from_event(event, at))
}
