//! UseCase: 受信イベントのルーティング
//!
//! 受信イベントと現在の状態から、誰に何を送るか（FanoutPlan）を決定する。
//! 送信そのものは行わず、Gateway が計画を実行する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - EventRouter::route() の種類ごとの振る舞い
//!
//! ### なぜこのテストが必要か
//! - チャットがルーム内の他メンバーにのみ届き、送信者には受領通知が届くこと
//! - ルーム移動が常に「ちょうど 1 つのルーム」を保つこと
//! - 空のユーザー名や存在しない宛先が黙って無視されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：チャット、ルーム参加・退出、プライベートメッセージ、名前設定、一覧、ping
//! - エッジケース：宛先不明、非メンバーの退出、名前の重複

use crate::domain::{
    ChatPayload, ChatState, ConnectionId, DeliveryStatus, FanoutPlan, InboundEvent, MessageId,
    MessageIdFactory, OutboundEvent, RoomName,
};

/// Pure routing logic: (state, event, source) → fan-out plan.
pub struct EventRouter;

impl EventRouter {
    /// Apply `event` from `from` to `state` and compute who receives what.
    pub fn route(state: &mut ChatState, from: ConnectionId, event: InboundEvent) -> FanoutPlan {
        match event {
            InboundEvent::Chat(payload) => Self::chat(state, from, payload),
            InboundEvent::JoinRoom { room } => Self::join_room(state, from, room),
            InboundEvent::LeaveRoom { room } => Self::leave_room(state, from, room),
            InboundEvent::PrivateMessage {
                to,
                content,
                message_id,
            } => Self::private_message(state, from, to, content, message_id),
            InboundEvent::SetIdentity { username } => Self::set_identity(state, from, &username),
            InboundEvent::ListIdentities => {
                let mut plan = FanoutPlan::new();
                plan.push(
                    from,
                    OutboundEvent::UsersList {
                        users: state.users_list(),
                    },
                );
                plan
            }
            InboundEvent::Ping => {
                let mut plan = FanoutPlan::new();
                plan.push(from, OutboundEvent::Pong);
                plan
            }
        }
    }

    fn chat(state: &ChatState, from: ConnectionId, mut payload: ChatPayload) -> FanoutPlan {
        let room = state.rooms.current_room(from);
        let username = state.identities.name_of(from);
        let message_id = MessageIdFactory::or_generate(payload.message_id.take());
        payload.message_id = Some(message_id.clone());

        let echo = OutboundEvent::Chat {
            from,
            username,
            room: room.clone(),
            payload,
        };

        let mut plan = FanoutPlan::new();
        plan.push_all(others_in(state, &room, from), &echo);
        plan.push(from, delivered(message_id));
        plan
    }

    fn join_room(state: &mut ChatState, from: ConnectionId, room: Option<String>) -> FanoutPlan {
        let room = state.rooms.join(from, RoomName::or_general(room));
        let username = state.identities.name_of(from);

        let mut plan = FanoutPlan::new();
        plan.push(from, OutboundEvent::RoomJoined { room: room.clone() });
        let notice = OutboundEvent::UserJoinedRoom {
            room: room.clone(),
            user: from,
            username,
        };
        plan.push_all(others_in(state, &room, from), &notice);
        plan.refresh_users_list = true;
        plan
    }

    fn leave_room(state: &mut ChatState, from: ConnectionId, room: Option<String>) -> FanoutPlan {
        let room = RoomName::or_general(room);
        if !state.rooms.leave(from, &room) {
            tracing::debug!("Connection {} is not in room '{}'; ignoring leave", from, room);
            return FanoutPlan::new();
        }
        // A connection always belongs to exactly one room.
        if !state.rooms.has_room(from) {
            state.rooms.join(from, RoomName::general());
        }

        let mut plan = FanoutPlan::new();
        plan.push(from, OutboundEvent::RoomLeft { room });
        plan
    }

    fn private_message(
        state: &ChatState,
        from: ConnectionId,
        to: Option<String>,
        content: String,
        message_id: Option<MessageId>,
    ) -> FanoutPlan {
        let mut plan = FanoutPlan::new();

        // Display names are not unique: the earliest connection wins.
        let target = to.as_deref().and_then(|name| {
            state
                .connections
                .ids()
                .into_iter()
                .find(|id| state.identities.name_of(*id).as_str() == name)
        });

        match target {
            Some(target) => plan.push(
                target,
                OutboundEvent::PrivateMessage {
                    from: state.identities.name_of(from),
                    content,
                },
            ),
            None => tracing::debug!(
                "No recipient named {:?} for private message from {}",
                to,
                from
            ),
        }

        plan.push(from, delivered(MessageIdFactory::or_generate(message_id)));
        plan
    }

    fn set_identity(state: &mut ChatState, from: ConnectionId, username: &str) -> FanoutPlan {
        if !state.identities.set_name(from, username) {
            tracing::debug!("Rejected empty username from {}", from);
            return FanoutPlan::new();
        }

        let mut plan = FanoutPlan::new();
        plan.push(
            from,
            OutboundEvent::UsernameSet {
                username: state.identities.name_of(from),
            },
        );
        plan.refresh_users_list = true;
        plan
    }
}

/// Current members of `room` except `exclude`.
fn others_in(
    state: &ChatState,
    room: &RoomName,
    exclude: ConnectionId,
) -> impl Iterator<Item = ConnectionId> {
    state
        .rooms
        .members_of(room)
        .into_iter()
        .filter(move |member| *member != exclude)
}

fn delivered(message_id: MessageId) -> OutboundEvent {
    OutboundEvent::DeliveryStatus {
        message_id,
        status: DeliveryStatus::Delivered,
    }
}
