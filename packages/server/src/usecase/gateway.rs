//! UseCase: 接続ゲートウェイ
//!
//! トランスポートからのコールバック（open / message / close / error）を
//! 受け取り、状態のロックを 1 回だけ取得した上で各ユースケースを実行し、
//! 得られた送信計画をそのまま実行する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectionGateway の on_open / on_message / on_close / on_error
//! - 送信計画の実行（エンコード・送信・users_list の再配信）
//!
//! ### なぜこのテストが必要か
//! - 1 つの接続への送信失敗が他の接続への配信を止めないことを保証
//! - 切断処理が二重に実行されても状態が壊れないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続・チャット・切断の一連の流れ
//! - 異常系：閉じた接続への送信、未登録接続からのメッセージ、二重切断

use std::{collections::BTreeMap, fmt::Display, sync::Arc};

use crate::{
    domain::{
        ChatState, ChatStateRepository, Connection, ConnectionId, ConnectionIdFactory,
        FanoutPlan, MessageSink, OutboundEvent, Timestamp,
    },
    infrastructure::dto::websocket::{decode_inbound, encode_outbound},
};

use super::{
    connect_participant::ConnectParticipantUseCase,
    disconnect_participant::DisconnectParticipantUseCase, route_event::EventRouter,
};

/// Point-in-time counters of the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySnapshot {
    /// Number of live connections
    pub connections: usize,
    /// Member count per non-empty room
    pub room_sizes: BTreeMap<String, usize>,
}

/// 接続ゲートウェイ
pub struct ConnectionGateway {
    repository: Arc<dyn ChatStateRepository>,
    ids: ConnectionIdFactory,
}

impl ConnectionGateway {
    /// 新しいゲートウェイを作成
    pub fn new(repository: Arc<dyn ChatStateRepository>) -> Self {
        Self {
            repository,
            ids: ConnectionIdFactory::new(),
        }
    }

    /// 接続受け付け時の処理
    ///
    /// 接続 ID を払い出して登録し、歓迎メッセージと接続数通知を送信する。
    pub async fn on_open(&self, sink: Arc<dyn MessageSink>) -> ConnectionId {
        let id = self.ids.next_id();
        let connection = Connection::new(id, sink, Timestamp::now());

        let mut state = self.repository.lock().await;
        match ConnectParticipantUseCase::execute(&mut state, connection) {
            Ok(plan) => {
                tracing::info!(
                    "Connection {} opened. Total clients: {}",
                    id,
                    state.connections.count()
                );
                execute_plan(&state, &plan);
            }
            // ID は単調増加で払い出すため到達しない
            Err(e) => tracing::error!("Failed to register connection: {}", e),
        }
        id
    }

    /// 受信フレームの処理
    pub async fn on_message(&self, id: ConnectionId, raw: &str) {
        let event = decode_inbound(raw);

        let mut state = self.repository.lock().await;
        if !state.connections.contains(id) {
            tracing::debug!("Ignoring message from unregistered connection {}", id);
            return;
        }
        tracing::debug!("Connection {} sent {:?}", id, event);
        let plan = EventRouter::route(&mut state, id, event);
        execute_plan(&state, &plan);
    }

    /// 切断時の処理
    ///
    /// 2 回目以降の呼び出しは何もしない。
    pub async fn on_close(&self, id: ConnectionId) {
        let mut state = self.repository.lock().await;
        match DisconnectParticipantUseCase::execute(&mut state, id) {
            Ok(plan) => {
                tracing::info!(
                    "Connection {} closed. Total clients: {}",
                    id,
                    state.connections.count()
                );
                execute_plan(&state, &plan);
            }
            Err(e) => tracing::debug!("Skipping cleanup: {}", e),
        }
    }

    /// トランスポートエラー時の処理（警告を出して切断処理を行う）
    pub async fn on_error(&self, id: ConnectionId, err: impl Display) {
        tracing::warn!("Transport error on connection {}: {}", id, err);
        self.on_close(id).await;
    }

    /// 現在の接続数とルームごとの人数
    pub async fn snapshot(&self) -> RelaySnapshot {
        let state = self.repository.lock().await;
        RelaySnapshot {
            connections: state.connections.count(),
            room_sizes: state
                .rooms
                .room_sizes()
                .into_iter()
                .map(|(room, size)| (room.into_string(), size))
                .collect(),
        }
    }
}

/// 送信計画を実行する
///
/// 送信失敗はログに記録して読み捨てる。失敗した送信の数を返す。
fn execute_plan(state: &ChatState, plan: &FanoutPlan) -> usize {
    let mut failures = 0;
    for delivery in &plan.deliveries {
        if !send_event(state, delivery.target, &delivery.event) {
            failures += 1;
        }
    }

    if plan.refresh_users_list {
        let event = OutboundEvent::UsersList {
            users: state.users_list(),
        };
        for target in state.connections.ids() {
            if !send_event(state, target, &event) {
                failures += 1;
            }
        }
    }
    failures
}

fn send_event(state: &ChatState, target: ConnectionId, event: &OutboundEvent) -> bool {
    let Some(connection) = state.connections.get(target) else {
        tracing::debug!("Dropping message for unknown connection {}", target);
        return false;
    };

    let payload = match encode_outbound(event, Timestamp::now()) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            return false;
        }
    };

    match connection.sink.send(payload) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to send message to connection {}: {}", target, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::Value;

    use super::*;
    use crate::{
        domain::{MockMessageSink, SinkError},
        infrastructure::repository::InMemoryChatStateRepository,
    };

    /// 受信したペイロードを記録するシンク
    #[derive(Default)]
    struct RecordingSink {
        received: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn messages(&self) -> Vec<Value> {
            self.received
                .lock()
                .unwrap()
                .iter()
                .map(|raw| serde_json::from_str(raw).unwrap())
                .collect()
        }

        fn of_type(&self, kind: &str) -> Vec<Value> {
            self.messages()
                .into_iter()
                .filter(|m| m["type"] == kind)
                .collect()
        }

        fn clear(&self) {
            self.received.lock().unwrap().clear();
        }
    }

    impl MessageSink for RecordingSink {
        fn send(&self, payload: String) -> Result<(), SinkError> {
            self.received.lock().unwrap().push(payload);
            Ok(())
        }
    }

    fn create_gateway() -> ConnectionGateway {
        ConnectionGateway::new(Arc::new(InMemoryChatStateRepository::new()))
    }

    async fn open(gateway: &ConnectionGateway) -> (ConnectionId, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let id = gateway.on_open(sink.clone()).await;
        (id, sink)
    }

    #[tokio::test]
    async fn test_on_open_sends_welcome_and_connection_count() {
        // テスト項目: 接続時に歓迎メッセージと接続数通知が送られる
        // given (前提条件):
        let gateway = create_gateway();
        let (first, first_sink) = open(&gateway).await;

        // when (操作):
        let (second, second_sink) = open(&gateway).await;

        // then (期待する結果):
        assert_eq!(first.value(), 1);
        assert_eq!(second.value(), 2);
        let welcome = second_sink.of_type("welcome");
        assert_eq!(welcome.len(), 1);
        assert_eq!(welcome[0]["clientId"], 2);
        let notices = first_sink.of_type("system");
        assert_eq!(
            notices.last().unwrap()["message"],
            "A new user connected. Total clients: 2"
        );
        assert_eq!(gateway.snapshot().await.connections, 2);
    }

    #[tokio::test]
    async fn test_on_message_chat_in_general_room() {
        // テスト項目: チャットは同じルームの他メンバーに届き、送信者には受領通知が返る
        // given (前提条件):
        let gateway = create_gateway();
        let (alice, alice_sink) = open(&gateway).await;
        let (_bob, bob_sink) = open(&gateway).await;
        alice_sink.clear();
        bob_sink.clear();

        // when (操作):
        gateway
            .on_message(alice, r#"{"type":"message","content":"hi","messageId":"m-1"}"#)
            .await;

        // then (期待する結果):
        let chats = bob_sink.of_type("message");
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0]["content"], "hi");
        assert_eq!(chats[0]["username"], "User 1");
        assert_eq!(chats[0]["room"], "general");
        assert!(alice_sink.of_type("message").is_empty());
        let receipts = alice_sink.of_type("delivery_status");
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0]["messageId"], "m-1");
        assert_eq!(receipts[0]["status"], "delivered");
    }

    #[tokio::test]
    async fn test_on_message_malformed_text_is_relayed_as_chat() {
        // テスト項目: JSON でないテキストはそのままチャット本文として中継される
        // given (前提条件):
        let gateway = create_gateway();
        let (alice, _alice_sink) = open(&gateway).await;
        let (_bob, bob_sink) = open(&gateway).await;

        // when (操作):
        gateway.on_message(alice, "not json").await;

        // then (期待する結果):
        let chats = bob_sink.of_type("message");
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0]["content"], "not json");
    }

    #[tokio::test]
    async fn test_on_message_from_unregistered_connection_is_ignored() {
        // テスト項目: 登録されていない接続からのメッセージは無視される
        // given (前提条件):
        let gateway = create_gateway();
        let (_alice, alice_sink) = open(&gateway).await;
        alice_sink.clear();

        // when (操作):
        gateway
            .on_message(ConnectionId::new(99), r#"{"type":"message","content":"hi"}"#)
            .await;

        // then (期待する結果):
        assert!(alice_sink.messages().is_empty());
    }

    #[tokio::test]
    async fn test_set_username_broadcasts_users_list() {
        // テスト項目: ユーザー名を設定すると全員に最新のユーザー一覧が配信される
        // given (前提条件):
        let gateway = create_gateway();
        let (alice, alice_sink) = open(&gateway).await;
        let (_bob, bob_sink) = open(&gateway).await;

        // when (操作):
        gateway
            .on_message(alice, r#"{"type":"set_username","username":"Alice"}"#)
            .await;

        // then (期待する結果):
        assert_eq!(alice_sink.of_type("username_set")[0]["username"], "Alice");
        let lists = bob_sink.of_type("users_list");
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0]["users"][0]["username"], "Alice");
        assert_eq!(lists[0]["users"][1]["username"], "User 2");
    }

    #[tokio::test]
    async fn test_on_close_notifies_remaining_and_cleans_up() {
        // テスト項目: 切断時に残りの接続へ通知され、状態から取り除かれる
        // given (前提条件):
        let gateway = create_gateway();
        let (alice, _alice_sink) = open(&gateway).await;
        let (_bob, bob_sink) = open(&gateway).await;
        gateway
            .on_message(alice, r#"{"type":"join_room","room":"random"}"#)
            .await;
        bob_sink.clear();

        // when (操作):
        gateway.on_close(alice).await;

        // then (期待する結果):
        let notices = bob_sink.of_type("system");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0]["message"], "User 1 disconnected. Total clients: 1");
        let lists = bob_sink.of_type("users_list");
        assert_eq!(lists[0]["users"].as_array().unwrap().len(), 1);
        let snapshot = gateway.snapshot().await;
        assert_eq!(snapshot.connections, 1);
        assert!(!snapshot.room_sizes.contains_key("random"));
    }

    #[tokio::test]
    async fn test_on_close_twice_is_noop() {
        // テスト項目: 同じ接続の切断処理を 2 回実行しても通知は 1 回だけ
        // given (前提条件):
        let gateway = create_gateway();
        let (alice, _alice_sink) = open(&gateway).await;
        let (_bob, bob_sink) = open(&gateway).await;
        bob_sink.clear();

        // when (操作):
        gateway.on_error(alice, "connection reset").await;
        gateway.on_close(alice).await;

        // then (期待する結果):
        assert_eq!(bob_sink.of_type("system").len(), 1);
        assert_eq!(gateway.snapshot().await.connections, 1);
    }

    #[tokio::test]
    async fn test_send_failure_does_not_block_other_recipients() {
        // テスト項目: 閉じた接続への送信失敗が他の接続への配信を妨げない
        // given (前提条件):
        let gateway = create_gateway();
        let mut broken = MockMessageSink::new();
        broken.expect_send().returning(|_| Err(SinkError::Closed));
        let broken_id = gateway.on_open(Arc::new(broken)).await;
        let (alice, alice_sink) = open(&gateway).await;
        let (_bob, bob_sink) = open(&gateway).await;

        // when (操作):
        gateway
            .on_message(alice, r#"{"type":"message","content":"hi"}"#)
            .await;

        // then (期待する結果):
        assert_eq!(broken_id.value(), 1);
        assert_eq!(bob_sink.of_type("message").len(), 1);
        assert_eq!(alice_sink.of_type("delivery_status").len(), 1);
    }

    #[test]
    fn test_execute_plan_counts_failures() {
        // テスト項目: 送信計画の実行で失敗した送信の数が返る
        // given (前提条件):
        let mut state = ChatState::new();
        let mut closed = MockMessageSink::new();
        closed.expect_send().times(1).returning(|_| Err(SinkError::Closed));
        let mut open_sink = MockMessageSink::new();
        open_sink.expect_send().times(1).returning(|_| Ok(()));
        state.connections.add(Connection::new(
            ConnectionId::new(1),
            Arc::new(closed),
            Timestamp::new(0),
        ));
        state.connections.add(Connection::new(
            ConnectionId::new(2),
            Arc::new(open_sink),
            Timestamp::new(0),
        ));
        let mut plan = FanoutPlan::new();
        plan.push_all(state.connections.ids(), &OutboundEvent::Pong);
        plan.push(ConnectionId::new(3), OutboundEvent::Pong);

        // when (操作):
        let failures = execute_plan(&state, &plan);

        // then (期待する結果):
        assert_eq!(failures, 2);
    }
}
