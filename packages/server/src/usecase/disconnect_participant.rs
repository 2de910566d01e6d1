//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 参加者の切断処理（登録解除、ルーム・名前の削除、切断通知）
//!
//! ### なぜこのテストが必要か
//! - 切断した接続がどのルームにもユーザー一覧にも残らないことを保証
//! - 切断通知に最後の表示名が使われることを確認
//! - 後片付けがちょうど 1 回だけ行われることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と通知
//! - エッジケース：最後の参加者の切断（通知対象なし）
//! - 異常系：既に切断済みの接続の切断

use crate::domain::{ChatState, ConnectionId, FanoutPlan, OutboundEvent, SystemNotice};

use super::error::DisconnectError;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase;

impl DisconnectParticipantUseCase {
    /// 参加者切断を実行
    ///
    /// # Arguments
    ///
    /// * `state` - リレーの状態（ロック取得済み）
    /// * `id` - 切断する接続の ID
    ///
    /// # Returns
    ///
    /// * `Ok(FanoutPlan)` - 残りの全員への切断通知（ユーザー一覧の再配信を要求）
    /// * `Err(DisconnectError)` - 未登録または切断済み
    pub fn execute(state: &mut ChatState, id: ConnectionId) -> Result<FanoutPlan, DisconnectError> {
        // 1. 登録解除（二度目の切断はここで弾かれる）
        let Some(connection) = state.connections.remove(id) else {
            return Err(DisconnectError::NotConnected(id));
        };
        tracing::debug!(
            "Connection {} was open since {}",
            id,
            connection.connected_at
        );

        // 2. 名前を削除する前に最後の表示名を控えておく
        let username = state.identities.name_of(id);
        state.rooms.remove_everywhere(id);
        state.identities.remove(id);

        // 3. 残りの全員へ切断通知
        let mut plan = FanoutPlan::new();
        let notice = OutboundEvent::System(SystemNotice::Disconnected {
            username,
            total: state.connections.count(),
        });
        plan.push_all(state.connections.ids(), &notice);
        plan.refresh_users_list = true;

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        domain::{Connection, MockMessageSink, RoomName, Timestamp, Username},
        usecase::ConnectParticipantUseCase,
    };

    fn create_test_state(count: u64) -> ChatState {
        let mut state = ChatState::new();
        for id in 1..=count {
            let connection = Connection::new(
                ConnectionId::new(id),
                Arc::new(MockMessageSink::new()),
                Timestamp::new(0),
            );
            ConnectParticipantUseCase::execute(&mut state, connection).unwrap();
        }
        state
    }

    #[test]
    fn test_disconnect_participant_success() {
        // テスト項目: 切断するとルーム・名前・登録のすべてから消え、残りの全員に通知される
        // given (前提条件):
        let mut state = create_test_state(3);
        state.identities.set_name(ConnectionId::new(2), "Bob");

        // when (操作):
        let plan = DisconnectParticipantUseCase::execute(&mut state, ConnectionId::new(2)).unwrap();

        // then (期待する結果):
        assert_eq!(state.connections.count(), 2);
        assert!(
            !state
                .rooms
                .members_of(&RoomName::general())
                .contains(&ConnectionId::new(2))
        );
        assert!(
            state
                .users_list()
                .iter()
                .all(|u| u.id != ConnectionId::new(2))
        );

        let notice = OutboundEvent::System(SystemNotice::Disconnected {
            username: Username::new("Bob".to_string()).unwrap(),
            total: 2,
        });
        assert_eq!(plan.events_for(ConnectionId::new(1)), vec![&notice]);
        assert_eq!(plan.events_for(ConnectionId::new(3)), vec![&notice]);
        assert!(plan.events_for(ConnectionId::new(2)).is_empty());
        assert!(plan.refresh_users_list);
    }

    #[test]
    fn test_disconnect_last_participant() {
        // テスト項目: 最後の参加者が切断した場合は通知対象がない
        // given (前提条件):
        let mut state = create_test_state(1);

        // when (操作):
        let plan = DisconnectParticipantUseCase::execute(&mut state, ConnectionId::new(1)).unwrap();

        // then (期待する結果):
        assert!(plan.is_empty());
        assert_eq!(state.connections.count(), 0);
        assert!(state.rooms.room_sizes().is_empty());
    }

    #[test]
    fn test_disconnect_twice_fails() {
        // テスト項目: 二度目の切断はエラーになり、何も通知されない
        // given (前提条件):
        let mut state = create_test_state(2);
        DisconnectParticipantUseCase::execute(&mut state, ConnectionId::new(1)).unwrap();

        // when (操作):
        let result = DisconnectParticipantUseCase::execute(&mut state, ConnectionId::new(1));

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DisconnectError::NotConnected(ConnectionId::new(1)))
        );
        assert_eq!(state.connections.count(), 1);
    }
}
