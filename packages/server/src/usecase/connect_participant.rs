//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続の登録、"general" への自動参加、歓迎メッセージと接続数通知
//!
//! ### なぜこのテストが必要か
//! - 接続直後から「ちょうど 1 つのルーム」に所属することを保証
//! - 新規接続者を含む全員に接続数が通知されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続
//! - 異常系：同じ接続 ID の二重登録

use crate::domain::{ChatState, Connection, FanoutPlan, OutboundEvent, RoomName, SystemNotice};

use super::error::ConnectError;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase;

impl ConnectParticipantUseCase {
    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `state` - リレーの状態（ロック取得済み）
    /// * `connection` - 受け付けた接続
    ///
    /// # Returns
    ///
    /// * `Ok(FanoutPlan)` - 歓迎メッセージと接続数通知の送信計画
    /// * `Err(ConnectError)` - 接続失敗
    pub fn execute(
        state: &mut ChatState,
        connection: Connection,
    ) -> Result<FanoutPlan, ConnectError> {
        let id = connection.id;

        // 1. 登録（重複チェック込み）
        if !state.connections.add(connection) {
            return Err(ConnectError::DuplicateConnectionId(id));
        }

        // 2. "general" へ自動参加
        state.rooms.join(id, RoomName::general());

        // 3. 歓迎メッセージ（本人）と接続数通知（新規接続者を含む全員）
        let mut plan = FanoutPlan::new();
        plan.push(id, OutboundEvent::Welcome { client_id: id });
        let notice = OutboundEvent::System(SystemNotice::Connected {
            total: state.connections.count(),
        });
        plan.push_all(state.connections.ids(), &notice);

        Ok(plan)
    }
}
