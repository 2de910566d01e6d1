//! InMemory ChatState Repository 実装
//!
//! ドメイン層が定義する ChatStateRepository trait の具体的な実装。
//! プロセス内の Mutex を唯一のストレージとして使用します。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatState, ChatStateGuard, ChatStateRepository};

/// インメモリ ChatState Repository 実装
///
/// 接続・ルーム・ユーザー名をまとめて 1 つの Mutex で保護する。
#[derive(Debug, Default)]
pub struct InMemoryChatStateRepository {
    state: Mutex<ChatState>,
}

impl InMemoryChatStateRepository {
    /// 空の状態で作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStateRepository for InMemoryChatStateRepository {
    async fn lock(&self) -> ChatStateGuard<'_> {
        self.state.lock().await
    }
}
