//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 送信チャンネルの登録と、特権接続のみの Lobby 登録
//!
//! ### どのような状況を想定しているか
//! - 正常系：特権接続（family）の登録、ルーム接続の登録
//! - エッジケース：名前プールが空の場合の表示名

use std::sync::Arc;

use kakurega_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionContext, ConnectionEntry, Lobby, MessagePusher, NameRepository, PusherChannel,
    Timestamp,
};

use super::display_name::resolve_display_name;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Lobby（接続レジストリ + 待機キュー）
    lobby: Arc<Mutex<Lobby>>,
    /// 表示名プール
    name_repository: Arc<dyn NameRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        lobby: Arc<Mutex<Lobby>>,
        name_repository: Arc<dyn NameRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            lobby,
            name_repository,
            message_pusher,
            clock,
        }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `context` - 認証ゲートが作成した接続コンテキスト
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// 接続時刻（Domain Model）
    pub async fn execute(&self, context: &ConnectionContext, sender: PusherChannel) -> Timestamp {
        let connected_at = Timestamp::new(self.clock.now_millis());

        // 1. MessagePusher にクライアントを登録
        self.message_pusher
            .register_client(context.connection_id.clone(), sender)
            .await;

        // 2. 特権接続のみ Lobby（接続レジストリ）に登録
        if context.is_privileged() {
            let display_name = resolve_display_name(self.name_repository.as_ref()).await;
            tracing::info!(
                "Privileged connection '{}' registered as '{}'",
                context.connection_id,
                display_name
            );
            self.lobby.lock().await.register(ConnectionEntry::new(
                context.connection_id.clone(),
                display_name,
                connected_at,
            ));
        }

        connected_at
    }
}
