//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断時の待機キュー・接続レジストリ・ルームからの削除
//!
//! ### なぜこのテストが必要か
//! - 切断した接続が後からマッチ相手として選ばれないことを保証
//! - 所属していたルームの残りのメンバーに人数と退出が通知されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：待機中の特権接続の切断、ルーム接続の切断
//! - エッジケース：どこにも所属していない接続の切断

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, Lobby, MessagePusher, RoomId};

use super::room_directory::RoomDirectory;

/// 切断処理の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectReport {
    /// 待機キューから外された場合は true
    pub was_waiting: bool,
    /// 退出したルーム
    pub rooms: Vec<RoomId>,
}

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Lobby（接続レジストリ + 待機キュー）
    lobby: Arc<Mutex<Lobby>>,
    room_directory: Arc<RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        lobby: Arc<Mutex<Lobby>>,
        room_directory: Arc<RoomDirectory>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            lobby,
            room_directory,
            message_pusher,
        }
    }

    /// 参加者切断を実行
    pub async fn execute(&self, connection_id: &ConnectionId) -> DisconnectReport {
        // 1. 待機キューと接続レジストリから削除
        let was_waiting = {
            let mut lobby = self.lobby.lock().await;
            let was_waiting = lobby.is_waiting(connection_id);
            lobby.remove(connection_id);
            was_waiting
        };

        // 2. 所属していたルームから削除し、残りのメンバーに通知
        let rooms = self.room_directory.disconnect_cleanup(connection_id).await;

        // 3. MessagePusher から登録解除
        self.message_pusher.unregister_client(connection_id).await;

        tracing::info!(
            "Connection '{}' disconnected (waiting: {}, rooms: {})",
            connection_id,
            was_waiting,
            rooms.len()
        );
        DisconnectReport { was_waiting, rooms }
    }
}
