//! UseCase: ルーム退室処理（`leaveRoom`）

use std::sync::Arc;

use crate::domain::ConnectionContext;

use super::room_directory::RoomDirectory;

/// ルーム退室のユースケース
pub struct LeaveRoomUseCase {
    room_directory: Arc<RoomDirectory>,
}

impl LeaveRoomUseCase {
    pub fn new(room_directory: Arc<RoomDirectory>) -> Self {
        Self { room_directory }
    }

    /// 認証時に確定したルームから退室する。入室していなければ何もしない。
    pub async fn execute(&self, context: &ConnectionContext) -> Option<usize> {
        let Some(room_id) = context.decoded_room() else {
            tracing::debug!(
                "Ignoring leaveRoom from '{}': no decoded room",
                context.connection_id
            );
            return None;
        };
        self.room_directory
            .leave(room_id, &context.connection_id)
            .await
    }
}
