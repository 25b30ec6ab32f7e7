//! UseCase: ルーム入室処理（`chat-opened`）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 認証済みルームへの入室と、入室時の通知（joined / name / updateUserCount）
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルーム接続の入室
//! - エッジケース：特権接続（family）の `chat-opened` は無視される

use std::sync::Arc;

use rand::Rng;

use crate::domain::{ConnectionContext, NameRepository};

use super::{
    display_name::resolve_display_name,
    room_directory::{Greeting, RoomDirectory},
};

/// ルーム入室のユースケース
pub struct JoinRoomUseCase {
    room_directory: Arc<RoomDirectory>,
    name_repository: Arc<dyn NameRepository>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(
        room_directory: Arc<RoomDirectory>,
        name_repository: Arc<dyn NameRepository>,
    ) -> Self {
        Self {
            room_directory,
            name_repository,
        }
    }

    /// 認証時に確定したルームへ入室する
    ///
    /// # Returns
    ///
    /// * `Some(usize)` - 入室後のメンバー数
    /// * `None` - 特権接続など、入室するルームがない場合
    pub async fn execute(&self, context: &ConnectionContext) -> Option<usize> {
        let (Some(room_id), Some(room_name)) = (context.decoded_room(), context.decoded_room_name())
        else {
            tracing::debug!(
                "Ignoring chat-opened from '{}': no decoded room",
                context.connection_id
            );
            return None;
        };

        let display_name = resolve_display_name(self.name_repository.as_ref()).await;
        let (image, identifier) = random_avatar();
        let greeting = Greeting {
            display_name,
            room_name: room_name.to_string(),
            image,
            identifier,
        };

        Some(
            self.room_directory
                .join(room_id, &context.connection_id, greeting)
                .await,
        )
    }
}

/// アバター画像の番号（"0"〜"9"）と、クライアント識別用の乱数
fn random_avatar() -> (String, String) {
    let mut rng = rand::thread_rng();
    let image = rng.gen_range(0..10).to_string();
    let identifier = rng.gen_range(0.0..1.0_f64).to_string();
    (image, identifier)
}
