//! UseCase: ルームイベント中継処理（`newMessage` / `typing` / `stoppedTyping`）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - ルーム内の送信者以外への中継と、`newMessage` のプッシュ通知
//!
//! ### なぜこのテストが必要か
//! - 送信者自身には中継されないことを保証
//! - プッシュ通知の失敗が送信者に `messageError` として通知されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージの中継とプッシュ通知
//! - 異常系：プッシュ通知の失敗、ルームを持たない接続からのイベント
//! - エッジケース：送信者のみがルームにいる場合（中継対象なし）

use std::sync::Arc;

use serde_json::Value;

use crate::domain::{
    ConnectionContext, MessagePusher, PushNotification, PushNotifier, RoomEvent, RoomId,
    ServerEvent,
};

use super::{error::SendMessageError, room_directory::RoomDirectory};

/// ルームイベント中継のユースケース
pub struct SendMessageUseCase {
    room_directory: Arc<RoomDirectory>,
    /// PushNotifier（ルーム外への通知の抽象化）
    push_notifier: Arc<dyn PushNotifier>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        room_directory: Arc<RoomDirectory>,
        push_notifier: Arc<dyn PushNotifier>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            room_directory,
            push_notifier,
            message_pusher,
        }
    }

    /// ルームイベントを中継する
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - 中継できたメンバー数
    /// * `Err(SendMessageError)` - ルームがない、またはプッシュ通知に失敗した
    ///   （後者は送信者に `messageError` を通知済み）
    pub async fn execute(
        &self,
        context: &ConnectionContext,
        event: RoomEvent,
    ) -> Result<usize, SendMessageError> {
        let Some(room_id) = context.decoded_room() else {
            return Err(SendMessageError::NoDecodedRoom(
                context.connection_id.to_string(),
            ));
        };

        // 1. 送信者以外のメンバーへ中継
        let notification = match &event {
            RoomEvent::NewMessage(data) => Some(build_notification(room_id, data)),
            _ => None,
        };
        let delivered = self
            .room_directory
            .broadcast(room_id, &ServerEvent::Relay(event), &context.connection_id)
            .await;

        // 2. newMessage のみプッシュ通知
        if let Some(notification) = notification
            && let Err(e) = self.push_notifier.notify(notification).await
        {
            tracing::error!("Push notification for room '{}' failed: {}", room_id, e);
            let error = ServerEvent::MessageError {
                message: e.to_string(),
            };
            if let Err(push_error) = self
                .message_pusher
                .push_to(&context.connection_id, &error)
                .await
            {
                tracing::warn!(
                    "Failed to report message error to '{}': {}",
                    context.connection_id,
                    push_error
                );
            }
            return Err(e.into());
        }

        Ok(delivered)
    }
}

fn build_notification(room_id: &RoomId, data: &Value) -> PushNotification {
    let field = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_string);
    PushNotification {
        room_id: room_id.clone(),
        message: field("message"),
        image: field("image"),
        p256dh: field("p256dh"),
    }
}
