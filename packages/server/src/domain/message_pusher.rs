//! MessagePusher trait 定義
//!
//! 接続中のクライアントへイベントを送信するためのインターフェース。
//! 具体的な実装（WebSocket など）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, DeliveryError, ServerEvent};

/// クライアントへの送信チャンネル（エンコード済みのフレームを流す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
///
/// - `push_to`: 単一のクライアントへ送信（失敗はエラーとして返す）
/// - `broadcast`: 複数のクライアントへ送信（一部の失敗は許容し、送信できた数を返す）
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// クライアントの登録を解除（未登録の場合は何もしない）
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 登録中のクライアント数
    async fn client_count(&self) -> usize;

    /// 特定のクライアントへイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), DeliveryError>;

    /// 複数のクライアントへイベントをブロードキャスト
    async fn broadcast(&self, targets: &[ConnectionId], event: &ServerEvent) -> usize;
}
