//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{DisplayName, RepositoryError, RoomId, Session};

/// Session Repository trait
///
/// セッション（room_id / token / name）の永続化を抽象化する。
/// 期限切れのセッションは存在しないものとして扱う。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// room_id でセッションを検索
    async fn find_by_room_id(&self, room_id: &RoomId) -> Result<Option<Session>, RepositoryError>;

    /// セッションを作成（room_id が重複する場合は `DuplicateRoomId`）
    async fn create(&self, session: Session) -> Result<(), RepositoryError>;

    /// 期限切れのセッションを削除し、削除した件数を返す
    async fn purge_expired(&self) -> Result<usize, RepositoryError>;

    /// 保持しているセッション数を取得
    async fn count(&self) -> usize;
}

/// Name Repository trait
///
/// 匿名の表示名プール。予約されていない名前からランダムに 1 つ返す。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NameRepository: Send + Sync {
    async fn random_name(&self) -> Result<DisplayName, RepositoryError>;
}
