//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{DeliveryError, RepositoryError};

/// 認証ゲートのエラー（常に接続拒否として扱う）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication error: token or room is missing")]
    MissingCredentials,

    #[error("Authentication error: room '{0}' does not exist")]
    UnknownRoom(String),

    #[error("Authentication error: token does not match room '{0}'")]
    TokenMismatch(String),

    #[error("Authentication error: session lookup failed: {0}")]
    Storage(String),
}

/// セッション作成のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionCreateError {
    #[error("Failed to store session: {0}")]
    Storage(#[from] RepositoryError),

    #[error("Could not allocate a unique room id after {0} attempts")]
    RoomIdExhausted(usize),
}

/// ランダムマッチのエラー（要求元の接続にのみ通知される）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("Only privileged connections can request a random match")]
    NotEligible,

    #[error("Connection '{0}' is not registered")]
    NotRegistered(String),

    #[error(transparent)]
    SessionCreate(#[from] SessionCreateError),

    #[error("Pairing task failed: {0}")]
    PairingTask(String),
}

/// ルームイベント中継のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("Connection '{0}' has no decoded room")]
    NoDecodedRoom(String),

    #[error("Push notification failed: {0}")]
    Notify(#[from] DeliveryError),
}
