//! UseCase: 認証ゲート
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AuthenticateUseCase::execute() メソッド
//! - room / token の組み合わせによる接続の受け入れ判定
//!
//! ### なぜこのテストが必要か
//! - `family` ルームは token なしで常に受け入れられること
//! - それ以外は、セッションが存在し token が一致する場合のみ受け入れること
//! - ストレージ障害時は必ず拒否すること（fail closed）
//!
//! ### どのような状況を想定しているか
//! - 正常系：正しい room / token、`family` ルーム
//! - 異常系：token / room の欠落、存在しない room、token 不一致、ストレージ障害

use std::sync::Arc;

use crate::domain::{
    ConnectionContext, ConnectionId, RoomId, SessionRepository, SessionToken,
    entity::PRIVILEGED_ROOM,
};

use super::error::AuthError;

/// ハンドシェイクで提示された認証情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub room: Option<String>,
    pub token: Option<String>,
}

impl Credentials {
    pub fn new(room: Option<String>, token: Option<String>) -> Self {
        Self { room, token }
    }

    /// フィールドごとに `self` を優先し、欠けている値を `fallback` で補う
    pub fn or(self, fallback: Credentials) -> Self {
        Self {
            room: non_empty(self.room).or_else(|| non_empty(fallback.room)),
            token: non_empty(self.token).or_else(|| non_empty(fallback.token)),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// 認証ゲートのユースケース
pub struct AuthenticateUseCase {
    /// Repository（セッションストアの抽象化）
    session_repository: Arc<dyn SessionRepository>,
}

impl AuthenticateUseCase {
    /// 新しい AuthenticateUseCase を作成
    pub fn new(session_repository: Arc<dyn SessionRepository>) -> Self {
        Self { session_repository }
    }

    /// 接続の受け入れ可否を判定
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionContext)` - 受け入れ（接続ごとのコンテキスト）
    /// * `Err(AuthError)` - 拒否
    pub async fn execute(&self, credentials: Credentials) -> Result<ConnectionContext, AuthError> {
        let connection_id = ConnectionId::generate();

        // 1. family ルームは token を確認せずに受け入れる
        if credentials.room.as_deref() == Some(PRIVILEGED_ROOM) {
            return Ok(ConnectionContext::privileged(connection_id));
        }

        // 2. room / token の存在確認
        let (Some(room), Some(token)) = (
            non_empty(credentials.room),
            non_empty(credentials.token),
        ) else {
            return Err(AuthError::MissingCredentials);
        };
        let room_id = RoomId::new(room.clone()).map_err(|_| AuthError::UnknownRoom(room))?;
        let token =
            SessionToken::new(token).map_err(|_| AuthError::TokenMismatch(room_id.to_string()))?;

        // 3. セッションの検索（障害時は拒否）
        let session = self
            .session_repository
            .find_by_room_id(&room_id)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or_else(|| AuthError::UnknownRoom(room_id.to_string()))?;

        // 4. token の照合
        if !session.admits(&token) {
            return Err(AuthError::TokenMismatch(room_id.to_string()));
        }

        Ok(ConnectionContext::room(connection_id, session.room_id, session.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RepositoryError, Session, Timestamp, repository::MockSessionRepository},
        infrastructure::repository::InMemorySessionRepository,
    };
    use kakurega_shared::time::SystemClock;

    async fn create_repository_with_r1() -> Arc<InMemorySessionRepository> {
        let repository = Arc::new(InMemorySessionRepository::new(Arc::new(SystemClock), None));
        repository
            .create(Session::new(
                RoomId::new("R1".to_string()).unwrap(),
                SessionToken::new("T1".to_string()).unwrap(),
                "Lounge".to_string(),
                false,
                Timestamp::new(0),
            ))
            .await
            .unwrap();
        repository
    }

    fn credentials(room: Option<&str>, token: Option<&str>) -> Credentials {
        Credentials::new(room.map(str::to_string), token.map(str::to_string))
    }

    #[tokio::test]
    async fn test_valid_room_and_token_is_admitted() {
        // テスト項目: 正しい room / token で接続が受け入れられる
        // given (前提条件):
        let usecase = AuthenticateUseCase::new(create_repository_with_r1().await);

        // when (操作):
        let result = usecase.execute(credentials(Some("R1"), Some("T1"))).await;

        // then (期待する結果):
        let context = result.unwrap();
        assert_eq!(context.decoded_room().map(RoomId::as_str), Some("R1"));
        assert_eq!(context.decoded_room_name(), Some("Lounge"));
        assert!(!context.is_privileged());
    }

    #[tokio::test]
    async fn test_wrong_token_is_rejected() {
        // テスト項目: token が一致しない場合は拒否される
        // given (前提条件):
        let usecase = AuthenticateUseCase::new(create_repository_with_r1().await);

        // when (操作):
        let result = usecase.execute(credentials(Some("R1"), Some("WRONG"))).await;

        // then (期待する結果):
        assert_eq!(result, Err(AuthError::TokenMismatch("R1".to_string())));
    }

    #[tokio::test]
    async fn test_unknown_room_is_rejected() {
        // テスト項目: 存在しない room は拒否される
        // given (前提条件):
        let usecase = AuthenticateUseCase::new(create_repository_with_r1().await);

        // when (操作):
        let result = usecase.execute(credentials(Some("R2"), Some("T1"))).await;

        // then (期待する結果):
        assert_eq!(result, Err(AuthError::UnknownRoom("R2".to_string())));
    }

    #[tokio::test]
    async fn test_missing_credentials_are_rejected() {
        // テスト項目: token または room が欠けている場合は拒否される
        // given (前提条件):
        let usecase = AuthenticateUseCase::new(create_repository_with_r1().await);

        for creds in [
            credentials(None, None),
            credentials(Some("R1"), None),
            credentials(None, Some("T1")),
            credentials(Some("R1"), Some("")),
        ] {
            // when (操作):
            let result = usecase.execute(creds).await;

            // then (期待する結果):
            assert_eq!(result, Err(AuthError::MissingCredentials));
        }
    }

    #[tokio::test]
    async fn test_family_room_is_always_admitted() {
        // テスト項目: family ルームは token に関係なく受け入れられる
        // given (前提条件):
        let mut repository = MockSessionRepository::new();
        repository.expect_find_by_room_id().never();
        let usecase = AuthenticateUseCase::new(Arc::new(repository));

        for token in [None, Some("anything"), Some("")] {
            // when (操作):
            let result = usecase.execute(credentials(Some("family"), token)).await;

            // then (期待する結果):
            assert!(result.unwrap().is_privileged());
        }
    }

    #[tokio::test]
    async fn test_storage_fault_fails_closed() {
        // テスト項目: ストレージ障害時は接続を拒否する
        // given (前提条件):
        let mut repository = MockSessionRepository::new();
        repository
            .expect_find_by_room_id()
            .returning(|_| Err(RepositoryError::Unavailable("down".to_string())));
        let usecase = AuthenticateUseCase::new(Arc::new(repository));

        // when (操作):
        let result = usecase.execute(credentials(Some("R1"), Some("T1"))).await;

        // then (期待する結果):
        assert!(matches!(result, Err(AuthError::Storage(_))));
    }

    #[test]
    fn test_credentials_prefer_auth_payload() {
        // テスト項目: 認証ペイロードの値がクエリ文字列より優先される
        // given (前提条件):
        let auth = credentials(Some("R1"), None);
        let query = credentials(Some("R9"), Some("T1"));

        // when (操作):
        let merged = auth.or(query);

        // then (期待する結果):
        assert_eq!(merged, credentials(Some("R1"), Some("T1")));
    }
}
