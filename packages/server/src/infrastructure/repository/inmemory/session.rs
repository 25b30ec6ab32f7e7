//! InMemory Session Repository 実装
//!
//! ドメイン層が定義する SessionRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 有効期限
//!
//! セッションは作成から `ttl` 経過すると期限切れになります。
//! 期限切れのセッションは検索時に削除され、`purge_expired` でまとめて掃除されます。
//! `ttl` が `None` の場合は期限切れになりません。

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use kakurega_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, RoomId, Session, SessionRepository, Timestamp};

/// インメモリ Session Repository 実装
pub struct InMemorySessionRepository {
    /// room_id → Session
    sessions: Mutex<HashMap<RoomId, Session>>,
    clock: Arc<dyn Clock>,
    ttl_millis: Option<i64>,
}

impl InMemorySessionRepository {
    /// 新しい InMemorySessionRepository を作成
    pub fn new(clock: Arc<dyn Clock>, ttl: Option<Duration>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
            ttl_millis: ttl.map(|ttl| i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)),
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_by_room_id(&self, room_id: &RoomId) -> Result<Option<Session>, RepositoryError> {
        let now = self.now();
        let mut sessions = self.sessions.lock().await;

        let expired = match sessions.get(room_id) {
            Some(session) => session.is_expired(now, self.ttl_millis),
            None => return Ok(None),
        };
        if expired {
            sessions.remove(room_id);
            tracing::debug!("Session '{}' expired on lookup", room_id);
            return Ok(None);
        }

        Ok(sessions.get(room_id).cloned())
    }

    async fn create(&self, session: Session) -> Result<(), RepositoryError> {
        let now = self.now();
        let mut sessions = self.sessions.lock().await;

        // 期限切れのセッションの room_id は再利用できる
        if let Some(existing) = sessions.get(&session.room_id)
            && !existing.is_expired(now, self.ttl_millis)
        {
            return Err(RepositoryError::DuplicateRoomId(
                session.room_id.as_str().to_string(),
            ));
        }

        tracing::debug!("Session '{}' created", session.room_id);
        sessions.insert(session.room_id.clone(), session);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, RepositoryError> {
        let now = self.now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, self.ttl_millis));
        Ok(before - sessions.len())
    }

    async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
