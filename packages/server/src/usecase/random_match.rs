//! UseCase: ランダムマッチ処理（`randomMatch` / `cancelMatch`）
//!
//! 待機中の接続は Lobby のキューに入り、後から来た接続がそれを相手として
//! 選んだ時点で両者のマッチが成立する。相手の選択とキューからの削除は
//! Lobby のロック内で同時に行われ、セッション作成はロックの外で行う。
//! セッション作成中の 2 人は Lobby のペアリング集合に残り、その間の
//! `randomMatch` は待機中の二重要求と同じく何もしない。
//!
//! セッション作成とロールバックは別タスクで実行するため、要求元の接続が
//! 途中で切れても相手の状態は必ず確定する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RandomMatchUseCase::execute() / cancel() メソッド
//! - マッチ成立時のセッション作成と `found` 通知
//! - セッション作成失敗時のロールバック（相手の再キューイング）
//!
//! ### なぜこのテストが必要か
//! - 2 つの待機中接続が同じセッションに 1 度だけマッチすることを保証
//! - キューから外れた接続が後から選ばれないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：A と B のマッチ成立
//! - 異常系：非特権接続からの要求、セッション作成の失敗、room id の衝突
//! - エッジケース：待機中の二重要求、待機後の切断、検索のタイムアウト
//! - 並行性：セッション作成中の再要求、要求の中断、多数の同時要求

use std::{sync::Arc, time::Duration};

use kakurega_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionContext, ConnectionId, Lobby, LobbyError, MessagePusher, NameRepository, Pairing,
    RepositoryError, RoomId, RoomIdFactory, ServerEvent, Session, SessionRepository,
    SessionTokenFactory, Ticket, Timestamp,
};

use super::{
    display_name::resolve_display_name,
    error::{MatchError, SessionCreateError},
};

/// room id の衝突時にセッション作成を試行する最大回数
const MAX_SESSION_ATTEMPTS: usize = 5;

/// ランダムマッチ要求の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// 相手が見つかるまで待機中
    Waiting,
    /// マッチが成立し、セッションが作成された
    Matched(RoomId),
}

/// Lobby のロック内で行ったペアリングの結果
enum PairingAttempt {
    Paired(Pairing),
    Waiting(Ticket),
    Gone,
}

impl PairingAttempt {
    fn run(lobby: &mut Lobby, seeker: &ConnectionId, ticket: Option<Ticket>) -> Self {
        let Some(ticket) = ticket else {
            return Self::Gone;
        };
        match lobby.try_pair(seeker) {
            Some(pairing) => Self::Paired(pairing),
            None => Self::Waiting(ticket),
        }
    }
}

/// ランダムマッチのユースケース
#[derive(Clone)]
pub struct RandomMatchUseCase {
    /// Lobby（接続レジストリ + 待機キュー）
    lobby: Arc<Mutex<Lobby>>,
    /// Repository（セッションストアの抽象化）
    session_repository: Arc<dyn SessionRepository>,
    /// 表示名プール
    name_repository: Arc<dyn NameRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    /// 検索のタイムアウト（`None` の場合は無期限）
    search_timeout: Option<Duration>,
}

impl RandomMatchUseCase {
    /// 新しい RandomMatchUseCase を作成
    pub fn new(
        lobby: Arc<Mutex<Lobby>>,
        session_repository: Arc<dyn SessionRepository>,
        name_repository: Arc<dyn NameRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        search_timeout: Option<Duration>,
    ) -> Self {
        Self {
            lobby,
            session_repository,
            name_repository,
            message_pusher,
            clock,
            search_timeout,
        }
    }

    /// ランダムマッチを要求する
    ///
    /// # Returns
    ///
    /// * `Ok(MatchOutcome::Waiting)` - 待機中（相手が現れた時点で `found` が届く）
    /// * `Ok(MatchOutcome::Matched(room_id))` - マッチ成立
    /// * `Err(MatchError)` - 要求失敗（要求元には `searchError` を通知済み）
    pub async fn execute(&self, context: &ConnectionContext) -> Result<MatchOutcome, MatchError> {
        let seeker = &context.connection_id;

        // 1. 特権接続のみ利用可能
        if !context.is_privileged() {
            self.notify_search_error(seeker).await;
            return Err(MatchError::NotEligible);
        }

        // 2. キューへの追加とペアリングを 1 つのクリティカルセクションで行う
        let attempt = {
            let mut lobby = self.lobby.lock().await;
            let ticket = match lobby.enter_queue(seeker) {
                Ok(ticket) => ticket,
                Err(LobbyError::AlreadyWaiting(_)) => {
                    tracing::debug!("'{}' is already waiting for a match", seeker);
                    return Ok(MatchOutcome::Waiting);
                }
                Err(LobbyError::PairingInProgress(_)) => {
                    tracing::debug!("'{}' is already being paired", seeker);
                    return Ok(MatchOutcome::Waiting);
                }
                Err(LobbyError::NotRegistered(id)) => {
                    drop(lobby);
                    self.notify_search_error(seeker).await;
                    return Err(MatchError::NotRegistered(id));
                }
            };
            PairingAttempt::run(&mut lobby, seeker, Some(ticket))
        };

        match attempt {
            PairingAttempt::Paired(pairing) => {
                let this = self.clone();
                let room_id = tokio::spawn(async move { this.settle_pairing(pairing).await })
                    .await
                    .map_err(|e| MatchError::PairingTask(e.to_string()))??;
                Ok(MatchOutcome::Matched(room_id))
            }
            PairingAttempt::Waiting(ticket) => {
                tracing::info!("'{}' is waiting for a match", seeker);
                self.arm_search_deadline(seeker.clone(), ticket);
                Ok(MatchOutcome::Waiting)
            }
            PairingAttempt::Gone => Ok(MatchOutcome::Waiting),
        }
    }

    /// 検索を取り消す
    ///
    /// 待機中だった場合のみ `searchError` を通知し、`true` を返す。
    pub async fn cancel(&self, context: &ConnectionContext) -> bool {
        let cancelled = self.lobby.lock().await.leave_queue(&context.connection_id);
        if cancelled {
            tracing::info!("'{}' cancelled the match search", context.connection_id);
            self.notify_search_error(&context.connection_id).await;
        }
        cancelled
    }

    /// ペアリングを確定させる（失敗時はロールバックする）
    async fn settle_pairing(&self, pairing: Pairing) -> Result<RoomId, SessionCreateError> {
        match self.complete_pairing(&pairing).await {
            Ok(room_id) => Ok(room_id),
            Err(e) => {
                self.rollback(&pairing, &e).await;
                Err(e)
            }
        }
    }

    /// セッションを作成し、両者に `found` を通知する
    async fn complete_pairing(&self, pairing: &Pairing) -> Result<RoomId, SessionCreateError> {
        let session = self.provision_session().await?;
        let seeker = &pairing.seeker.connection_id;
        let partner = &pairing.partner.connection_id;

        let to_seeker = ServerEvent::Found {
            user_name: pairing.partner.display_name.clone(),
            room_id: session.room_id.clone(),
            token: session.token.clone(),
        };
        let to_partner = ServerEvent::Found {
            user_name: resolve_display_name(self.name_repository.as_ref()).await,
            room_id: session.room_id.clone(),
            token: session.token.clone(),
        };
        for (target, event) in [(seeker, &to_seeker), (partner, &to_partner)] {
            if let Err(e) = self.message_pusher.push_to(target, event).await {
                tracing::warn!("Failed to deliver match result to '{}': {}", target, e);
            }
        }

        let mut lobby = self.lobby.lock().await;
        lobby.finish_pairing(seeker);
        lobby.finish_pairing(partner);
        drop(lobby);

        tracing::info!(
            "Matched '{}' with '{}' in room '{}'",
            seeker,
            partner,
            session.room_id
        );
        Ok(session.room_id)
    }

    /// 一意な room id でセッションを作成する
    async fn provision_session(&self) -> Result<Session, SessionCreateError> {
        for attempt in 1..=MAX_SESSION_ATTEMPTS {
            let session = Session::random_meetup(
                RoomIdFactory::generate(),
                SessionTokenFactory::generate(),
                Timestamp::new(self.clock.now_millis()),
            );
            match self.session_repository.create(session.clone()).await {
                Ok(()) => return Ok(session),
                Err(RepositoryError::DuplicateRoomId(room_id)) => {
                    tracing::debug!(
                        "Room id '{}' already taken (attempt {}/{})",
                        room_id,
                        attempt,
                        MAX_SESSION_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(SessionCreateError::RoomIdExhausted(MAX_SESSION_ATTEMPTS))
    }

    /// セッション作成失敗時：seeker に通知し、partner の検索を再開する
    async fn rollback(&self, pairing: &Pairing, error: &SessionCreateError) {
        tracing::error!(
            "Failed to create session for '{}': {}",
            pairing.seeker.connection_id,
            error
        );
        let seeker = &pairing.seeker.connection_id;
        self.lobby.lock().await.finish_pairing(seeker);
        self.notify_search_error(seeker).await;
        self.resume_search(pairing.partner.connection_id.clone()).await;
    }

    /// 失敗したペアリングの partner をキューに戻し、すぐにペアリングを試みる
    async fn resume_search(&self, connection_id: ConnectionId) {
        let mut next = Some(connection_id);
        while let Some(seeker) = next.take() {
            let attempt = {
                let mut lobby = self.lobby.lock().await;
                let ticket = lobby.requeue(&seeker);
                PairingAttempt::run(&mut lobby, &seeker, ticket)
            };
            match attempt {
                PairingAttempt::Paired(pairing) => {
                    if let Err(e) = self.complete_pairing(&pairing).await {
                        tracing::error!(
                            "Failed to create session for '{}': {}",
                            pairing.seeker.connection_id,
                            e
                        );
                        let failed = &pairing.seeker.connection_id;
                        self.lobby.lock().await.finish_pairing(failed);
                        self.notify_search_error(failed).await;
                        next = Some(pairing.partner.connection_id);
                    }
                }
                PairingAttempt::Waiting(ticket) => {
                    tracing::info!("'{}' returned to the wait queue", seeker);
                    self.arm_search_deadline(seeker, ticket);
                }
                PairingAttempt::Gone => {
                    tracing::debug!("'{}' is gone, not requeued", seeker);
                }
            }
        }
    }

    /// 検索のタイムアウトを設定する（`ticket` の検索にのみ作用する）
    fn arm_search_deadline(&self, connection_id: ConnectionId, ticket: Ticket) {
        let Some(timeout) = self.search_timeout else {
            return;
        };
        let lobby = self.lobby.clone();
        let message_pusher = self.message_pusher.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let expired = lobby.lock().await.expire_ticket(&connection_id, ticket);
            if expired {
                tracing::info!("Match search for '{}' timed out", connection_id);
                if let Err(e) = message_pusher
                    .push_to(&connection_id, &ServerEvent::SearchError)
                    .await
                {
                    tracing::debug!("Failed to report timeout to '{}': {}", connection_id, e);
                }
            }
        });
    }

    async fn notify_search_error(&self, connection_id: &ConnectionId) {
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &ServerEvent::SearchError)
            .await
        {
            tracing::warn!("Failed to send searchError to '{}': {}", connection_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ConnectionEntry, DisplayName, RoomId,
            repository::{MockNameRepository, MockSessionRepository},
        },
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemorySessionRepository,
        },
    };
    use async_trait::async_trait;
    use kakurega_shared::time::FixedClock;
    use serde_json::Value;
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    /// セッション作成に時間がかかるストア
    struct SlowSessionRepository {
        inner: InMemorySessionRepository,
        delay: Duration,
        unavailable: bool,
    }

    impl SlowSessionRepository {
        fn new(delay: Duration) -> Self {
            Self {
                inner: InMemorySessionRepository::new(Arc::new(FixedClock::new(1_000)), None),
                delay,
                unavailable: false,
            }
        }

        fn unavailable(delay: Duration) -> Self {
            Self {
                unavailable: true,
                ..Self::new(delay)
            }
        }
    }

    #[async_trait]
    impl SessionRepository for SlowSessionRepository {
        async fn find_by_room_id(
            &self,
            room_id: &RoomId,
        ) -> Result<Option<Session>, RepositoryError> {
            self.inner.find_by_room_id(room_id).await
        }

        async fn create(&self, session: Session) -> Result<(), RepositoryError> {
            tokio::time::sleep(self.delay).await;
            if self.unavailable {
                return Err(RepositoryError::Unavailable("down".to_string()));
            }
            self.inner.create(session).await
        }

        async fn purge_expired(&self) -> Result<usize, RepositoryError> {
            self.inner.purge_expired().await
        }

        async fn count(&self) -> usize {
            self.inner.count().await
        }
    }

    struct Fixture {
        usecase: Arc<RandomMatchUseCase>,
        lobby: Arc<Mutex<Lobby>>,
        pusher: Arc<WebSocketMessagePusher>,
    }

    impl Fixture {
        /// 特権接続を登録し、受信チャンネルを返す
        async fn connect(
            &self,
            id: &str,
            name: &str,
        ) -> (ConnectionContext, mpsc::UnboundedReceiver<String>) {
            let context = ConnectionContext::privileged(ConnectionId::from(id));
            let (tx, rx) = mpsc::unbounded_channel();
            self.pusher
                .register_client(context.connection_id.clone(), tx)
                .await;
            self.lobby.lock().await.register(ConnectionEntry::new(
                context.connection_id.clone(),
                DisplayName::new(name.to_string()).unwrap(),
                Timestamp::new(0),
            ));
            (context, rx)
        }
    }

    fn fresh_names() -> MockNameRepository {
        let mut names = MockNameRepository::new();
        names
            .expect_random_name()
            .returning(|| Ok(DisplayName::new("Fresh".to_string()).unwrap()));
        names
    }

    fn setup(
        session_repository: Arc<dyn SessionRepository>,
        search_timeout: Option<Duration>,
    ) -> Fixture {
        let lobby = Arc::new(Mutex::new(Lobby::new()));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = Arc::new(RandomMatchUseCase::new(
            lobby.clone(),
            session_repository,
            Arc::new(fresh_names()),
            pusher.clone(),
            Arc::new(FixedClock::new(1_000)),
            search_timeout,
        ));
        Fixture {
            usecase,
            lobby,
            pusher,
        }
    }

    fn in_memory_sessions() -> Arc<InMemorySessionRepository> {
        Arc::new(InMemorySessionRepository::new(
            Arc::new(FixedClock::new(1_000)),
            None,
        ))
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    fn found_frames(frames: &[Value]) -> Vec<&Value> {
        frames.iter().filter(|frame| frame["event"] == "found").collect()
    }

    #[tokio::test]
    async fn test_two_seekers_are_matched_into_one_session() {
        // テスト項目: A と B が同じ room / key の found を受け取り、キューが空になる
        // given (前提条件):
        let sessions = in_memory_sessions();
        let fixture = setup(sessions.clone(), None);
        let (alice, mut alice_rx) = fixture.connect("alice", "Apple").await;
        let (bob, mut bob_rx) = fixture.connect("bob", "Banana").await;

        // when (操作):
        let first = fixture.usecase.execute(&alice).await;
        let second = fixture.usecase.execute(&bob).await;

        // then (期待する結果):
        assert_eq!(first, Ok(MatchOutcome::Waiting));
        let Ok(MatchOutcome::Matched(room_id)) = second else {
            panic!("expected a match, got {:?}", second);
        };

        let alice_frames = drain(&mut alice_rx);
        let bob_frames = drain(&mut bob_rx);
        assert_eq!(alice_frames.len(), 1);
        assert_eq!(bob_frames.len(), 1);
        assert_eq!(alice_frames[0]["event"], "found");
        assert_eq!(bob_frames[0]["event"], "found");
        assert_eq!(alice_frames[0]["data"]["room"], room_id.as_str());
        assert_eq!(bob_frames[0]["data"]["room"], room_id.as_str());
        assert_eq!(alice_frames[0]["data"]["key"], bob_frames[0]["data"]["key"]);
        // 要求元 (B) には相手の名前、相手 (A) には新しい名前
        assert_eq!(bob_frames[0]["data"]["userName"], "Apple");
        assert_eq!(alice_frames[0]["data"]["userName"], "Fresh");

        let lobby = fixture.lobby.lock().await;
        assert_eq!(lobby.waiting_count(), 0);
        assert!(!lobby.entry(&alice.connection_id).unwrap().idle);
        assert!(!lobby.entry(&bob.connection_id).unwrap().idle);
        drop(lobby);

        let session = sessions.find_by_room_id(&room_id).await.unwrap().unwrap();
        assert!(session.random);
        assert_eq!(session.name, "Random Meetup");
        assert_eq!(session.created_at, Timestamp::new(1_000));
        assert_eq!(sessions.count().await, 1);
    }

    #[tokio::test]
    async fn test_non_privileged_connection_gets_search_error() {
        // テスト項目: ルーム接続からの randomMatch は searchError になる
        // given (前提条件):
        let fixture = setup(in_memory_sessions(), None);
        let context = ConnectionContext::room(
            ConnectionId::from("guest"),
            RoomId::new("R1".to_string()).unwrap(),
            "Lounge".to_string(),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        fixture
            .pusher
            .register_client(context.connection_id.clone(), tx)
            .await;

        // when (操作):
        let result = fixture.usecase.execute(&context).await;

        // then (期待する結果):
        assert_eq!(result, Err(MatchError::NotEligible));
        assert_eq!(drain(&mut rx), vec![serde_json::json!({"event": "searchError"})]);
        assert_eq!(fixture.lobby.lock().await.waiting_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_request_while_waiting_is_noop() {
        // テスト項目: 待機中の二重要求でキューに重複して入らない
        // given (前提条件):
        let fixture = setup(in_memory_sessions(), None);
        let (alice, _rx) = fixture.connect("alice", "Apple").await;
        fixture.usecase.execute(&alice).await.unwrap();

        // when (操作):
        let result = fixture.usecase.execute(&alice).await;

        // then (期待する結果):
        assert_eq!(result, Ok(MatchOutcome::Waiting));
        assert_eq!(fixture.lobby.lock().await.waiting_count(), 1);
    }

    #[tokio::test]
    async fn test_disconnected_seeker_is_never_matched() {
        // テスト項目: 待機後に切断した接続は選ばれず、found も届かない
        // given (前提条件):
        let fixture = setup(in_memory_sessions(), None);
        let (alice, mut alice_rx) = fixture.connect("alice", "Apple").await;
        let (bob, mut bob_rx) = fixture.connect("bob", "Banana").await;
        fixture.usecase.execute(&alice).await.unwrap();
        fixture.lobby.lock().await.remove(&alice.connection_id);

        // when (操作):
        let result = fixture.usecase.execute(&bob).await;

        // then (期待する結果):
        assert_eq!(result, Ok(MatchOutcome::Waiting));
        assert!(drain(&mut alice_rx).is_empty());
        assert!(drain(&mut bob_rx).is_empty());
        let lobby = fixture.lobby.lock().await;
        assert!(!lobby.is_waiting(&alice.connection_id));
        assert!(lobby.is_waiting(&bob.connection_id));
    }

    #[tokio::test]
    async fn test_cancel_removes_from_queue() {
        // テスト項目: cancelMatch でキューから外れ、searchError が届く
        // given (前提条件):
        let fixture = setup(in_memory_sessions(), None);
        let (alice, mut alice_rx) = fixture.connect("alice", "Apple").await;
        let (bob, _bob_rx) = fixture.connect("bob", "Banana").await;
        fixture.usecase.execute(&alice).await.unwrap();

        // when (操作):
        let cancelled = fixture.usecase.cancel(&alice).await;

        // then (期待する結果):
        assert!(cancelled);
        assert_eq!(drain(&mut alice_rx), vec![serde_json::json!({"event": "searchError"})]);
        // 取り消した接続は後から選ばれない
        assert_eq!(fixture.usecase.execute(&bob).await, Ok(MatchOutcome::Waiting));
        assert!(!fixture.usecase.cancel(&alice).await);
    }

    #[tokio::test]
    async fn test_session_create_failure_requeues_partner() {
        // テスト項目: セッション作成に失敗すると要求元に searchError、相手は再度待機
        // given (前提条件):
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_create()
            .times(1)
            .returning(|_| Err(RepositoryError::Unavailable("down".to_string())));
        let fixture = setup(Arc::new(sessions), None);
        let (alice, mut alice_rx) = fixture.connect("alice", "Apple").await;
        let (bob, mut bob_rx) = fixture.connect("bob", "Banana").await;
        fixture.usecase.execute(&alice).await.unwrap();

        // when (操作):
        let result = fixture.usecase.execute(&bob).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(MatchError::SessionCreate(SessionCreateError::Storage(_)))
        ));
        assert_eq!(drain(&mut bob_rx), vec![serde_json::json!({"event": "searchError"})]);
        assert!(drain(&mut alice_rx).is_empty());
        let lobby = fixture.lobby.lock().await;
        assert!(lobby.is_waiting(&alice.connection_id));
        assert!(lobby.entry(&alice.connection_id).unwrap().idle);
        assert!(!lobby.is_waiting(&bob.connection_id));
        assert!(!lobby.entry(&bob.connection_id).unwrap().idle);
    }

    #[tokio::test]
    async fn test_requeued_partner_is_paired_immediately() {
        // テスト項目: 再キューイングされた相手は、待機中の別の接続とすぐにマッチする
        // given (前提条件):
        let mut sessions = MockSessionRepository::new();
        let mut calls = 0;
        sessions.expect_create().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(RepositoryError::Unavailable("flaky".to_string()))
            } else {
                Ok(())
            }
        });
        let fixture = setup(Arc::new(sessions), None);
        let (alice, mut alice_rx) = fixture.connect("alice", "Apple").await;
        let (carol, mut carol_rx) = fixture.connect("carol", "Cherry").await;
        let (bob, mut bob_rx) = fixture.connect("bob", "Banana").await;
        fixture.usecase.execute(&alice).await.unwrap();
        fixture.usecase.execute(&carol).await.unwrap_or(MatchOutcome::Waiting);
        // carol の要求は 1 回目の失敗で searchError、alice は再キューイング後に待機
        assert_eq!(drain(&mut carol_rx).len(), 1);
        assert!(drain(&mut alice_rx).is_empty());

        // when (操作):
        let result = fixture.usecase.execute(&bob).await;

        // then (期待する結果):
        assert!(matches!(result, Ok(MatchOutcome::Matched(_))));
        assert_eq!(drain(&mut alice_rx)[0]["event"], "found");
        assert_eq!(drain(&mut bob_rx)[0]["event"], "found");
        assert_eq!(fixture.lobby.lock().await.waiting_count(), 0);
    }

    #[tokio::test]
    async fn test_room_id_collisions_are_retried_then_exhausted() {
        // テスト項目: room id が衝突し続けると規定回数で諦める
        // given (前提条件):
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_create()
            .times(MAX_SESSION_ATTEMPTS)
            .returning(|s| Err(RepositoryError::DuplicateRoomId(s.room_id.to_string())));
        let fixture = setup(Arc::new(sessions), None);
        let (alice, _alice_rx) = fixture.connect("alice", "Apple").await;
        let (bob, _bob_rx) = fixture.connect("bob", "Banana").await;
        fixture.usecase.execute(&alice).await.unwrap();

        // when (操作):
        let result = fixture.usecase.execute(&bob).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(MatchError::SessionCreate(SessionCreateError::RoomIdExhausted(
                MAX_SESSION_ATTEMPTS
            )))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_deadline_expires_waiting_seeker() {
        // テスト項目: タイムアウトで待機が終了し、searchError が届く
        // given (前提条件):
        let fixture = setup(in_memory_sessions(), Some(Duration::from_secs(30)));
        let (alice, mut alice_rx) = fixture.connect("alice", "Apple").await;
        fixture.usecase.execute(&alice).await.unwrap();

        // when (操作):
        tokio::time::sleep(Duration::from_secs(29)).await;
        let before_deadline = drain(&mut alice_rx);
        tokio::time::sleep(Duration::from_secs(2)).await;

        // then (期待する結果):
        assert!(before_deadline.is_empty());
        assert_eq!(drain(&mut alice_rx), vec![serde_json::json!({"event": "searchError"})]);
        assert!(!fixture.lobby.lock().await.is_waiting(&alice.connection_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_deadline_does_not_cancel_new_search() {
        // テスト項目: 古い検索のタイムアウトは新しい検索に影響しない
        // given (前提条件):
        let fixture = setup(in_memory_sessions(), Some(Duration::from_secs(30)));
        let (alice, mut alice_rx) = fixture.connect("alice", "Apple").await;
        fixture.usecase.execute(&alice).await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;
        fixture.usecase.cancel(&alice).await;
        drain(&mut alice_rx);

        // when (操作):
        fixture.usecase.execute(&alice).await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;

        // then (期待する結果):
        // 1 回目のタイムアウト時刻は過ぎているが、2 回目の検索はまだ待機中
        assert!(fixture.lobby.lock().await.is_waiting(&alice.connection_id));
        assert!(drain(&mut alice_rx).is_empty());

        // 2 回目の検索は自身のタイムアウトで終了する
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(drain(&mut alice_rx), vec![serde_json::json!({"event": "searchError"})]);
        assert!(!fixture.lobby.lock().await.is_waiting(&alice.connection_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partner_is_not_matched_again_while_session_is_created() {
        // テスト項目: セッション作成中に相手が再要求しても、2 つ目のマッチは成立しない
        // given (前提条件):
        let sessions = Arc::new(SlowSessionRepository::new(Duration::from_millis(200)));
        let fixture = setup(sessions.clone(), None);
        let (alice, mut alice_rx) = fixture.connect("alice", "Apple").await;
        let (bob, mut bob_rx) = fixture.connect("bob", "Banana").await;
        let (carol, mut carol_rx) = fixture.connect("carol", "Cherry").await;
        fixture.usecase.execute(&alice).await.unwrap();

        let usecase = fixture.usecase.clone();
        let bob_context = bob.clone();
        let pairing = tokio::spawn(async move { usecase.execute(&bob_context).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(fixture.lobby.lock().await.is_pairing(&alice.connection_id));

        // when (操作):
        let again = fixture.usecase.execute(&alice).await;
        let carol_result = fixture.usecase.execute(&carol).await;
        let matched = pairing.await.unwrap();

        // then (期待する結果):
        assert_eq!(again, Ok(MatchOutcome::Waiting));
        assert_eq!(carol_result, Ok(MatchOutcome::Waiting));
        assert!(matches!(matched, Ok(MatchOutcome::Matched(_))));

        assert_eq!(found_frames(&drain(&mut alice_rx)).len(), 1);
        assert_eq!(found_frames(&drain(&mut bob_rx)).len(), 1);
        assert!(drain(&mut carol_rx).is_empty());

        let lobby = fixture.lobby.lock().await;
        assert!(!lobby.is_waiting(&alice.connection_id));
        assert!(!lobby.is_pairing(&alice.connection_id));
        assert!(!lobby.is_pairing(&bob.connection_id));
        assert!(lobby.is_waiting(&carol.connection_id));
        drop(lobby);
        assert_eq!(sessions.count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_request_still_settles_pairing() {
        // テスト項目: 要求元の処理が中断されても、マッチは最後まで確定する
        // given (前提条件):
        let sessions = Arc::new(SlowSessionRepository::new(Duration::from_millis(200)));
        let fixture = setup(sessions.clone(), None);
        let (alice, mut alice_rx) = fixture.connect("alice", "Apple").await;
        let (bob, mut bob_rx) = fixture.connect("bob", "Banana").await;
        fixture.usecase.execute(&alice).await.unwrap();

        let usecase = fixture.usecase.clone();
        let bob_context = bob.clone();
        let request = tokio::spawn(async move { usecase.execute(&bob_context).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        // when (操作):
        request.abort();
        tokio::time::sleep(Duration::from_millis(300)).await;

        // then (期待する結果):
        assert!(request.await.unwrap_err().is_cancelled());
        let alice_found = drain(&mut alice_rx);
        let bob_found = drain(&mut bob_rx);
        assert_eq!(found_frames(&alice_found).len(), 1);
        assert_eq!(found_frames(&bob_found).len(), 1);
        assert_eq!(alice_found[0]["data"]["room"], bob_found[0]["data"]["room"]);

        let lobby = fixture.lobby.lock().await;
        assert!(!lobby.is_pairing(&alice.connection_id));
        assert!(!lobby.is_pairing(&bob.connection_id));
        drop(lobby);
        assert_eq!(sessions.count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_request_still_requeues_partner_on_failure() {
        // テスト項目: 要求元の処理が中断されても、作成失敗時は相手が再度待機する
        // given (前提条件):
        let sessions = Arc::new(SlowSessionRepository::unavailable(Duration::from_millis(200)));
        let fixture = setup(sessions, None);
        let (alice, mut alice_rx) = fixture.connect("alice", "Apple").await;
        let (bob, mut bob_rx) = fixture.connect("bob", "Banana").await;
        fixture.usecase.execute(&alice).await.unwrap();

        let usecase = fixture.usecase.clone();
        let bob_context = bob.clone();
        let request = tokio::spawn(async move { usecase.execute(&bob_context).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        // when (操作):
        request.abort();
        tokio::time::sleep(Duration::from_millis(300)).await;

        // then (期待する結果):
        assert_eq!(drain(&mut bob_rx), vec![serde_json::json!({"event": "searchError"})]);
        assert!(drain(&mut alice_rx).is_empty());
        let lobby = fixture.lobby.lock().await;
        assert!(lobby.is_waiting(&alice.connection_id));
        assert!(lobby.entry(&alice.connection_id).unwrap().idle);
        assert!(!lobby.is_pairing(&alice.connection_id));
        assert!(!lobby.is_pairing(&bob.connection_id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_seekers_are_paired_exactly_once() {
        // テスト項目: 多数の同時要求でも、各接続は 1 度だけ 2 人組のルームにマッチする
        // given (前提条件):
        const SEEKERS: usize = 200;
        let sessions = in_memory_sessions();
        let fixture = setup(sessions.clone(), None);
        let mut seekers = Vec::with_capacity(SEEKERS);
        for i in 0..SEEKERS {
            seekers.push(fixture.connect(&format!("seeker-{}", i), "Guest").await);
        }

        // when (操作):
        let mut requests = Vec::with_capacity(SEEKERS);
        for (context, _) in &seekers {
            let usecase = fixture.usecase.clone();
            let context = context.clone();
            requests.push(tokio::spawn(async move { usecase.execute(&context).await }));
        }
        let mut matched = 0;
        for request in requests {
            if let Ok(MatchOutcome::Matched(_)) = request.await.unwrap() {
                matched += 1;
            }
        }

        // then (期待する結果):
        assert_eq!(matched, SEEKERS / 2);
        let mut rooms: HashMap<String, usize> = HashMap::new();
        for (_, rx) in seekers.iter_mut() {
            let frames = drain(rx);
            let found = found_frames(&frames);
            assert_eq!(found.len(), 1);
            let room = found[0]["data"]["room"].as_str().unwrap().to_string();
            *rooms.entry(room).or_default() += 1;
        }
        assert_eq!(rooms.len(), SEEKERS / 2);
        assert!(rooms.values().all(|&members| members == 2));

        let lobby = fixture.lobby.lock().await;
        assert_eq!(lobby.waiting_count(), 0);
        assert!(seekers.iter().all(|(context, _)| !lobby.is_pairing(&context.connection_id)));
        drop(lobby);
        assert_eq!(sessions.count().await, SEEKERS / 2);
    }
}
