//! Shared application state.

use std::sync::Arc;

use kakurega_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::{
    config::ServerConfig,
    domain::{Lobby, MessagePusher, NameRepository, PushNotifier, SessionRepository, Timestamp},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        notifier::LogPushNotifier,
        repository::{InMemoryNameRepository, InMemorySessionRepository},
    },
    usecase::{
        AuthenticateUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        ExpireSessionsUseCase, GetStatsUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        RandomMatchUseCase, RoomDirectory, SendMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// AuthenticateUseCase（認証ゲートのユースケース）
    pub authenticate_usecase: Arc<AuthenticateUseCase>,
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// JoinRoomUseCase（ルーム入室のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム退室のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// SendMessageUseCase（ルームイベント中継のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// RandomMatchUseCase（ランダムマッチのユースケース）
    pub random_match_usecase: Arc<RandomMatchUseCase>,
    /// ExpireSessionsUseCase（期限切れセッション削除のユースケース）
    pub expire_sessions_usecase: Arc<ExpireSessionsUseCase>,
    /// GetStatsUseCase（統計取得のユースケース）
    pub get_stats_usecase: Arc<GetStatsUseCase>,
    /// MessagePusher（不正なフレームへの messageError 送信に使用）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub started_at: Timestamp,
}

impl AppState {
    /// Wire every use case on top of the given stores.
    pub fn new(
        config: &ServerConfig,
        session_repository: Arc<dyn SessionRepository>,
        name_repository: Arc<dyn NameRepository>,
        push_notifier: Arc<dyn PushNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
        let lobby = Arc::new(Mutex::new(Lobby::new()));
        let room_directory = Arc::new(RoomDirectory::new(message_pusher.clone()));

        Self {
            authenticate_usecase: Arc::new(AuthenticateUseCase::new(session_repository.clone())),
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                lobby.clone(),
                name_repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                lobby.clone(),
                room_directory.clone(),
                message_pusher.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                room_directory.clone(),
                name_repository.clone(),
            )),
            leave_room_usecase: Arc::new(LeaveRoomUseCase::new(room_directory.clone())),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                room_directory.clone(),
                push_notifier,
                message_pusher.clone(),
            )),
            random_match_usecase: Arc::new(RandomMatchUseCase::new(
                lobby.clone(),
                session_repository.clone(),
                name_repository,
                message_pusher.clone(),
                clock.clone(),
                config.search_timeout,
            )),
            expire_sessions_usecase: Arc::new(ExpireSessionsUseCase::new(
                session_repository.clone(),
            )),
            get_stats_usecase: Arc::new(GetStatsUseCase::new(
                lobby,
                room_directory,
                session_repository,
                message_pusher.clone(),
            )),
            message_pusher,
            started_at: Timestamp::new(clock.now_millis()),
        }
    }

    /// State backed by the in-memory session store, the default name pool and
    /// the logging push notifier.
    pub fn with_in_memory_stores(config: &ServerConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let session_repository = Arc::new(InMemorySessionRepository::new(
            clock.clone(),
            config.session_ttl,
        ));
        Self::new(
            config,
            session_repository,
            Arc::new(InMemoryNameRepository::with_default_names()),
            Arc::new(LogPushNotifier),
            clock,
        )
    }
}
