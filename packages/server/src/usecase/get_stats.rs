//! UseCase: サーバー統計の取得（デバッグ用）

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{Lobby, MessagePusher, SessionRepository};

use super::room_directory::RoomDirectory;

/// サーバー全体のカウンター
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    /// WebSocket 接続数
    pub connections: usize,
    /// マッチ待機中の接続数
    pub waiting: usize,
    pub rooms: usize,
    pub members: usize,
    pub sessions: usize,
}

/// サーバー統計取得のユースケース
pub struct GetStatsUseCase {
    lobby: Arc<Mutex<Lobby>>,
    room_directory: Arc<RoomDirectory>,
    session_repository: Arc<dyn SessionRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl GetStatsUseCase {
    pub fn new(
        lobby: Arc<Mutex<Lobby>>,
        room_directory: Arc<RoomDirectory>,
        session_repository: Arc<dyn SessionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            lobby,
            room_directory,
            session_repository,
            message_pusher,
        }
    }

    pub async fn execute(&self) -> ServerStats {
        let waiting = self.lobby.lock().await.waiting_count();
        let directory = self.room_directory.snapshot().await;
        ServerStats {
            connections: self.message_pusher.client_count().await,
            waiting,
            rooms: directory.rooms,
            members: directory.members,
            sessions: self.session_repository.count().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionEntry, ConnectionId, DisplayName, RoomId, Timestamp},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemorySessionRepository,
        },
        usecase::room_directory::Greeting,
    };
    use kakurega_shared::time::SystemClock;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_stats_reflect_current_state() {
        // テスト項目: 接続数・待機数・ルーム数・メンバー数・セッション数が集計される
        // given (前提条件):
        let lobby = Arc::new(Mutex::new(Lobby::new()));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let directory = Arc::new(RoomDirectory::new(pusher.clone()));
        let sessions = Arc::new(InMemorySessionRepository::new(Arc::new(SystemClock), None));
        let usecase =
            GetStatsUseCase::new(lobby.clone(), directory.clone(), sessions, pusher.clone());

        let alice = ConnectionId::from("alice");
        let bob = ConnectionId::from("bob");
        for id in [&alice, &bob] {
            let (tx, _rx) = mpsc::unbounded_channel();
            pusher.register_client(id.clone(), tx).await;
        }
        {
            let mut lobby = lobby.lock().await;
            lobby.register(ConnectionEntry::new(
                alice.clone(),
                DisplayName::anonymous(),
                Timestamp::new(0),
            ));
            lobby.enter_queue(&alice).unwrap();
        }
        let greeting = Greeting {
            display_name: DisplayName::anonymous(),
            room_name: "Lounge".to_string(),
            image: "7".to_string(),
            identifier: "0.3".to_string(),
        };
        directory
            .join(&RoomId::new("R1".to_string()).unwrap(), &bob, greeting)
            .await;

        // when (操作):
        let stats = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(
            stats,
            ServerStats {
                connections: 2,
                waiting: 1,
                rooms: 1,
                members: 1,
                sessions: 0,
            }
        );
    }
}
