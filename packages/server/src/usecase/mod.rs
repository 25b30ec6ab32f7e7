//! UseCase 層
//!
//! 接続ごとの操作（認証・接続・入退室・中継・マッチング・切断）と、
//! 定期実行・統計取得のユースケースを提供する。

mod authenticate;
mod connect_participant;
mod disconnect_participant;
mod display_name;
pub mod error;
mod expire_sessions;
mod get_stats;
mod join_room;
mod leave_room;
mod random_match;
pub mod room_directory;
mod send_message;

pub use authenticate::{AuthenticateUseCase, Credentials};
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::{DisconnectParticipantUseCase, DisconnectReport};
pub use error::{AuthError, MatchError, SendMessageError, SessionCreateError};
pub use expire_sessions::ExpireSessionsUseCase;
pub use get_stats::{GetStatsUseCase, ServerStats};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use random_match::{MatchOutcome, RandomMatchUseCase};
pub use room_directory::{DirectorySnapshot, Greeting, RoomDirectory};
pub use send_message::SendMessageUseCase;
