//! WebSocket event DTOs.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Events without a payload omit `data`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event sent by a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename = "chat-opened")]
    ChatOpened,
    NewMessage(Value),
    Typing(Value),
    StoppedTyping(Value),
    RandomMatch,
    CancelMatch,
    LeaveRoom,
}

/// Event sent by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    Joined(JoinedPayload),
    Name(NamePayload),
    UpdateUserCount(usize),
    NewMessage(Value),
    Typing(Value),
    StoppedTyping(Value),
    Found(FoundPayload),
    SearchError,
    Leave(LeavePayload),
    MessageError(MessageErrorPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinedPayload {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamePayload {
    pub name: String,
    /// Display name of the room
    pub room: String,
    pub image: String,
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FoundPayload {
    /// Display name of the matched peer
    pub user_name: String,
    /// Room id of the provisioned session
    pub room: String,
    /// Admission token of the provisioned session
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeavePayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageErrorPayload {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_events_without_payload() {
        // テスト項目: data を持たないイベントをパースできる
        // given (前提条件):
        let frames = [
            (r#"{"event":"chat-opened"}"#, ClientMessage::ChatOpened),
            (r#"{"event":"randomMatch"}"#, ClientMessage::RandomMatch),
            (r#"{"event":"cancelMatch"}"#, ClientMessage::CancelMatch),
            (r#"{"event":"leaveRoom"}"#, ClientMessage::LeaveRoom),
        ];

        for (frame, expected) in frames {
            // when (操作):
            let parsed: ClientMessage = serde_json::from_str(frame).unwrap();

            // then (期待する結果):
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn test_parse_new_message_keeps_payload() {
        // テスト項目: newMessage の payload がそのまま保持される
        // given (前提条件):
        let frame = r#"{"event":"newMessage","data":{"message":"hi","image":null,"p256dh":"k"}}"#;

        // when (操作):
        let parsed: ClientMessage = serde_json::from_str(frame).unwrap();

        // then (期待する結果):
        assert_eq!(
            parsed,
            ClientMessage::NewMessage(json!({"message": "hi", "image": null, "p256dh": "k"}))
        );
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        // テスト項目: 未知のイベント名はパースエラーになる
        // given (前提条件):
        let frame = r#"{"event":"selfDestruct"}"#;

        // when (操作):
        let parsed = serde_json::from_str::<ClientMessage>(frame);

        // then (期待する結果):
        assert!(parsed.is_err());
    }

    #[test]
    fn test_serialize_found_uses_wire_field_names() {
        // テスト項目: found イベントが userName / room / key で出力される
        // given (前提条件):
        let message = ServerMessage::Found(FoundPayload {
            user_name: "Mango".to_string(),
            room: "abc123".to_string(),
            key: "k1y2z".to_string(),
        });

        // when (操作):
        let value = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "event": "found",
                "data": {"userName": "Mango", "room": "abc123", "key": "k1y2z"}
            })
        );
    }

    #[test]
    fn test_serialize_search_error_without_data() {
        // テスト項目: searchError は data なしで出力される
        // given (前提条件):
        let message = ServerMessage::SearchError;

        // when (操作):
        let value = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(value, json!({"event": "searchError"}));
    }

    #[test]
    fn test_serialize_update_user_count() {
        // テスト項目: updateUserCount は数値をそのまま data に持つ
        // given (前提条件):
        let message = ServerMessage::UpdateUserCount(3);

        // when (操作):
        let value = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(value, json!({"event": "updateUserCount", "data": 3}));
    }
}
