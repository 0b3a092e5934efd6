//! WebSocket message DTOs.
//!
//! Client → server:
//!
//! ```text
//! {"id":3,"join":{"room_id":"r1"}}
//! {"publish":{"room_id":"r1","content":"hi"}}
//! ```
//!
//! Server → client (one per line of a delivery):
//!
//! ```text
//! {"id":3,"response":{"response_code":200,"data":{...}}}
//! {"notification":{"presence":{"room_id":"r1","user_id":2,"present":true}}}
//! {"message":{"id":41,"seq_id":7,"room_id":"r1","user_id":2,"content":"hi","timestamp":"..."}}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ========================================
// Client → server
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leave {
    #[serde(default, skip_serializing_if = "is_false")]
    pub unsubscribe: bool,
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publish {
    pub room_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkRead {
    pub room_id: String,
    pub seq_id: u64,
}

/// Command body; the variant name becomes the command field of the frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Join(Join),
    Leave(Leave),
    Publish(Publish),
    MarkRead(MarkRead),
}

impl Command {
    pub fn join(room_id: &str) -> Self {
        Command::Join(Join {
            room_id: room_id.to_string(),
        })
    }

    pub fn leave(room_id: &str, unsubscribe: bool) -> Self {
        Command::Leave(Leave {
            unsubscribe,
            room_id: room_id.to_string(),
        })
    }

    pub fn publish(room_id: &str, content: impl Into<String>) -> Self {
        Command::Publish(Publish {
            room_id: room_id.to_string(),
            content: content.into(),
        })
    }

    pub fn mark_read(room_id: &str, seq_id: u64) -> Self {
        Command::MarkRead(MarkRead {
            room_id: room_id.to_string(),
            seq_id,
        })
    }

    /// Wire name of the command field
    pub fn name(&self) -> &'static str {
        match self {
            Command::Join(_) => "join",
            Command::Leave(_) => "leave",
            Command::Publish(_) => "publish",
            Command::MarkRead(_) => "mark_read",
        }
    }
}

/// Outbound frame: `{id?, <command>: {...}}`.
#[derive(Debug, Serialize)]
pub struct ClientFrame<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub command: &'a Command,
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ========================================
// Server → client
// ========================================

/// Any inbound frame. Exactly one of `response`, `notification` and
/// `message` is expected to be present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerFrame {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub response: Option<ResponseBody>,
    #[serde(default)]
    pub notification: Option<NotificationBody>,
    #[serde(default)]
    pub message: Option<MessageDto>,
}

/// Outcome of a correlated command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub response_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Notification payload; the populated field names the kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct NotificationBody {
    #[serde(default)]
    pub presence: Option<PresenceDto>,
    #[serde(default)]
    pub subscription_change: Option<SubscriptionChangeDto>,
    #[serde(default)]
    pub room_deleted: Option<RoomDeletedDto>,
    #[serde(default)]
    pub message: Option<MessagePostedDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresenceDto {
    pub present: bool,
    /// Absent (or zero) for room-level presence
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionChangeDto {
    pub room_id: String,
    pub subscribed: bool,
    pub user: UserDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomDeletedDto {
    pub room_id: String,
}

/// `message` notification: always carries the room position, optionally the
/// message itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessagePostedDto {
    pub room_id: String,
    pub seq_id: u64,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub is_present: bool,
}

/// A chat message as pushed by the server and returned by the history API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: u64,
    pub seq_id: u64,
    pub room_id: String,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// `data` of a successful join response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfoDto {
    pub external_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub seq_id: u64,
    #[serde(default)]
    pub last_read_seq_id: u64,
    #[serde(default)]
    pub subscribers: Vec<UserDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlated_command_frame_shape() {
        // テスト項目: 相関 ID 付きコマンドが {id, join: {...}} 形式で直列化される
        // given (前提条件):
        let command = Command::join("r1");

        // when (操作):
        let json = serde_json::to_value(ClientFrame {
            id: Some(1),
            command: &command,
        })
        .unwrap();

        // then (期待する結果):
        assert_eq!(json, serde_json::json!({"id": 1, "join": {"room_id": "r1"}}));
    }

    #[test]
    fn test_one_way_publish_frame_has_no_id() {
        // テスト項目: 一方向の publish は id を持たない
        // given (前提条件):
        let command = Command::publish("r1", "hello");

        // when (操作):
        let json = serde_json::to_value(ClientFrame {
            id: None,
            command: &command,
        })
        .unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({"publish": {"room_id": "r1", "content": "hello"}})
        );
    }

    #[test]
    fn test_leave_omits_false_unsubscribe_flag() {
        // テスト項目: unsubscribe=false の leave はフラグを省略し、true の場合は含める
        // given (前提条件):
        let plain = Command::leave("r1", false);
        let unsubscribing = Command::leave("r1", true);

        // when (操作):
        let plain_json = serde_json::to_value(&plain).unwrap();
        let unsubscribing_json = serde_json::to_value(&unsubscribing).unwrap();

        // then (期待する結果):
        assert_eq!(plain_json, serde_json::json!({"leave": {"room_id": "r1"}}));
        assert_eq!(
            unsubscribing_json,
            serde_json::json!({"leave": {"unsubscribe": true, "room_id": "r1"}})
        );
    }

    #[test]
    fn test_mark_read_wire_name() {
        // テスト項目: 既読コマンドのフィールド名が mark_read になる
        // given (前提条件):
        let command = Command::mark_read("r1", 12);

        // when (操作):
        let json = serde_json::to_value(&command).unwrap();

        // then (期待する結果):
        assert_eq!(command.name(), "mark_read");
        assert_eq!(
            json,
            serde_json::json!({"mark_read": {"room_id": "r1", "seq_id": 12}})
        );
    }

    #[test]
    fn test_server_frame_ignores_unknown_fields() {
        // テスト項目: 未知のトップレベルフィールド (timestamp など) は無視される
        // given (前提条件):
        let text = r#"{"id":4,"timestamp":"2024-01-01T00:00:00Z","response":{"response_code":202}}"#;

        // when (操作):
        let frame: ServerFrame = serde_json::from_str(text).unwrap();

        // then (期待する結果):
        assert_eq!(frame.id, Some(4));
        assert_eq!(frame.response.unwrap().response_code, 202);
        assert!(frame.notification.is_none());
        assert!(frame.message.is_none());
    }
}
