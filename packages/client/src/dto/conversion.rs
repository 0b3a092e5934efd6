//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    Message, MessagePosted, PresenceChanged, Room, RoomDetails, RoomId, Subscriber,
    SubscriptionChanged,
};
use crate::dto::{http as http_dto, websocket as ws_dto};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<ws_dto::UserDto> for Subscriber {
    fn from(dto: ws_dto::UserDto) -> Self {
        Self {
            user_id: dto.id,
            username: dto.username,
            present: dto.is_present,
        }
    }
}

impl From<ws_dto::MessageDto> for Message {
    fn from(dto: ws_dto::MessageDto) -> Self {
        Self {
            id: dto.id,
            seq_id: dto.seq_id,
            room_id: RoomId::new(dto.room_id),
            author_id: dto.user_id,
            author_name: dto.username,
            body: dto.content,
            timestamp: dto.timestamp,
        }
    }
}

impl From<ws_dto::RoomInfoDto> for RoomDetails {
    fn from(dto: ws_dto::RoomInfoDto) -> Self {
        Self {
            room: Room {
                id: RoomId::new(dto.external_id),
                name: dto.name,
                description: dto.description,
                seq_id: dto.seq_id,
                last_read_seq_id: dto.last_read_seq_id,
                online: false,
            },
            subscribers: dto.subscribers.into_iter().map(Subscriber::from).collect(),
        }
    }
}

impl From<http_dto::RoomSummaryDto> for Room {
    fn from(dto: http_dto::RoomSummaryDto) -> Self {
        Self {
            id: RoomId::new(dto.external_id),
            name: dto.name,
            description: dto.description,
            seq_id: dto.seq_id,
            last_read_seq_id: dto.last_read_seq_id,
            online: dto.is_online,
        }
    }
}

impl From<ws_dto::PresenceDto> for PresenceChanged {
    fn from(dto: ws_dto::PresenceDto) -> Self {
        Self {
            room_id: RoomId::new(dto.room_id),
            // the server encodes "no user" as an omitted or zero id
            user_id: dto.user_id.filter(|id| *id != 0),
            present: dto.present,
        }
    }
}

impl From<ws_dto::SubscriptionChangeDto> for SubscriptionChanged {
    fn from(dto: ws_dto::SubscriptionChangeDto) -> Self {
        Self {
            room_id: RoomId::new(dto.room_id),
            subscribed: dto.subscribed,
            user: dto.user.into(),
        }
    }
}

impl From<ws_dto::MessagePostedDto> for MessagePosted {
    fn from(dto: ws_dto::MessagePostedDto) -> Self {
        let room_id = RoomId::new(dto.room_id);
        // The body is only usable if the server sent the content and its stamp.
        let message = match (dto.content, dto.timestamp) {
            (Some(body), Some(timestamp)) => Some(Message {
                id: dto.id.unwrap_or_default(),
                seq_id: dto.seq_id,
                room_id: room_id.clone(),
                author_id: dto.user_id.unwrap_or_default(),
                author_name: dto.username,
                body,
                timestamp,
            }),
            _ => None,
        };
        Self {
            room_id,
            seq_id: dto.seq_id,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_room_info_to_room_details() {
        // テスト項目: join レスポンスの data がルーム詳細とロスターに変換される
        // given (前提条件):
        let dto: ws_dto::RoomInfoDto = serde_json::from_value(serde_json::json!({
            "id": 3,
            "external_id": "r1",
            "name": "general",
            "description": "everything",
            "seq_id": 12,
            "subscribers": [
                {"id": 1, "username": "alice", "is_present": true},
                {"id": 2, "username": "bob"}
            ]
        }))
        .unwrap();

        // when (操作):
        let details: RoomDetails = dto.into();

        // then (期待する結果):
        assert_eq!(details.room.id, RoomId::new("r1"));
        assert_eq!(details.room.name, "general");
        assert_eq!(details.room.seq_id, 12);
        assert_eq!(details.subscribers.len(), 2);
        assert!(details.subscribers[0].present);
        assert!(!details.subscribers[1].present);
    }

    #[test]
    fn test_zero_user_id_means_room_level_presence() {
        // テスト項目: user_id が 0 のプレゼンスはルーム単位として扱われる
        // given (前提条件):
        let dto = ws_dto::PresenceDto {
            present: true,
            user_id: Some(0),
            room_id: "r1".to_string(),
        };

        // when (操作):
        let event: PresenceChanged = dto.into();

        // then (期待する結果):
        assert_eq!(event.user_id, None);
        assert!(event.present);
    }

    #[test]
    fn test_message_posted_without_body() {
        // テスト項目: 本文のない message 通知は位置情報のみを持つ
        // given (前提条件):
        let dto: ws_dto::MessagePostedDto =
            serde_json::from_value(serde_json::json!({"room_id": "r1", "seq_id": 5})).unwrap();

        // when (操作):
        let event: MessagePosted = dto.into();

        // then (期待する結果):
        assert_eq!(event.seq_id, 5);
        assert!(event.message.is_none());
    }

    #[test]
    fn test_message_posted_with_body() {
        // テスト項目: 本文付きの message 通知からメッセージが組み立てられる
        // given (前提条件):
        let dto: ws_dto::MessagePostedDto = serde_json::from_value(serde_json::json!({
            "room_id": "r1",
            "seq_id": 5,
            "id": 50,
            "user_id": 2,
            "content": "hi",
            "timestamp": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        // when (操作):
        let event: MessagePosted = dto.into();

        // then (期待する結果):
        let message = event.message.unwrap();
        assert_eq!(message.id, 50);
        assert_eq!(message.seq_id, 5);
        assert_eq!(message.author_id, 2);
        assert_eq!(message.body, "hi");
        assert_eq!(
            message.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_room_summary_to_room() {
        // テスト項目: 購読一覧のエントリがルームに変換される
        // given (前提条件):
        let dto = http_dto::RoomSummaryDto {
            external_id: "r9".to_string(),
            name: "random".to_string(),
            description: String::new(),
            seq_id: 30,
            last_read_seq_id: 25,
            is_online: true,
        };

        // when (操作):
        let room: Room = dto.into();

        // then (期待する結果):
        assert_eq!(room.id, RoomId::new("r9"));
        assert_eq!(room.unread_count(), 5);
        assert!(room.online);
    }
}
