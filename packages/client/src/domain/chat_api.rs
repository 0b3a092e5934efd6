//! ChatApi trait 定義
//!
//! The session needs two things from the request/response API: the caller's
//! room subscriptions (to seed the room list) and pages of message history
//! (to backfill the open room). The concrete HTTP implementation lives in the
//! infrastructure layer.

use async_trait::async_trait;

use crate::error::ApiError;

use super::{
    entity::{Message, Room},
    value_object::RoomId,
};

/// Snapshot and history source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Rooms the caller is subscribed to, with their read positions
    async fn list_subscriptions(&self) -> Result<Vec<Room>, ApiError>;

    /// Up to `limit` messages of `room_id`, newest first, strictly older than
    /// `before` when given
    async fn get_messages(
        &self,
        room_id: &RoomId,
        before: Option<u64>,
        limit: usize,
    ) -> Result<Vec<Message>, ApiError>;
}
