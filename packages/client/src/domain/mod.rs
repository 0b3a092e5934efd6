//! Domain layer: client-side chat model and the state reconciler.
//!
//! Nothing in here performs I/O. The session feeds it decoded notifications
//! and command outcomes, the UI reads it.

pub mod chat_api;
pub mod entity;
pub mod message_log;
pub mod notification;
pub mod roster;
pub mod state;
pub mod value_object;

pub use chat_api::ChatApi;
#[cfg(test)]
pub use chat_api::MockChatApi;
pub use entity::{Message, Room, RoomDetails, Subscriber};
pub use message_log::MessageLog;
pub use notification::{
    MessagePosted, Notification, NotificationHandler, NotificationKind, PresenceChanged,
    SubscriptionChanged,
};
pub use roster::Roster;
pub use state::{ActiveRoom, ChatState, RoomPhase};
pub use value_object::{RoomId, UserId};
