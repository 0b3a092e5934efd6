//! Server notifications and the handler slots they are dispatched to.

use super::{
    entity::{Message, Subscriber},
    value_object::{RoomId, UserId},
};

/// A user (or the room as a whole) became present or absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceChanged {
    pub room_id: RoomId,
    /// `None` for room-level presence
    pub user_id: Option<UserId>,
    pub present: bool,
}

/// A user subscribed to or unsubscribed from a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChanged {
    pub room_id: RoomId,
    pub subscribed: bool,
    pub user: Subscriber,
}

/// A message was posted to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePosted {
    pub room_id: RoomId,
    pub seq_id: u64,
    /// Present when the server included the message body
    pub message: Option<Message>,
}

/// Closed set of notification kinds. Transient: consumed by handlers, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    PresenceChanged(PresenceChanged),
    SubscriptionChanged(SubscriptionChanged),
    RoomDeleted(RoomId),
    MessagePosted(MessagePosted),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    PresenceChanged,
    SubscriptionChanged,
    RoomDeleted,
    MessagePosted,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::PresenceChanged(_) => NotificationKind::PresenceChanged,
            Notification::SubscriptionChanged(_) => NotificationKind::SubscriptionChanged,
            Notification::RoomDeleted(_) => NotificationKind::RoomDeleted,
            Notification::MessagePosted(_) => NotificationKind::MessagePosted,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        match self {
            Notification::PresenceChanged(event) => &event.room_id,
            Notification::SubscriptionChanged(event) => &event.room_id,
            Notification::RoomDeleted(room_id) => room_id,
            Notification::MessagePosted(event) => &event.room_id,
        }
    }
}

/// Handler slots, one per notification kind.
///
/// Every slot defaults to a no-op, so implementors only override what they
/// care about.
pub trait NotificationHandler {
    fn on_presence_changed(&mut self, _event: &PresenceChanged) {}

    fn on_subscription_changed(&mut self, _event: &SubscriptionChanged) {}

    fn on_room_deleted(&mut self, _room_id: &RoomId) {}

    fn on_message_posted(&mut self, _event: &MessagePosted) {}
}
