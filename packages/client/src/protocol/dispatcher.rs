//! Notification dispatcher.
//!
//! A notification payload names its kind by the one field that is populated.
//! [`classify`] turns the payload into a [`Notification`]; [`dispatch`] routes
//! it to the matching handler slot. Unrecognized shapes are logged and
//! dropped so a forward-incompatible push never tears down the channel.

use crate::{
    domain::{Notification, NotificationHandler, RoomId},
    dto::websocket::NotificationBody,
};

/// Classify a notification payload.
///
/// Returns `None` unless exactly one known field is populated.
pub fn classify(body: NotificationBody) -> Option<Notification> {
    let NotificationBody {
        presence,
        subscription_change,
        room_deleted,
        message,
    } = body;

    let populated = [
        presence.is_some(),
        subscription_change.is_some(),
        room_deleted.is_some(),
        message.is_some(),
    ]
    .into_iter()
    .filter(|present| *present)
    .count();
    if populated != 1 {
        tracing::warn!(
            "Dropping unrecognized notification ({} known fields populated)",
            populated
        );
        return None;
    }

    if let Some(presence) = presence {
        Some(Notification::PresenceChanged(presence.into()))
    } else if let Some(change) = subscription_change {
        Some(Notification::SubscriptionChanged(change.into()))
    } else if let Some(deleted) = room_deleted {
        Some(Notification::RoomDeleted(RoomId::new(deleted.room_id)))
    } else {
        message.map(|posted| Notification::MessagePosted(posted.into()))
    }
}

/// Invoke the handler slot for `notification`. Exactly one slot fires.
pub fn dispatch<H: NotificationHandler + ?Sized>(notification: &Notification, handler: &mut H) {
    match notification {
        Notification::PresenceChanged(event) => handler.on_presence_changed(event),
        Notification::SubscriptionChanged(event) => handler.on_subscription_changed(event),
        Notification::RoomDeleted(room_id) => handler.on_room_deleted(room_id),
        Notification::MessagePosted(event) => handler.on_message_posted(event),
    }
}
