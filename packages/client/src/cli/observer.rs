//! Prints inbound events above the prompt.

use crate::{
    domain::{Message, MessagePosted, NotificationHandler, PresenceChanged, RoomId, SubscriptionChanged},
    session::SessionObserver,
};

use super::{formatter::MessageFormatter, ui::print_and_prompt};

/// [`SessionObserver`] for the interactive client.
#[derive(Debug, Default)]
pub struct PrintObserver;

impl NotificationHandler for PrintObserver {
    fn on_presence_changed(&mut self, event: &PresenceChanged) {
        if let Some(text) = MessageFormatter::format_presence(event) {
            print_and_prompt(&text);
        }
    }

    fn on_subscription_changed(&mut self, event: &SubscriptionChanged) {
        print_and_prompt(&MessageFormatter::format_subscription(event));
    }

    fn on_room_deleted(&mut self, room_id: &RoomId) {
        print_and_prompt(&MessageFormatter::format_room_deleted(room_id));
    }

    fn on_message_posted(&mut self, event: &MessagePosted) {
        let text = match &event.message {
            Some(message) => format!("\n{}", MessageFormatter::format_chat_message(message)),
            None => MessageFormatter::format_message_posted(event),
        };
        print_and_prompt(&text);
    }
}

impl SessionObserver for PrintObserver {
    fn on_message(&mut self, message: &Message) {
        print_and_prompt(&format!("\n{}", MessageFormatter::format_chat_message(message)));
    }

    fn on_channel_error(&mut self, error: &str) {
        print_and_prompt(&MessageFormatter::format_error(&error));
    }

    fn on_closed(&mut self) {
        print!("{}", MessageFormatter::format_connection_closed());
    }
}
