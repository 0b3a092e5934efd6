//! Message formatting utilities for client display.

use std::fmt::Display;

use parley_shared::time::{to_jst_clock_time, to_jst_rfc3339};

use crate::domain::{
    Message, MessagePosted, PresenceChanged, Room, RoomId, Roster, SubscriptionChanged,
};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the subscribed room list
    ///
    /// # Arguments
    ///
    /// * `rooms` - Rooms in display order
    /// * `open` - The open room, marked with `*`
    ///
    /// # Returns
    ///
    /// A formatted string with one line per room
    pub fn format_room_list(rooms: &[Room], open: Option<&RoomId>) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\nRooms:\n", RULE));

        if rooms.is_empty() {
            output.push_str("(No subscribed rooms)\n");
        } else {
            for room in rooms {
                let marker = if Some(&room.id) == open { "*" } else { " " };
                let online = if room.online { " (online)" } else { "" };
                let unread = match room.unread_count() {
                    0 => String::new(),
                    n => format!(" [{} unread]", n),
                };
                output.push_str(&format!(
                    "{} {} - {}{}{}\n",
                    marker, room.id, room.name, online, unread
                ));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the roster of the open room
    ///
    /// # Arguments
    ///
    /// * `room_id` - The open room
    /// * `roster` - Its subscribers
    ///
    /// # Returns
    ///
    /// A formatted string listing subscribers, present ones first
    pub fn format_roster(room_id: &RoomId, roster: &Roster) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "\nSubscribers of '{}' ({} present):\n",
            room_id,
            roster.present_count()
        ));

        if roster.is_empty() {
            output.push_str("(No subscribers)\n");
            return output;
        }

        let mut entries: Vec<_> = roster.iter().collect();
        entries.sort_by_key(|subscriber| !subscriber.present);
        for subscriber in entries {
            let status = if subscriber.present { "present" } else { "away" };
            output.push_str(&format!("  {} ({})\n", subscriber.username, status));
        }
        output
    }

    /// Format a chat message
    ///
    /// # Arguments
    ///
    /// * `message` - The message to render
    ///
    /// # Returns
    ///
    /// `[room] #seq HH:MM:SS @author: body`
    pub fn format_chat_message(message: &Message) -> String {
        let author = match &message.author_name {
            Some(name) => name.clone(),
            None => format!("user{}", message.author_id),
        };
        format!(
            "[{}] #{} {} @{}: {}\n",
            message.room_id,
            message.seq_id,
            to_jst_clock_time(&message.timestamp),
            author,
            message.body
        )
    }

    /// Format a page of history, oldest first
    pub fn format_history<'a>(
        room_id: &RoomId,
        messages: impl Iterator<Item = &'a Message>,
    ) -> String {
        let mut output = format!("\n--- history of '{}' ---\n", room_id);
        let mut empty = true;
        for message in messages {
            output.push_str(&Self::format_chat_message(message));
            empty = false;
        }
        if empty {
            output.push_str("(No messages)\n");
        }
        output.push_str("---\n");
        output
    }

    /// Format a message-posted notification that carries no message body
    pub fn format_message_posted(event: &MessagePosted) -> String {
        format!("\n* new message in '{}' (#{})\n", event.room_id, event.seq_id)
    }

    /// Format a user-level presence change
    pub fn format_presence(event: &PresenceChanged) -> Option<String> {
        let user_id = event.user_id?;
        let status = if event.present { "is online" } else { "went away" };
        Some(format!("\n~ user{} {} in '{}'\n", user_id, status, event.room_id))
    }

    /// Format a subscription change
    pub fn format_subscription(event: &SubscriptionChanged) -> String {
        if event.subscribed {
            format!("\n+ {} subscribed to '{}'\n", event.user.username, event.room_id)
        } else {
            format!("\n- {} unsubscribed from '{}'\n", event.user.username, event.room_id)
        }
    }

    pub fn format_room_deleted(room_id: &RoomId) -> String {
        format!("\n! room '{}' was deleted\n", room_id)
    }

    /// Format the confirmation of an opened room
    pub fn format_joined(room: Option<&Room>, room_id: &RoomId, roster: &Roster) -> String {
        let title = match room {
            Some(room) if !room.description.is_empty() => {
                format!("{} - {}", room.name, room.description)
            }
            Some(room) => room.name.clone(),
            None => room_id.to_string(),
        };
        format!(
            "\nJoined '{}': {} ({} subscribers)\n",
            room_id,
            title,
            roster.len()
        )
    }

    pub fn format_left(room_id: &RoomId, unsubscribed: bool) -> String {
        if unsubscribed {
            format!("\nLeft and unsubscribed from '{}'\n", room_id)
        } else {
            format!("\nLeft '{}'\n", room_id)
        }
    }

    pub fn format_read_confirmation(room_id: &RoomId, seq_id: u64) -> String {
        format!("\nMarked '{}' as read up to #{}\n", room_id, seq_id)
    }

    /// Format a confirmation after publishing
    pub fn format_sent_confirmation(sent_at: &chrono::DateTime<chrono::Utc>) -> String {
        format!("sent at {}\n", to_jst_rfc3339(sent_at))
    }

    pub fn format_error(error: &dyn Display) -> String {
        format!("\n✗ {}\n", error)
    }

    pub fn format_connection_closed() -> String {
        "\n✗ Connection closed\n".to_string()
    }
}
