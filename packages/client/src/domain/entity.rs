//! Client-side entities: rooms, roster entries and messages.

use chrono::{DateTime, Utc};

use super::value_object::{RoomId, UserId};

/// A room the caller is subscribed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    /// Latest known sequence number of the room's message stream
    pub seq_id: u64,
    /// Sequence number the caller has read up to
    pub last_read_seq_id: u64,
    /// Room-level presence (someone is active in the room)
    pub online: bool,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            seq_id: 0,
            last_read_seq_id: 0,
            online: false,
        }
    }

    /// Unread messages, derived from the two sequence numbers every time.
    pub fn unread_count(&self) -> u64 {
        self.seq_id.saturating_sub(self.last_read_seq_id)
    }

    /// Move `seq_id` forward. Smaller or equal values are ignored.
    ///
    /// Returns `true` if the value changed.
    pub fn advance_seq(&mut self, seq_id: u64) -> bool {
        if seq_id > self.seq_id {
            self.seq_id = seq_id;
            true
        } else {
            false
        }
    }

    /// Move `last_read_seq_id` forward. Smaller or equal values are ignored.
    pub fn advance_last_read(&mut self, seq_id: u64) -> bool {
        if seq_id > self.last_read_seq_id {
            self.last_read_seq_id = seq_id;
            true
        } else {
            false
        }
    }

    /// Take metadata from a fresher copy of the same room.
    ///
    /// Sequence numbers only move forward.
    pub fn merge_from(&mut self, fresher: &Room) {
        self.name = fresher.name.clone();
        self.description = fresher.description.clone();
        self.advance_seq(fresher.seq_id);
        self.advance_last_read(fresher.last_read_seq_id);
    }
}

/// Roster entry of the open room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub user_id: UserId,
    pub username: String,
    pub present: bool,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    /// Per-room monotonic position
    pub seq_id: u64,
    pub room_id: RoomId,
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

/// Room metadata and roster returned by a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetails {
    pub room: Room,
    pub subscribers: Vec<Subscriber>,
}
