//! Message log of the open room, ordered by sequence number.

use std::collections::BTreeMap;

use super::entity::Message;

/// Messages keyed by `seq_id`.
///
/// Iteration is always in strictly increasing sequence order, no matter
/// whether a message arrived through history paging or a live push. A second
/// message with an already known `seq_id` is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    messages: BTreeMap<u64, Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if a message with the same `seq_id` is already logged.
    pub fn insert(&mut self, message: Message) -> bool {
        if self.messages.contains_key(&message.seq_id) {
            return false;
        }
        self.messages.insert(message.seq_id, message);
        true
    }

    /// Insert a batch, returning how many were new.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) -> usize {
        messages
            .into_iter()
            .map(|message| self.insert(message))
            .filter(|inserted| *inserted)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// Oldest known sequence number, the cursor for fetching older pages.
    pub fn oldest_seq(&self) -> Option<u64> {
        self.messages.keys().next().copied()
    }

    pub fn latest_seq(&self) -> Option<u64> {
        self.messages.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
