//! Roster of the open room.

use super::{entity::Subscriber, value_object::UserId};

/// Subscribers of the currently open room, one entry per user.
///
/// Edits are idempotent: adding a user twice or removing an absent user
/// changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<Subscriber>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from a snapshot, keeping the first entry per user.
    pub fn from_subscribers(subscribers: impl IntoIterator<Item = Subscriber>) -> Self {
        let mut roster = Self::new();
        for subscriber in subscribers {
            roster.add(subscriber);
        }
        roster
    }

    /// Returns `false` if the user was already listed.
    pub fn add(&mut self, subscriber: Subscriber) -> bool {
        if self.contains(subscriber.user_id) {
            return false;
        }
        self.entries.push(subscriber);
        true
    }

    /// Returns `false` if the user was not listed.
    pub fn remove(&mut self, user_id: UserId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|s| s.user_id != user_id);
        self.entries.len() != before
    }

    /// Returns `false` if the user is not listed.
    pub fn set_presence(&mut self, user_id: UserId, present: bool) -> bool {
        match self.entries.iter_mut().find(|s| s.user_id == user_id) {
            Some(subscriber) => {
                subscriber.present = present;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.get(user_id).is_some()
    }

    pub fn get(&self, user_id: UserId) -> Option<&Subscriber> {
        self.entries.iter().find(|s| s.user_id == user_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscriber> {
        self.entries.iter()
    }

    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|s| s.present).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(user_id: UserId, username: &str, present: bool) -> Subscriber {
        Subscriber {
            user_id,
            username: username.to_string(),
            present,
        }
    }

    #[test]
    fn test_add_same_user_twice_keeps_one_entry() {
        // テスト項目: 同じユーザーを 2 回追加してもエントリは 1 つ
        // given (前提条件):
        let mut roster = Roster::new();

        // when (操作):
        let first = roster.add(subscriber(1, "alice", false));
        let second = roster.add(subscriber(1, "alice", false));

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_remove_absent_user_is_noop() {
        // テスト項目: 存在しないユーザーの削除は何も変えない
        // given (前提条件):
        let mut roster = Roster::from_subscribers([subscriber(1, "alice", true)]);

        // when (操作):
        let removed = roster.remove(2);

        // then (期待する結果):
        assert!(!removed);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_set_presence_updates_matching_entry() {
        // テスト項目: 該当ユーザーのプレゼンスのみ更新される
        // given (前提条件):
        let mut roster = Roster::from_subscribers([
            subscriber(1, "alice", false),
            subscriber(2, "bob", false),
        ]);

        // when (操作):
        let updated = roster.set_presence(2, true);

        // then (期待する結果):
        assert!(updated);
        assert!(!roster.get(1).unwrap().present);
        assert!(roster.get(2).unwrap().present);
        assert_eq!(roster.present_count(), 1);
    }

    #[test]
    fn test_set_presence_for_unknown_user() {
        // テスト項目: ロスターにいないユーザーのプレゼンス更新は無視される
        // given (前提条件):
        let mut roster = Roster::from_subscribers([subscriber(1, "alice", false)]);

        // when (操作):
        let updated = roster.set_presence(9, true);

        // then (期待する結果):
        assert!(!updated);
        assert_eq!(roster.present_count(), 0);
    }

    #[test]
    fn test_from_subscribers_drops_duplicates() {
        // テスト項目: スナップショット内の重複ユーザーは最初の 1 件だけ残る
        // given (前提条件):
        let snapshot = vec![
            subscriber(1, "alice", true),
            subscriber(1, "alice-dup", false),
            subscriber(3, "carol", false),
        ];

        // when (操作):
        let roster = Roster::from_subscribers(snapshot);

        // then (期待する結果):
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get(1).unwrap().username, "alice");
    }
}
