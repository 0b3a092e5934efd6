//! State reconciler: room list, open room, roster and read positions.
//!
//! ## Open room lifecycle
//!
//! ```text
//! closed --begin_join--> joining --commit_join--> joined
//!   ^                       |                       |
//!   +----rollback_join------+                  begin_leave
//!   |                                               v
//!   +-----------------commit_leave-------------- leaving
//!                                                   |
//!                         joined <--rollback_leave--+
//! ```
//!
//! Every transition is two-phase: `begin_*` records the optimistic state
//! before the command is sent, the command outcome either commits or rolls
//! back. A `room-deleted` notification may clear the open room while a
//! command is in flight; settling that command afterwards reports
//! [`StateError::Stale`] and changes nothing.

use crate::error::StateError;

use super::{
    entity::{Message, Room, RoomDetails},
    message_log::MessageLog,
    notification::{MessagePosted, NotificationHandler, PresenceChanged, SubscriptionChanged},
    roster::Roster,
    value_object::RoomId,
};

/// Lifecycle phase of a room with respect to this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Closed,
    Joining,
    Joined,
    Leaving,
}

/// The single room the client has open (or is opening/closing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRoom {
    room_id: RoomId,
    phase: RoomPhase,
    unsubscribe_on_leave: bool,
    roster: Roster,
    messages: MessageLog,
}

impl ActiveRoom {
    fn joining(room_id: RoomId) -> Self {
        Self {
            room_id,
            phase: RoomPhase::Joining,
            unsubscribe_on_leave: false,
            roster: Roster::new(),
            messages: MessageLog::new(),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// Roster and message log are live once the join is confirmed, and stay
    /// live until the leave is confirmed.
    fn is_live(&self) -> bool {
        matches!(self.phase, RoomPhase::Joined | RoomPhase::Leaving)
    }
}

/// Everything the UI renders, kept consistent with server pushes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    rooms: Vec<Room>,
    active: Option<ActiveRoom>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the room list with a fresh subscription snapshot.
    ///
    /// Duplicate ids in the snapshot are collapsed into the first entry.
    pub fn seed_rooms(&mut self, rooms: Vec<Room>) {
        self.rooms.clear();
        for room in rooms {
            self.upsert_room(room);
        }
        tracing::debug!("Room list seeded with {} rooms", self.rooms.len());
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| &room.id == room_id)
    }

    fn room_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|room| &room.id == room_id)
    }

    fn upsert_room(&mut self, room: Room) {
        match self.room_mut(&room.id) {
            Some(existing) => existing.merge_from(&room),
            None => self.rooms.push(room),
        }
    }

    fn remove_room(&mut self, room_id: &RoomId) -> bool {
        let before = self.rooms.len();
        self.rooms.retain(|room| &room.id != room_id);
        self.rooms.len() != before
    }

    pub fn total_unread(&self) -> u64 {
        self.rooms.iter().map(Room::unread_count).sum()
    }

    pub fn active_room(&self) -> Option<&ActiveRoom> {
        self.active.as_ref()
    }

    pub fn phase_of(&self, room_id: &RoomId) -> RoomPhase {
        match &self.active {
            Some(active) if &active.room_id == room_id => active.phase,
            _ => RoomPhase::Closed,
        }
    }

    /// The joined room, if any.
    pub fn open_room_id(&self) -> Option<&RoomId> {
        self.active
            .as_ref()
            .filter(|active| active.phase == RoomPhase::Joined)
            .map(|active| &active.room_id)
    }

    fn live_room_mut(&mut self, room_id: &RoomId) -> Option<&mut ActiveRoom> {
        self.active
            .as_mut()
            .filter(|active| &active.room_id == room_id && active.is_live())
    }

    fn active_in_phase(
        &mut self,
        room_id: &RoomId,
        phase: RoomPhase,
    ) -> Result<&mut ActiveRoom, StateError> {
        match self.active.as_mut() {
            Some(active) if &active.room_id == room_id && active.phase == phase => Ok(active),
            _ => Err(StateError::Stale(room_id.clone())),
        }
    }

    // ========================================
    // Join / leave transitions
    // ========================================

    /// `closed -> joining`
    pub fn begin_join(&mut self, room_id: &RoomId) -> Result<(), StateError> {
        if let Some(active) = &self.active {
            return Err(match active.phase {
                RoomPhase::Joining | RoomPhase::Leaving => {
                    StateError::TransitionInProgress(active.room_id.clone())
                }
                _ => StateError::RoomAlreadyOpen(active.room_id.clone()),
            });
        }
        self.active = Some(ActiveRoom::joining(room_id.clone()));
        tracing::debug!("Room '{}': closed -> joining", room_id);
        Ok(())
    }

    /// `joining -> joined`, populating roster and metadata from the join
    /// response. `details` is `None` when the server sent no usable payload.
    pub fn commit_join(
        &mut self,
        room_id: &RoomId,
        details: Option<RoomDetails>,
    ) -> Result<(), StateError> {
        let active = self.active_in_phase(room_id, RoomPhase::Joining)?;
        active.phase = RoomPhase::Joined;

        match details {
            Some(details) => {
                active.roster = Roster::from_subscribers(details.subscribers);
                self.upsert_room(details.room);
            }
            None => {
                if self.room(room_id).is_none() {
                    self.rooms.push(Room::new(room_id.clone(), room_id.as_str()));
                }
            }
        }
        tracing::debug!("Room '{}': joining -> joined", room_id);
        Ok(())
    }

    /// `joining -> closed` after a failed join
    pub fn rollback_join(&mut self, room_id: &RoomId) -> Result<(), StateError> {
        self.active_in_phase(room_id, RoomPhase::Joining)?;
        self.active = None;
        tracing::debug!("Room '{}': joining -> closed (rolled back)", room_id);
        Ok(())
    }

    /// `joined -> leaving` for the open room. Returns the room being left.
    pub fn begin_leave(&mut self, unsubscribe: bool) -> Result<RoomId, StateError> {
        let active = self.active.as_mut().ok_or(StateError::NoOpenRoom)?;
        if active.phase != RoomPhase::Joined {
            return Err(StateError::TransitionInProgress(active.room_id.clone()));
        }
        active.phase = RoomPhase::Leaving;
        active.unsubscribe_on_leave = unsubscribe;
        tracing::debug!("Room '{}': joined -> leaving", active.room_id);
        Ok(active.room_id.clone())
    }

    /// `leaving -> closed`, discarding roster and messages. An unsubscribing
    /// leave also drops the room from the list.
    pub fn commit_leave(&mut self, room_id: &RoomId) -> Result<(), StateError> {
        let unsubscribe = self
            .active_in_phase(room_id, RoomPhase::Leaving)?
            .unsubscribe_on_leave;
        self.active = None;
        if unsubscribe {
            self.remove_room(room_id);
        }
        tracing::debug!("Room '{}': leaving -> closed", room_id);
        Ok(())
    }

    /// `leaving -> joined` after a failed leave
    pub fn rollback_leave(&mut self, room_id: &RoomId) -> Result<(), StateError> {
        let active = self.active_in_phase(room_id, RoomPhase::Leaving)?;
        active.phase = RoomPhase::Joined;
        active.unsubscribe_on_leave = false;
        tracing::debug!("Room '{}': leaving -> joined (rolled back)", room_id);
        Ok(())
    }

    // ========================================
    // Messages and read positions
    // ========================================

    /// Record a confirmed read position. Returns `false` for unknown rooms.
    pub fn mark_read(&mut self, room_id: &RoomId, seq_id: u64) -> bool {
        match self.room_mut(room_id) {
            Some(room) => {
                room.advance_last_read(seq_id);
                true
            }
            None => false,
        }
    }

    /// Merge a page of history into the open room's log.
    ///
    /// Returns how many messages were new; pages for a room that is not
    /// open are dropped.
    pub fn merge_history(&mut self, room_id: &RoomId, messages: Vec<Message>) -> usize {
        let latest = messages.iter().map(|m| m.seq_id).max();
        let added = match self.live_room_mut(room_id) {
            Some(active) => active.messages.extend(messages),
            None => {
                tracing::debug!("Dropping history page for room '{}' (not open)", room_id);
                return 0;
            }
        };
        if let (Some(seq_id), Some(room)) = (latest, self.room_mut(room_id)) {
            room.advance_seq(seq_id);
        }
        added
    }

    /// Apply a live message, either pushed directly or carried by a
    /// `message-posted` notification.
    ///
    /// The room's `seq_id` always moves forward; the message is only logged
    /// when its room is open.
    pub fn apply_message(&mut self, message: &Message) {
        self.advance_room_seq(&message.room_id, message.seq_id);
        if let Some(active) = self.live_room_mut(&message.room_id) {
            active.messages.insert(message.clone());
        }
    }

    fn advance_room_seq(&mut self, room_id: &RoomId, seq_id: u64) {
        match self.room_mut(room_id) {
            Some(room) => {
                if !room.advance_seq(seq_id) {
                    tracing::debug!(
                        "Room '{}': ignoring seq_id {} (current {})",
                        room_id,
                        seq_id,
                        room.seq_id
                    );
                }
            }
            None => tracing::debug!("Message for unknown room '{}'", room_id),
        }
    }
}

impl NotificationHandler for ChatState {
    fn on_presence_changed(&mut self, event: &PresenceChanged) {
        match event.user_id {
            None => {
                if let Some(room) = self.room_mut(&event.room_id) {
                    room.online = event.present;
                }
            }
            Some(user_id) => {
                if let Some(active) = self.live_room_mut(&event.room_id) {
                    active.roster.set_presence(user_id, event.present);
                }
            }
        }
    }

    fn on_subscription_changed(&mut self, event: &SubscriptionChanged) {
        let Some(active) = self.live_room_mut(&event.room_id) else {
            return;
        };
        if event.subscribed {
            active.roster.add(event.user.clone());
        } else {
            active.roster.remove(event.user.user_id);
        }
    }

    fn on_room_deleted(&mut self, room_id: &RoomId) {
        self.remove_room(room_id);
        if self
            .active
            .as_ref()
            .is_some_and(|active| &active.room_id == room_id)
        {
            self.active = None;
            tracing::info!("Open room '{}' was deleted", room_id);
        }
    }

    fn on_message_posted(&mut self, event: &MessagePosted) {
        match &event.message {
            Some(message) => self.apply_message(message),
            None => self.advance_room_seq(&event.room_id, event.seq_id),
        }
    }
}
